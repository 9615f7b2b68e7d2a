use std::sync::Arc;

use async_trait::async_trait;
use inmo::{MapCanvas, TextEngineLoader};
use inmo_results::{ImageError, ImageFetcher, MapLoader, MarkerId, ResultView, ViewMode};
use inmo_types::{Coordinates, Listing};

struct NoFetch;

#[async_trait]
impl ImageFetcher for NoFetch {
    async fn fetch(&self, _src: &str) -> Result<(), ImageError> {
        Err(ImageError::Fetch("offline".to_string()))
    }
}

fn geo(id: &str, lat: f64, lng: f64) -> Listing {
    let mut l = Listing::new(id, format!("Casa {id}"));
    l.coordinates = Some(Coordinates { lat, lng });
    l
}

fn view(canvas: &MapCanvas, listings: Vec<Listing>) -> ResultView {
    let loader = MapLoader::new(Arc::new(TextEngineLoader::new(canvas.clone(), 60, 16)));
    ResultView::new(listings, loader, Arc::new(NoFetch), 100.0)
}

#[tokio::test]
async fn test_result_view_draws_on_text_map() {
    let canvas = MapCanvas::new();
    let mut view = view(
        &canvas,
        vec![
            geo("A", -25.28, -57.63),
            Listing::new("B", "Sin ubicacion"),
            geo("C", -25.30, -57.58),
        ],
    );

    assert!(view.set_mode(ViewMode::Map));
    view.render_map().await.unwrap();

    let frame = canvas.frame().unwrap();
    assert!(frame.contains("[1]"));
    assert!(frame.contains("[2]"));
    assert!(!frame.contains("[3]"));
    assert_eq!(view.map().badge_label(), "2 inmuebles");

    view.hover_marker(MarkerId(2), true);
    assert!(view.click_marker(MarkerId(2)));
    assert_eq!(view.selected().map(|l| l.id.as_str()), Some("C"));
    assert!(canvas.frame().unwrap().contains(">[2]"));

    view.set_mode(ViewMode::Grid);
    assert!(canvas.frame().is_none());
}

#[tokio::test]
async fn test_replacing_the_view_releases_the_map() {
    let canvas = MapCanvas::new();
    let mut first = view(&canvas, vec![geo("A", -25.28, -57.63)]);
    first.set_mode(ViewMode::Map);
    first.render_map().await.unwrap();
    assert!(canvas.frame().is_some());

    drop(first);
    assert!(canvas.frame().is_none());
}
