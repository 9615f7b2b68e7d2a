//! Marker placement on a tiled map
//!
//! The map library itself is an opaque, externally owned resource reached
//! through [`MapEngine`] and [`MapSurface`]. It is loaded at most once per
//! process by [`MapLoader`]; every [`MapRenderer`] holds the single surface it
//! created and disposes it explicitly on rebuild and on drop.

use std::sync::Arc;

use async_trait::async_trait;
use inmo_types::{Coordinates, Listing, Operation};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::format::format_price;
use crate::geo::{mean_center, GeoBounds};

/// Zoom used before bounds are fitted
pub const INITIAL_ZOOM: f64 = 13.0;

/// Padding kept between the outermost markers and the map edge
pub const FIT_PADDING_PX: f64 = 60.0;

/// Marker text when a listing has no photo at all
pub const NO_IMAGE_LABEL: &str = "Sin imagen";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map library failed to load: {0}")]
    Load(String),

    #[error("map could not be mounted: {0}")]
    Mount(String),
}

/// Callback invoked with the listing behind a clicked marker
pub type ListingHandler = Arc<dyn Fn(&Listing) + Send + Sync>;

/// Handle of a marker placed on a [`MapSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerImage {
    Thumbnail(String),
    Full(String),
    Missing,
}

/// Colored sale/rental badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationBadge {
    pub operation: Operation,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<Operation> for OperationBadge {
    fn from(operation: Operation) -> Self {
        let color = match operation {
            Operation::Sale => "#10b981",
            Operation::Rental => "#f59e0b",
        };
        Self {
            operation,
            label: operation.label(),
            color,
        }
    }
}

/// Everything a card-shaped marker shows
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCard {
    pub listing_id: String,
    pub position: Coordinates,
    pub image: MarkerImage,
    pub badge: OperationBadge,
    pub featured: bool,
    pub price_label: String,
}

impl MarkerCard {
    /// Build the marker for a listing; listings without coordinates get none
    pub fn for_listing(listing: &Listing) -> Option<Self> {
        let position = listing.coordinates?;
        let image = listing
            .images
            .first()
            .map(|img| {
                match (
                    img.thumbnail_url.as_deref().filter(|s| !s.is_empty()),
                    Some(img.url.as_str()).filter(|s| !s.is_empty()),
                ) {
                    (Some(thumb), _) => MarkerImage::Thumbnail(thumb.to_string()),
                    (None, Some(url)) => MarkerImage::Full(url.to_string()),
                    (None, None) => MarkerImage::Missing,
                }
            })
            .unwrap_or(MarkerImage::Missing);

        Some(Self {
            listing_id: listing.id.clone(),
            position,
            image,
            badge: listing.operation.into(),
            featured: listing.featured,
            price_label: format_price(listing.price, &listing.currency),
        })
    }
}

/// A mounted map instance owned by exactly one renderer
pub trait MapSurface: Send {
    fn add_marker(&mut self, card: &MarkerCard) -> MarkerId;

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: f64);

    /// Raise (z-order and scale) or restore a marker
    fn set_elevated(&mut self, marker: MarkerId, elevated: bool);

    /// Release listeners and drawing resources. Called exactly once.
    fn dispose(&mut self);
}

/// A loaded map library able to mount surfaces
pub trait MapEngine: Send + Sync {
    fn create_map(&self, center: Coordinates, zoom: f64) -> Result<Box<dyn MapSurface>, MapError>;
}

/// Performs the one-time asynchronous load of the map library
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn MapEngine>, MapError>;
}

/// Shares one library load between every mount, including concurrent ones
pub struct MapLoader {
    engine: OnceCell<Arc<dyn MapEngine>>,
    loader: Arc<dyn EngineLoader>,
}

impl MapLoader {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Arc<Self> {
        Arc::new(Self {
            engine: OnceCell::new(),
            loader,
        })
    }

    /// Wait for the library; the first caller loads it, others await that load.
    /// A failed load is retried by the next caller.
    pub async fn engine(&self) -> Result<Arc<dyn MapEngine>, MapError> {
        self.engine
            .get_or_try_init(|| self.loader.load())
            .await
            .map(Arc::clone)
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }
}

/// Memo key: the sorted, comma-joined listing ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderKey(String);

impl RenderKey {
    pub fn for_listings(listings: &[Listing]) -> Self {
        let mut ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        RenderKey(ids.join(","))
    }
}

/// Initial camera of the current surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    pub center: Coordinates,
    pub zoom: f64,
    pub fitted: bool,
}

pub struct MapRenderer {
    loader: Arc<MapLoader>,
    key: Option<RenderKey>,
    handler: Option<ListingHandler>,
    surface: Option<Box<dyn MapSurface>>,
    markers: Vec<(MarkerId, Listing)>,
    camera: Option<MapCamera>,
    builds: usize,
}

impl MapRenderer {
    pub fn new(loader: Arc<MapLoader>) -> Self {
        Self {
            loader,
            key: None,
            handler: None,
            surface: None,
            markers: Vec::new(),
            camera: None,
            builds: 0,
        }
    }

    /// Render `listings`, rebuilding only when the id set or the click
    /// handler identity changed. Returns whether a rebuild happened.
    pub async fn render(&mut self, listings: &[Listing], on_click: &ListingHandler) -> Result<bool, MapError> {
        let key = RenderKey::for_listings(listings);
        let same_handler = self
            .handler
            .as_ref()
            .map(|h| Arc::ptr_eq(h, on_click))
            .unwrap_or(false);
        if self.key.as_ref() == Some(&key) && same_handler {
            return Ok(false);
        }

        let geocoded: Vec<&Listing> = listings.iter().filter(|l| l.has_coordinates()).collect();
        let positions: Vec<Coordinates> = geocoded.iter().filter_map(|l| l.coordinates).collect();

        let Some(center) = mean_center(&positions) else {
            self.teardown();
            self.key = Some(key);
            self.handler = Some(on_click.clone());
            return Ok(true);
        };

        let engine = self.loader.engine().await?;
        self.teardown();

        let mut surface = engine.create_map(center, INITIAL_ZOOM)?;
        let mut markers = Vec::with_capacity(geocoded.len());
        for listing in geocoded {
            if let Some(card) = MarkerCard::for_listing(listing) {
                let id = surface.add_marker(&card);
                markers.push((id, listing.clone()));
            }
        }

        let fitted = markers.len() > 1;
        if fitted {
            if let Some(bounds) = GeoBounds::from_points(positions.iter()) {
                surface.fit_bounds(bounds, FIT_PADDING_PX);
            }
        }

        log::debug!("Map mounted with {} markers", markers.len());

        self.surface = Some(surface);
        self.markers = markers;
        self.camera = Some(MapCamera {
            center,
            zoom: INITIAL_ZOOM,
            fitted,
        });
        self.key = Some(key);
        self.handler = Some(on_click.clone());
        self.builds += 1;
        Ok(true)
    }

    /// Invoke the click handler for a marker
    pub fn click(&self, marker: MarkerId) -> bool {
        let Some(handler) = &self.handler else {
            return false;
        };
        match self.markers.iter().find(|(id, _)| *id == marker) {
            Some((_, listing)) => {
                handler(listing);
                true
            }
            None => false,
        }
    }

    /// Cosmetic elevation on hover in/out
    pub fn hover(&mut self, marker: MarkerId, entering: bool) {
        if let Some(surface) = self.surface.as_mut() {
            if self.markers.iter().any(|(id, _)| *id == marker) {
                surface.set_elevated(marker, entering);
            }
        }
    }

    /// Dispose the current surface, if any
    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
            log::debug!("Map disposed");
        }
        self.markers.clear();
        self.camera = None;
        self.key = None;
        self.handler = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of markers, which is also the badge count
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn badge_label(&self) -> String {
        format!("{} inmuebles", self.markers.len())
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &Listing)> {
        self.markers.iter().map(|(id, l)| (*id, l))
    }

    pub fn camera(&self) -> Option<MapCamera> {
        self.camera
    }

    /// How many surfaces this renderer has built
    pub fn build_count(&self) -> usize {
        self.builds
    }
}

impl Drop for MapRenderer {
    fn drop(&mut self) {
        self.teardown();
    }
}
