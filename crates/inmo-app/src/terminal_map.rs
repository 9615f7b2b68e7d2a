//! Character-grid map engine
//!
//! Stands in for a tiled map library in the terminal. Each surface projects its
//! markers with the same Web-Mercator math a tiled map uses and redraws into a
//! shared [`MapCanvas`] whenever it changes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inmo_results::geo::{self, GeoBounds, ViewportSize, MAX_ZOOM};
use inmo_results::map::NO_IMAGE_LABEL;
use inmo_results::{EngineLoader, MapEngine, MapError, MapSurface, MarkerCard, MarkerId, MarkerImage};
use inmo_types::Coordinates;

/// Pixel size of one character cell
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

/// Last frame drawn by the mounted surface
#[derive(Debug, Clone, Default)]
pub struct MapCanvas {
    frame: Arc<Mutex<Option<String>>>,
}

impl MapCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current frame, `None` when no map is mounted
    pub fn frame(&self) -> Option<String> {
        self.frame.lock().ok().and_then(|f| f.clone())
    }

    fn set(&self, frame: Option<String>) {
        if let Ok(mut current) = self.frame.lock() {
            *current = frame;
        }
    }
}

/// "Loads" the text engine for a `columns` x `rows` grid
pub struct TextEngineLoader {
    canvas: MapCanvas,
    columns: usize,
    rows: usize,
}

impl TextEngineLoader {
    pub fn new(canvas: MapCanvas, columns: usize, rows: usize) -> Self {
        Self {
            canvas,
            columns: columns.max(8),
            rows: rows.max(4),
        }
    }
}

#[async_trait]
impl EngineLoader for TextEngineLoader {
    async fn load(&self) -> Result<Arc<dyn MapEngine>, MapError> {
        log::debug!("Text map engine ready ({}x{})", self.columns, self.rows);
        Ok(Arc::new(TextMapEngine {
            canvas: self.canvas.clone(),
            columns: self.columns,
            rows: self.rows,
        }))
    }
}

pub struct TextMapEngine {
    canvas: MapCanvas,
    columns: usize,
    rows: usize,
}

impl MapEngine for TextMapEngine {
    fn create_map(&self, center: Coordinates, zoom: f64) -> Result<Box<dyn MapSurface>, MapError> {
        if !center.lat.is_finite() || !center.lng.is_finite() {
            return Err(MapError::Mount(format!("invalid center {:?}", center)));
        }
        let surface = TextSurface {
            canvas: self.canvas.clone(),
            columns: self.columns,
            rows: self.rows,
            center,
            zoom,
            markers: Vec::new(),
            elevated: None,
        };
        surface.redraw();
        Ok(Box::new(surface))
    }
}

struct TextSurface {
    canvas: MapCanvas,
    columns: usize,
    rows: usize,
    center: Coordinates,
    zoom: f64,
    markers: Vec<(MarkerId, MarkerCard)>,
    elevated: Option<MarkerId>,
}

impl TextSurface {
    fn viewport(&self) -> ViewportSize {
        ViewportSize {
            width: self.columns as f64 * CELL_WIDTH_PX,
            height: self.rows as f64 * CELL_HEIGHT_PX,
        }
    }

    fn redraw(&self) {
        self.canvas.set(Some(self.render()));
    }

    fn render(&self) -> String {
        let mut grid = vec![vec!['.'; self.columns]; self.rows];
        let viewport = self.viewport();

        // the elevated marker is drawn last so it sits on top
        let mut order: Vec<&(MarkerId, MarkerCard)> = self.markers.iter().collect();
        order.sort_by_key(|(id, _)| Some(*id) == self.elevated);

        for (id, card) in order {
            let px = geo::to_viewport(card.position, self.center, self.zoom, viewport);
            let col = (px.x / CELL_WIDTH_PX).floor();
            let row = (px.y / CELL_HEIGHT_PX).floor();
            if col < 0.0 || row < 0.0 || col >= self.columns as f64 || row >= self.rows as f64 {
                continue;
            }
            grid[row as usize][col as usize] = glyph(*id, Some(*id) == self.elevated);
        }

        let mut out = String::new();
        let border = format!("+{}+", "-".repeat(self.columns));
        out.push_str(&border);
        out.push('\n');
        for row in grid {
            out.push('|');
            out.extend(row);
            out.push_str("|\n");
        }
        out.push_str(&border);

        for (id, card) in &self.markers {
            let marker = if Some(*id) == self.elevated { '>' } else { ' ' };
            let featured = if card.featured { " ★" } else { "" };
            let image = match &card.image {
                MarkerImage::Thumbnail(src) | MarkerImage::Full(src) => src.as_str(),
                MarkerImage::Missing => NO_IMAGE_LABEL,
            };
            out.push_str(&format!(
                "\n{}[{}] {} · {}{} · {} ({})",
                marker,
                id.0,
                card.price_label,
                card.badge.label,
                featured,
                card.listing_id,
                image
            ));
        }
        out
    }
}

/// Grid character of a marker. Markers past `z` share `+` and are told apart
/// by their legend number.
fn glyph(id: MarkerId, elevated: bool) -> char {
    if elevated {
        return '@';
    }
    u32::try_from(id.0)
        .ok()
        .filter(|n| *n < 36)
        .and_then(|n| char::from_digit(n, 36))
        .unwrap_or('+')
}

impl MapSurface for TextSurface {
    fn add_marker(&mut self, card: &MarkerCard) -> MarkerId {
        let id = MarkerId(self.markers.len() + 1);
        self.markers.push((id, card.clone()));
        self.redraw();
        id
    }

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: f64) {
        let (center, zoom) = geo::fit_bounds(&bounds, self.viewport(), padding_px, MAX_ZOOM);
        self.center = center;
        self.zoom = zoom;
        self.redraw();
    }

    fn set_elevated(&mut self, marker: MarkerId, elevated: bool) {
        if elevated {
            self.elevated = Some(marker);
        } else if self.elevated == Some(marker) {
            self.elevated = None;
        }
        self.redraw();
    }

    fn dispose(&mut self) {
        self.markers.clear();
        self.elevated = None;
        self.canvas.set(None);
    }
}
