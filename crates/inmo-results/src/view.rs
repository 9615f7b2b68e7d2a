//! Grid/map toggle, selection and detail view for one result set
//!
//! A [`ResultView`] is scoped to the listings of a single assistant message.
//! The session layer builds a fresh one whenever a message is appended, which
//! resets the mode to grid and clears the selection.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use inmo_types::Listing;

use crate::format::{format_area, format_price, pluralize};
use crate::image::{ImageFetcher, ImageLoader, Region};
use crate::map::{ListingHandler, MapError, MapLoader, MapRenderer, MarkerId, OperationBadge};

/// Delay added per card index for the grid entrance animation
pub const STAGGER_STEP: Duration = Duration::from_millis(50);

/// Carousel text when a listing has no photos
pub const NO_IMAGES_LABEL: &str = "Sin imagenes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    Map,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultViewState {
    pub mode: ViewMode,
    pub selected_listing_id: Option<String>,
}

/// Compact grid entry
#[derive(Debug, Clone, PartialEq)]
pub struct GridCard {
    pub listing_id: String,
    pub title: String,
    pub image_src: Option<String>,
    pub price_label: String,
    pub badge: OperationBadge,
    pub featured: bool,
    pub entrance_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Bedrooms,
    Bathrooms,
    Area,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTile {
    pub kind: FeatureKind,
    pub value: String,
    pub label: String,
}

/// Image carousel of the detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    slides: Vec<String>,
    index: usize,
}

impl Carousel {
    pub fn for_listing(listing: &Listing) -> Self {
        Self {
            slides: listing
                .images
                .iter()
                .filter_map(|img| img.full_src().map(str::to_string))
                .collect(),
            index: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.slides.get(self.index).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.slides.is_empty() {
            self.index = (self.index + 1) % self.slides.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.slides.is_empty() {
            self.index = (self.index + self.slides.len() - 1) % self.slides.len();
        }
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.slides.len() {
            self.index = index;
        }
    }

    /// `"k / N"`, or the empty-state label
    pub fn counter(&self) -> String {
        if self.slides.is_empty() {
            NO_IMAGES_LABEL.to_string()
        } else {
            format!("{} / {}", self.index + 1, self.slides.len())
        }
    }
}

/// Modal detail of the selected listing
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub listing_id: String,
    pub title: String,
    pub badge: OperationBadge,
    pub featured: bool,
    pub price_label: String,
    pub location: String,
    pub tiles: Vec<FeatureTile>,
}

impl DetailView {
    pub fn for_listing(listing: &Listing) -> Self {
        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            badge: listing.operation.into(),
            featured: listing.featured,
            price_label: format_price(listing.price, &listing.currency),
            location: listing.location.clone(),
            tiles: feature_tiles(listing),
        }
    }
}

/// Bedroom, bathroom and area tiles; each is omitted when unknown
pub fn feature_tiles(listing: &Listing) -> Vec<FeatureTile> {
    let mut tiles = Vec::with_capacity(3);
    if let Some(n) = listing.bedrooms {
        tiles.push(FeatureTile {
            kind: FeatureKind::Bedrooms,
            value: n.to_string(),
            label: pluralize(n as i64, "Dormitorio", "Dormitorios").to_string(),
        });
    }
    if let Some(n) = listing.bathrooms {
        tiles.push(FeatureTile {
            kind: FeatureKind::Bathrooms,
            value: n.to_string(),
            label: pluralize(n as i64, "Baño", "Baños").to_string(),
        });
    }
    if let Some(area) = listing.area_m2 {
        tiles.push(FeatureTile {
            kind: FeatureKind::Area,
            value: format_area(area),
            label: "Superficie".to_string(),
        });
    }
    tiles
}

/// Lock the view state, keeping the last written value if a holder panicked
fn lock_state(state: &Mutex<ResultViewState>) -> MutexGuard<'_, ResultViewState> {
    state.lock().unwrap_or_else(|poisoned| {
        log::warn!("Result view state lock poisoned; continuing with last state");
        poisoned.into_inner()
    })
}

/// Controller of one rendered result set
pub struct ResultView {
    listings: Vec<Listing>,
    state: Arc<Mutex<ResultViewState>>,
    on_marker_click: ListingHandler,
    map: MapRenderer,
    images: ImageLoader<String>,
    carousel: Option<(String, Carousel)>,
}

impl ResultView {
    pub fn new(
        listings: Vec<Listing>,
        map_loader: Arc<MapLoader>,
        fetcher: Arc<dyn ImageFetcher>,
        image_margin: f64,
    ) -> Self {
        let state = Arc::new(Mutex::new(ResultViewState::default()));

        // Created once so the map renderer sees the same handler every render.
        let selection = state.clone();
        let on_marker_click: ListingHandler = Arc::new(move |listing: &Listing| {
            lock_state(&selection).selected_listing_id = Some(listing.id.clone());
        });

        Self {
            listings,
            state,
            on_marker_click,
            map: MapRenderer::new(map_loader),
            images: ImageLoader::new(fetcher, image_margin),
            carousel: None,
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn state(&self) -> ResultViewState {
        lock_state(&self.state).clone()
    }

    pub fn mode(&self) -> ViewMode {
        self.state().mode
    }

    /// Whether the map toggle is offered at all
    pub fn has_map(&self) -> bool {
        self.listings.iter().any(Listing::has_coordinates)
    }

    /// Switch projection. A map request is ignored when no listing has
    /// coordinates. Leaving the map disposes it.
    pub fn set_mode(&mut self, mode: ViewMode) -> bool {
        if mode == ViewMode::Map && !self.has_map() {
            log::debug!("Map view requested without geocoded listings; staying on grid");
            return false;
        }
        if mode == ViewMode::Grid {
            self.map.teardown();
        }
        lock_state(&self.state).mode = mode;
        true
    }

    /// Open the detail of a listing, or close it with `None`. Unknown ids are
    /// ignored.
    pub fn select(&mut self, listing_id: Option<&str>) -> bool {
        if let Some(id) = listing_id {
            if !self.listings.iter().any(|l| l.id == id) {
                return false;
            }
        }
        lock_state(&self.state).selected_listing_id = listing_id.map(str::to_string);
        self.sync_carousel();
        true
    }

    pub fn selected(&self) -> Option<&Listing> {
        let id = self.state().selected_listing_id?;
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn detail(&self) -> Option<DetailView> {
        self.selected().map(DetailView::for_listing)
    }

    pub fn carousel(&self) -> Option<&Carousel> {
        self.carousel.as_ref().map(|(_, c)| c)
    }

    pub fn carousel_mut(&mut self) -> Option<&mut Carousel> {
        self.carousel.as_mut().map(|(_, c)| c)
    }

    /// Every listing, geocoded or not, with its entrance delay
    pub fn grid_cards(&self) -> Vec<GridCard> {
        self.listings
            .iter()
            .enumerate()
            .map(|(index, listing)| GridCard {
                listing_id: listing.id.clone(),
                title: listing.title.clone(),
                image_src: listing.primary_compact_src().map(str::to_string),
                price_label: format_price(listing.price, &listing.currency),
                badge: listing.operation.into(),
                featured: listing.featured,
                entrance_delay: STAGGER_STEP * index as u32,
            })
            .collect()
    }

    /// Register grid card images laid out in `columns` columns of
    /// `card_width` x `card_height` cells starting at `origin_y`
    pub fn layout_grid(&mut self, columns: usize, card_width: f64, card_height: f64, origin_y: f64) {
        let columns = columns.max(1);
        for (index, card) in self.grid_cards().into_iter().enumerate() {
            let Some(src) = card.image_src else {
                continue;
            };
            let row = (index / columns) as f64;
            let col = (index % columns) as f64;
            let region = Region::new(col * card_width, origin_y + row * card_height, card_width, card_height);
            self.images.register(card.listing_id, src, region);
        }
    }

    pub fn images(&self) -> &ImageLoader<String> {
        &self.images
    }

    /// Move the viewport over the grid; returns listing ids whose image
    /// became eligible for fetching
    pub fn scroll_to(&mut self, viewport: Region) -> Vec<String> {
        self.images.scroll_to(viewport)
    }

    pub async fn load_visible_images(&mut self) -> usize {
        self.images.load_visible().await
    }

    /// Mount or refresh the map projection. Does nothing outside map mode.
    pub async fn render_map(&mut self) -> Result<bool, MapError> {
        if self.mode() != ViewMode::Map {
            return Ok(false);
        }
        self.map.render(&self.listings, &self.on_marker_click).await
    }

    pub fn map(&self) -> &MapRenderer {
        &self.map
    }

    /// Marker click from the map surface: selects the listing
    pub fn click_marker(&mut self, marker: MarkerId) -> bool {
        let clicked = self.map.click(marker);
        if clicked {
            self.sync_carousel();
        }
        clicked
    }

    pub fn hover_marker(&mut self, marker: MarkerId, entering: bool) {
        self.map.hover(marker, entering);
    }

    fn sync_carousel(&mut self) {
        let selected = self.state().selected_listing_id;
        match selected {
            Some(id) => {
                let stale = self.carousel.as_ref().map(|(cid, _)| *cid != id).unwrap_or(true);
                if stale {
                    self.carousel = self
                        .listings
                        .iter()
                        .find(|l| l.id == id)
                        .map(|l| (id.clone(), Carousel::for_listing(l)));
                }
            }
            None => self.carousel = None,
        }
    }
}
