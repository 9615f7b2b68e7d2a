//! Property result visualization for inmo
//!
//! This crate turns the listings attached to one assistant message into the
//! grid and map projections the user browses: deduplication, deferred image
//! loading, marker placement and the selection/detail state that ties them
//! together.

pub mod format;
pub mod geo;
pub mod image;
pub mod map;
pub mod normalizer;
pub mod view;

pub use format::{format_area, format_price, pluralize};
pub use geo::{GeoBounds, PixelPoint, ViewportSize};
pub use image::{ImageError, ImageFetcher, ImageLoader, ImageState, LazyImage, Region, VisibilityObserver};
pub use map::{
    EngineLoader, ListingHandler, MapEngine, MapError, MapLoader, MapRenderer, MapSurface, MarkerCard,
    MarkerId, MarkerImage, OperationBadge,
};
pub use normalizer::dedupe;
pub use view::{Carousel, DetailView, FeatureKind, FeatureTile, GridCard, ResultView, ResultViewState, ViewMode};
