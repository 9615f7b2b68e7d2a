//! Viewport-aware deferred image loading
//!
//! Every image starts `Unobserved`. Its container is registered with a
//! [`VisibilityObserver`]; once the container comes within the proximity
//! margin of the viewport the image becomes `InView` and only then is it
//! fetched. Observation is one-shot: the observer forgets a region the moment
//! it reports it. A failed fetch swaps in [`PLACEHOLDER_SVG`] for good.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Default distance ahead of the visible viewport at which fetching starts
pub const DEFAULT_MARGIN_PX: f64 = 100.0;

/// Inline graphic shown in place of an image that failed to load
pub const PLACEHOLDER_SVG: &str = "data:image/svg+xml,<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"400\" height=\"300\" viewBox=\"0 0 400 300\"><rect fill=\"%23e2e8f0\" width=\"400\" height=\"300\"/><text fill=\"%2394a3b8\" font-size=\"14\" x=\"50%\" y=\"50%\" text-anchor=\"middle\" dy=\".3em\">Sin imagen</text></svg>";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image fetch failed: {0}")]
    Fetch(String),

    #[error("image could not be decoded: {0}")]
    Decode(String),
}

/// Fetches and decodes one image source
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<(), ImageError>;
}

/// Rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn expanded(&self, margin: f64) -> Region {
        Region {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// One-shot proximity observer.
///
/// Notifications are produced only when a region is registered or the
/// viewport moves; nothing polls.
pub struct VisibilityObserver<K> {
    margin: f64,
    viewport: Option<Region>,
    watched: Vec<(K, Region)>,
}

impl<K: Clone + PartialEq> VisibilityObserver<K> {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            viewport: None,
            watched: Vec::new(),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Start watching `region`. Returns `true` when it is already within the
    /// margin, in which case it is not kept.
    pub fn observe(&mut self, key: K, region: Region) -> bool {
        if self.is_near(&region) {
            return true;
        }
        self.watched.retain(|(k, _)| *k != key);
        self.watched.push((key, region));
        false
    }

    pub fn unobserve(&mut self, key: &K) {
        self.watched.retain(|(k, _)| k != key);
    }

    /// Move the viewport and report every watched key that entered the margin
    pub fn set_viewport(&mut self, viewport: Region) -> Vec<K> {
        self.viewport = Some(viewport);
        let mut entered = Vec::new();
        let mut remaining = Vec::with_capacity(self.watched.len());
        for (key, region) in self.watched.drain(..) {
            if region.intersects(&viewport.expanded(self.margin)) {
                entered.push(key);
            } else {
                remaining.push((key, region));
            }
        }
        self.watched = remaining;
        entered
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    fn is_near(&self, region: &Region) -> bool {
        self.viewport
            .map(|vp| region.intersects(&vp.expanded(self.margin)))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Unobserved,
    InView,
    Loaded,
    Errored,
}

/// State of a single deferred image
#[derive(Debug, Clone)]
pub struct LazyImage {
    src: String,
    state: ImageState,
}

impl LazyImage {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            state: ImageState::Unobserved,
        }
    }

    pub fn state(&self) -> ImageState {
        self.state
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// `Unobserved -> InView`; any other state is left alone
    pub fn enter_view(&mut self) -> bool {
        if self.state == ImageState::Unobserved {
            self.state = ImageState::InView;
            true
        } else {
            false
        }
    }

    /// Record the fetch outcome; only an `InView` image can settle
    pub fn settle(&mut self, outcome: &Result<(), ImageError>) {
        if self.state != ImageState::InView {
            return;
        }
        self.state = match outcome {
            Ok(()) => ImageState::Loaded,
            Err(_) => ImageState::Errored,
        };
    }

    /// What an `<img>` would point at: nothing until in view, the placeholder
    /// after an error
    pub fn display_src(&self) -> Option<&str> {
        match self.state {
            ImageState::Unobserved => None,
            ImageState::Errored => Some(PLACEHOLDER_SVG),
            ImageState::InView | ImageState::Loaded => Some(&self.src),
        }
    }
}

/// Owns the lazy images of one view and activates them by viewport proximity
pub struct ImageLoader<K> {
    observer: VisibilityObserver<K>,
    images: HashMap<K, LazyImage>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl<K: Clone + Eq + Hash> ImageLoader<K> {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, margin: f64) -> Self {
        Self {
            observer: VisibilityObserver::new(margin),
            images: HashMap::new(),
            fetcher,
        }
    }

    /// Track an image whose container occupies `region`.
    ///
    /// Registering a tracked key again only moves its region; an image that
    /// already left `Unobserved` keeps its state and is not watched again.
    pub fn register(&mut self, key: K, src: impl Into<String>, region: Region) {
        if let Some(image) = self.images.get_mut(&key) {
            if image.state() == ImageState::Unobserved && self.observer.observe(key, region) {
                image.enter_view();
            }
            return;
        }

        let mut image = LazyImage::new(src);
        if self.observer.observe(key.clone(), region) {
            image.enter_view();
        }
        self.images.insert(key, image);
    }

    /// Move the viewport; returns the keys that just became `InView`
    pub fn scroll_to(&mut self, viewport: Region) -> Vec<K> {
        let entered = self.observer.set_viewport(viewport);
        entered
            .into_iter()
            .filter(|key| {
                self.images
                    .get_mut(key)
                    .map(LazyImage::enter_view)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Fetch every image that is `InView` and not yet settled.
    ///
    /// Returns how many fetches were issued.
    pub async fn load_visible(&mut self) -> usize {
        let pending: Vec<(K, String)> = self
            .images
            .iter()
            .filter(|(_, img)| img.state() == ImageState::InView)
            .map(|(k, img)| (k.clone(), img.src().to_string()))
            .collect();

        if pending.is_empty() {
            return 0;
        }

        let fetcher = self.fetcher.clone();
        let outcomes = futures::future::join_all(pending.iter().map(|(_, src)| {
            let fetcher = fetcher.clone();
            async move { fetcher.fetch(src).await }
        }))
        .await;

        for ((key, src), outcome) in pending.iter().zip(outcomes.iter()) {
            if let Err(e) = outcome {
                log::debug!("Image {} failed, showing placeholder: {}", src, e);
            }
            if let Some(image) = self.images.get_mut(key) {
                image.settle(outcome);
            }
        }

        pending.len()
    }

    pub fn get(&self, key: &K) -> Option<&LazyImage> {
        self.images.get(key)
    }

    pub fn state(&self, key: &K) -> Option<ImageState> {
        self.images.get(key).map(LazyImage::state)
    }

    /// Number of images that have left `Unobserved`
    pub fn activated_count(&self) -> usize {
        self.images
            .values()
            .filter(|img| img.state() != ImageState::Unobserved)
            .count()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
