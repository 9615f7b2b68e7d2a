#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inmo_results::geo::GeoBounds;
use inmo_results::{
    EngineLoader, ImageError, ImageFetcher, MapEngine, MapError, MapSurface, MarkerCard, MarkerId,
};
use inmo_types::{Coordinates, Listing, ListingImage, Operation};

/// Everything the fake map library was asked to do
#[derive(Debug, Default)]
pub struct EngineLog {
    pub maps_created: usize,
    pub disposed: usize,
    pub centers: Vec<(Coordinates, f64)>,
    pub markers: Vec<MarkerCard>,
    pub fitted: Vec<(GeoBounds, f64)>,
    pub elevated: Vec<(MarkerId, bool)>,
}

pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
}

struct RecordingSurface {
    log: Arc<Mutex<EngineLog>>,
    next_marker: usize,
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, card: &MarkerCard) -> MarkerId {
        self.log.lock().unwrap().markers.push(card.clone());
        self.next_marker += 1;
        MarkerId(self.next_marker)
    }

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: f64) {
        self.log.lock().unwrap().fitted.push((bounds, padding_px));
    }

    fn set_elevated(&mut self, marker: MarkerId, elevated: bool) {
        self.log.lock().unwrap().elevated.push((marker, elevated));
    }

    fn dispose(&mut self) {
        self.log.lock().unwrap().disposed += 1;
    }
}

impl MapEngine for RecordingEngine {
    fn create_map(&self, center: Coordinates, zoom: f64) -> Result<Box<dyn MapSurface>, MapError> {
        let mut log = self.log.lock().unwrap();
        log.maps_created += 1;
        log.centers.push((center, zoom));
        Ok(Box::new(RecordingSurface {
            log: self.log.clone(),
            next_marker: 0,
        }))
    }
}

/// Loader that counts how often the library is actually loaded
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub log: Arc<Mutex<EngineLog>>,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            log: Arc::new(Mutex::new(EngineLog::default())),
            delay,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            log: Arc::new(Mutex::new(EngineLog::default())),
            delay: Duration::ZERO,
            fail: true,
        })
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn MapEngine>, MapError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(MapError::Load("script blocked".to_string()));
        }
        Ok(Arc::new(RecordingEngine {
            log: self.log.clone(),
        }))
    }
}

pub struct OkFetcher;

#[async_trait]
impl ImageFetcher for OkFetcher {
    async fn fetch(&self, _src: &str) -> Result<(), ImageError> {
        Ok(())
    }
}

/// Records every fetch; sources containing "broken" fail to decode
#[derive(Default)]
pub struct RecordingFetcher {
    pub fetched: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageFetcher for RecordingFetcher {
    async fn fetch(&self, src: &str) -> Result<(), ImageError> {
        self.fetched.lock().unwrap().push(src.to_string());
        if src.contains("broken") {
            Err(ImageError::Decode(src.to_string()))
        } else {
            Ok(())
        }
    }
}

pub fn listing(id: &str) -> Listing {
    let mut l = Listing::new(id, format!("Casa {id}"));
    l.price = Some(150_000.0);
    l.currency = "USD".to_string();
    l.location = "Asuncion".to_string();
    l.images = vec![ListingImage {
        url: format!("https://img/{id}.jpg"),
        thumbnail_url: Some(format!("https://img/{id}-t.jpg")),
    }];
    l
}

pub fn geo_listing(id: &str, lat: f64, lng: f64) -> Listing {
    let mut l = listing(id);
    l.coordinates = Some(Coordinates { lat, lng });
    l
}

pub fn rental(mut l: Listing) -> Listing {
    l.operation = Operation::Rental;
    l
}
