//! Backend request/response shapes and lenient listing decoding
//!
//! The backend assembles listing records from scraped data, so numeric fields
//! may arrive as numbers, numeric strings, `"?"` or free text. Anything that
//! cannot be interpreted decodes to `None` instead of failing the whole reply.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Coordinates, Listing, ListingImage, Operation};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub mensaje: &'a str,
    pub session_id: &'a str,
}

/// Body of a successful `POST /chat` reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub respuesta: String,
    #[serde(deserialize_with = "deserialize_records", default)]
    pub propiedades: Vec<ListingRecord>,
}

impl ChatReply {
    /// Convert the raw records into listings, dropping records without an id
    pub fn listings(&self) -> Vec<Listing> {
        self.propiedades
            .iter()
            .cloned()
            .filter_map(ListingRecord::into_listing)
            .collect()
    }
}

/// A listing exactly as the backend sends it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingRecord {
    #[serde(deserialize_with = "deserialize_id", default)]
    pub id: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub titulo: String,
    #[serde(deserialize_with = "deserialize_number", default)]
    pub precio_numerico: Option<f64>,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub moneda: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub operacion: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub ubicacion: String,
    #[serde(deserialize_with = "deserialize_coordinates", default)]
    pub coordenadas: Option<Coordinates>,
    #[serde(deserialize_with = "deserialize_images", default)]
    pub imagenes: Vec<ListingImage>,
    #[serde(deserialize_with = "deserialize_count", default)]
    pub dormitorios: Option<u32>,
    #[serde(deserialize_with = "deserialize_count", default)]
    pub banos: Option<u32>,
    #[serde(deserialize_with = "deserialize_leading_number", default)]
    pub m2: Option<f64>,
    #[serde(deserialize_with = "deserialize_bool_or_null", default)]
    pub destacado: bool,
}

impl ListingRecord {
    pub fn into_listing(self) -> Option<Listing> {
        let id = self.id.filter(|id| !id.is_empty())?;
        Some(Listing {
            id,
            title: self.titulo,
            price: self.precio_numerico,
            currency: self.moneda,
            operation: Operation::from_wire(&self.operacion),
            location: self.ubicacion,
            coordinates: self.coordenadas,
            images: self.imagenes,
            bedrooms: self.dormitorios,
            bathrooms: self.banos,
            area_m2: self.m2,
            featured: self.destacado,
        })
    }
}

// ============================================================================
// Lenient field helpers
// ============================================================================

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

fn deserialize_bool_or_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|v| v != 0.0).unwrap_or(false)),
        Value::String(s) => Ok(matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "si" | "sí")),
        _ => Ok(false),
    }
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(&Value::deserialize(deserializer)?))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(count
        .filter(|c| c.is_finite() && *c >= 0.0)
        .map(|c| c.trunc() as u32))
}

fn deserialize_leading_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::String(s) => leading_number(s),
        other => number_from_value(other),
    };
    Ok(number.filter(|n| *n > 0.0))
}

fn deserialize_coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(None);
    };
    let lat = map
        .get("latitud")
        .or_else(|| map.get("lat"))
        .and_then(number_from_value);
    let lng = map
        .get("longitud")
        .or_else(|| map.get("lng"))
        .and_then(number_from_value);

    // A zero component means the scraper found no position.
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => Ok(Some(Coordinates { lat, lng })),
        _ => Ok(None),
    }
}

fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<ListingImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    let images = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(url) if !url.is_empty() => Some(ListingImage {
                url,
                thumbnail_url: None,
            }),
            Value::Object(map) => {
                let text = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                let url = text("url");
                let thumbnail_url = text("thumbnail");
                match (url, thumbnail_url) {
                    (Some(url), thumbnail_url) => Some(ListingImage { url, thumbnail_url }),
                    (None, Some(thumb)) => Some(ListingImage {
                        url: String::new(),
                        thumbnail_url: Some(thumb),
                    }),
                    (None, None) => None,
                }
            }
            _ => None,
        })
        .collect();

    Ok(images)
}

fn deserialize_records<'de, D>(deserializer: D) -> Result<Vec<ListingRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ListingRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed listing record: {}", e);
                None
            }
        })
        .collect())
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Parse the number a free-text measurement starts with, e.g. `"120 m²"`
fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.replace(',', ".").parse::<f64>().ok()
}
