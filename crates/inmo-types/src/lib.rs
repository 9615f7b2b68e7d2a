//! Core types and structures for inmo
//!
//! This crate provides the foundational types shared by the session, results
//! and client crates: listings, transcript messages and the error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod wire;

pub use wire::{ChatReply, ChatRequest, ListingRecord};

// ============================================================================
// Constants
// ============================================================================

/// Prompt sent on behalf of the user to open every session
pub const GREETING_PROMPT: &str =
    "Hola, presentate brevemente y preguntame que tipo de inmueble estoy buscando";

/// Assistant text shown when the opening greeting cannot reach the backend
pub const START_FAILURE_TEXT: &str = "No puedo conectar con el servidor. Por favor, asegurate de que el backend este corriendo.\n\nEjecuta en una terminal:\ncd backend\npython main.py";

/// Assistant text appended when a user turn fails
pub const SEND_FAILURE_TEXT: &str = "Hubo un problema de conexion. Por favor, intenta de nuevo.";

/// Assistant text shown when the greeting after a reset fails
pub const RESET_FAILURE_TEXT: &str = "Error al reiniciar. Intenta de nuevo.";

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Failure classes surfaced by the client runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Chat endpoint unreachable or answered with a non-success status
    #[error("connection failure")]
    ConnectionFailure,
    /// Releasing server-side session state failed; never shown to the user
    #[error("reset failure")]
    ResetFailure,
    /// A listing lacks a field a view wanted to draw
    #[error("listing data gap")]
    RenderDataGap,
}

// ============================================================================
// Listing Types
// ============================================================================

/// Whether a listing is offered for sale or for rent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sale,
    Rental,
}

impl Operation {
    /// Map the backend's `operacion` value; anything but a rental is a sale
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "alquiler" | "rental" | "rent" => Operation::Rental,
            _ => Operation::Sale,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Operation::Sale => "Venta",
            Operation::Rental => "Alquiler",
        }
    }
}

/// Geographic position in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A listing photo with an optional smaller rendition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbnail_url: Option<String>,
}

impl ListingImage {
    /// Source for compact renderings: thumbnail first, full image otherwise
    pub fn compact_src(&self) -> Option<&str> {
        self.thumbnail_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(self.url.as_str()).filter(|s| !s.is_empty()))
    }

    /// Source for full-size renderings: full image first, thumbnail otherwise
    pub fn full_src(&self) -> Option<&str> {
        Some(self.url.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| self.thumbnail_url.as_deref().filter(|s| !s.is_empty()))
    }
}

/// A single property offered by the backend.
///
/// Identity is `id`: two listings with the same id describe the same property
/// even when other fields differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: Option<f64>,
    pub currency: String,
    pub operation: Operation,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub featured: bool,
}

impl Listing {
    /// Build a listing with only the identifying fields filled in
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: None,
            currency: String::new(),
            operation: Operation::Sale,
            location: String::new(),
            coordinates: None,
            images: Vec::new(),
            bedrooms: None,
            bathrooms: None,
            area_m2: None,
            featured: false,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    /// First image usable in a compact card or marker
    pub fn primary_compact_src(&self) -> Option<&str> {
        self.images.iter().find_map(|img| img.compact_src())
    }
}

// ============================================================================
// Message Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub listings: Option<Vec<Listing>>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            listings: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            listings: None,
        }
    }

    /// Assistant message carrying a result set; an empty set is dropped
    pub fn assistant_with_listings(text: impl Into<String>, listings: Vec<Listing>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            listings: if listings.is_empty() { None } else { Some(listings) },
        }
    }

    pub fn listings(&self) -> &[Listing] {
        self.listings.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_from_wire() {
        assert_eq!(Operation::from_wire("alquiler"), Operation::Rental);
        assert_eq!(Operation::from_wire(" Alquiler "), Operation::Rental);
        assert_eq!(Operation::from_wire("venta"), Operation::Sale);
        assert_eq!(Operation::from_wire(""), Operation::Sale);
    }

    #[test]
    fn test_image_source_preference() {
        let img = ListingImage {
            url: "https://img/full.jpg".to_string(),
            thumbnail_url: Some("https://img/thumb.jpg".to_string()),
        };
        assert_eq!(img.compact_src(), Some("https://img/thumb.jpg"));
        assert_eq!(img.full_src(), Some("https://img/full.jpg"));

        let only_full = ListingImage {
            url: "https://img/full.jpg".to_string(),
            thumbnail_url: Some(String::new()),
        };
        assert_eq!(only_full.compact_src(), Some("https://img/full.jpg"));

        let empty = ListingImage {
            url: String::new(),
            thumbnail_url: None,
        };
        assert_eq!(empty.compact_src(), None);
        assert_eq!(empty.full_src(), None);
    }

    #[test]
    fn test_empty_result_set_is_not_attached() {
        let msg = Message::assistant_with_listings("Hola", Vec::new());
        assert!(msg.listings.is_none());
        assert!(msg.listings().is_empty());

        let msg = Message::assistant_with_listings("Hola", vec![Listing::new("A", "Casa")]);
        assert_eq!(msg.listings().len(), 1);
    }
}
