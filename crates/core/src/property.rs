//! Property entity, media descriptors and the dwelling rule.
//!
//! A [`Property`] is the stored record. [`NewProperty`] carries the same
//! attributes before the storage layer assigns an id and timestamps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::keywords::KeywordInput;
use crate::types::{DbId, Timestamp};

/// Entry in `extras` that signals a dwelling exists on the land.
pub const DWELLING_MARKER: &str = "Vivienda";

// ---------------------------------------------------------------------------
// Operation type
// ---------------------------------------------------------------------------

/// Commercial operation offered for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    #[serde(rename = "Venta")]
    Sale,
    #[serde(rename = "Arrendamiento")]
    Lease,
}

impl OperationType {
    /// Wire / database value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "Venta",
            Self::Lease => "Arrendamiento",
        }
    }

    /// Parse a client-supplied value. Matching is case-insensitive and
    /// accepts the English names as aliases.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().as_str() {
            "venta" | "sale" => Ok(Self::Sale),
            "arrendamiento" | "lease" => Ok(Self::Lease),
            _ => Err(CoreError::Validation(format!(
                "Invalid operationType '{value}'. Must be one of: Venta, Arrendamiento"
            ))),
        }
    }

    pub fn is_lease(self) -> bool {
        matches!(self, Self::Lease)
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// An image owned by a property: its public URL and the object id used to
/// release it from the image store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub url: String,
    pub object_id: String,
}

// ---------------------------------------------------------------------------
// Dwelling
// ---------------------------------------------------------------------------

/// Attributes describing a building on the land.
///
/// `Default` is the cleared state used whenever `extras` lacks
/// [`DWELLING_MARKER`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dwelling {
    pub environments: Option<i32>,
    pub environments_list: Vec<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub condition: Option<String>,
    pub age: Option<String>,
    pub house_measures: Option<f64>,
}

/// Whether `extras` contains the dwelling marker (trimmed, case-insensitive).
pub fn has_dwelling(extras: &[String]) -> bool {
    extras
        .iter()
        .any(|e| e.trim().eq_ignore_ascii_case(DWELLING_MARKER))
}

/// Return `dwelling` unchanged when `extras` signals a dwelling, otherwise
/// the cleared state.
pub fn apply_dwelling_rule(extras: &[String], dwelling: Dwelling) -> Dwelling {
    if has_dwelling(extras) {
        dwelling
    } else {
        Dwelling::default()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A stored property record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: DbId,
    #[serde(rename = "ref")]
    pub ref_code: String,
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub operation_type: OperationType,
    pub price: Option<f64>,
    pub measure: f64,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub property_type: Option<String>,
    pub services: Vec<String>,
    pub extras: Vec<String>,
    #[serde(flatten)]
    pub dwelling: Dwelling,
    pub images: Vec<PropertyImage>,
    pub video_urls: Vec<String>,
    pub keywords: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Property {
    /// Attributes the keyword generator derives from.
    pub fn keyword_input(&self) -> KeywordInput<'_> {
        KeywordInput {
            title: Some(&self.title),
            location: Some(&self.location),
            operation_type: Some(self.operation_type),
            measure: Some(self.measure),
            property_type: self.property_type.as_deref(),
        }
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.url.clone()).collect()
    }
}

/// A property ready to be inserted. Identifiers and derived fields are
/// already assigned by the reconciliation service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub ref_code: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub operation_type: OperationType,
    pub price: Option<f64>,
    pub measure: f64,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub property_type: Option<String>,
    pub services: Vec<String>,
    pub extras: Vec<String>,
    pub dwelling: Dwelling,
    pub images: Vec<PropertyImage>,
    pub video_urls: Vec<String>,
    pub keywords: Vec<String>,
}
