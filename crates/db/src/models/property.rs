//! Row model for the `properties` table.

use campos_core::error::CoreError;
use campos_core::property::{Dwelling, OperationType, Property, PropertyImage};
use campos_core::site::SitemapEntry;
use campos_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `properties` table.
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub id: DbId,
    pub ref_code: String,
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Wire value, `Venta` or `Arrendamiento` (CHECK constrained).
    pub operation_type: String,
    pub price: Option<f64>,
    pub measure: f64,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub property_type: Option<String>,
    pub services: Vec<String>,
    pub extras: Vec<String>,
    pub environments: Option<i32>,
    pub environments_list: Vec<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub condition: Option<String>,
    pub age: Option<String>,
    pub house_measures: Option<f64>,
    pub images: Json<Vec<PropertyImage>>,
    pub video_urls: Vec<String>,
    pub keywords: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<PropertyRow> for Property {
    type Error = CoreError;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        Ok(Property {
            id: row.id,
            ref_code: row.ref_code,
            slug: row.slug,
            title: row.title,
            description: row.description,
            operation_type: OperationType::parse(&row.operation_type)?,
            price: row.price,
            measure: row.measure,
            location: row.location,
            lat: row.lat,
            lng: row.lng,
            property_type: row.property_type,
            services: row.services,
            extras: row.extras,
            dwelling: Dwelling {
                environments: row.environments,
                environments_list: row.environments_list,
                bedrooms: row.bedrooms,
                bathrooms: row.bathrooms,
                condition: row.condition,
                age: row.age,
                house_measures: row.house_measures,
            },
            images: row.images.0,
            video_urls: row.video_urls,
            keywords: row.keywords,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Projection used to render the sitemap.
#[derive(Debug, Clone, FromRow)]
pub struct SitemapRow {
    pub id: DbId,
    pub slug: Option<String>,
    pub updated_at: Timestamp,
}

impl From<SitemapRow> for SitemapEntry {
    fn from(row: SitemapRow) -> Self {
        SitemapEntry {
            id: row.id,
            slug: row.slug,
            last_modified: row.updated_at,
        }
    }
}
