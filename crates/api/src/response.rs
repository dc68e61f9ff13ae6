//! Response bodies for property endpoints.

use campos_core::property::Property;
use campos_core::service::PropertyPage;
use serde::Serialize;

/// A property as returned to clients: the stored record plus the plain list
/// of its image URLs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    #[serde(flatten)]
    pub property: Property,
    pub image_urls: Vec<String>,
}

impl From<Property> for PropertyResponse {
    fn from(property: Property) -> Self {
        Self {
            image_urls: property.image_urls(),
            property,
        }
    }
}

/// `{ properties, total, page, pageSize }` listing envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListResponse {
    pub properties: Vec<PropertyResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl From<PropertyPage> for PropertyListResponse {
    fn from(page: PropertyPage) -> Self {
        Self {
            properties: page.properties.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
