//! Query parameter types for API handlers.

use campos_core::error::CoreError;
use campos_core::property::OperationType;
use campos_core::store::{PageRequest, PropertyFilter};
use serde::Deserialize;

/// `GET /api/properties` parameters.
///
/// Paging values are parsed leniently: anything that is not a whole number
/// falls back to the default, and out-of-range values are clamped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPropertiesParams {
    pub page: Option<String>,
    #[serde(alias = "limit")]
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub operation_type: Option<String>,
}

fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

impl ListPropertiesParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            lenient_int(self.page.as_deref()),
            lenient_int(self.page_size.as_deref()),
        )
    }

    /// Listing filter. Blank values mean "no filter"; an unknown operation
    /// type is a validation error.
    pub fn filter(&self) -> Result<PropertyFilter, CoreError> {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let operation_type = match self.operation_type.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(OperationType::parse(raw)?),
            _ => None,
        };
        Ok(PropertyFilter {
            search,
            operation_type,
        })
    }
}
