//! Raw property form input and its normalization into typed values.
//!
//! Clients submit properties as multipart forms where every value is text
//! and list fields may arrive repeated, as a JSON array, or comma-separated.
//! [`PropertyForm`] holds that raw input; [`CreateProperty::from_form`] and
//! [`PropertyChanges::from_form`] validate it into typed attributes.

use crate::error::CoreError;
use crate::property::{apply_dwelling_rule, Dwelling, OperationType, Property};
use crate::video_urls::normalize_video_urls;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Raw text fields of a create/update request. `None` means the field was
/// not sent at all; `Some("")` means it was sent blank.
#[derive(Debug, Clone, Default)]
pub struct PropertyForm {
    pub ref_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub operation_type: Option<String>,
    pub property_type: Option<String>,
    pub price: Option<String>,
    pub measure: Option<String>,
    pub location: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub environments: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub condition: Option<String>,
    pub age: Option<String>,
    pub house_measures: Option<String>,
    pub services: Option<Vec<String>>,
    pub extras: Option<Vec<String>>,
    pub environments_list: Option<Vec<String>>,
    pub video_urls: Option<Vec<String>>,
    pub keep_images: Option<Vec<String>>,
}

fn push_value(list: &mut Option<Vec<String>>, value: String) {
    list.get_or_insert_with(Vec::new).push(value);
}

impl PropertyForm {
    /// Assign a form field by its wire name. List fields accumulate repeated
    /// values. Returns `false` for names this form does not know.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let name = name.strip_suffix("[]").unwrap_or(name);
        match name {
            "ref" => self.ref_code = Some(value),
            "title" => self.title = Some(value),
            "description" => self.description = Some(value),
            "operationType" => self.operation_type = Some(value),
            "propertyType" => self.property_type = Some(value),
            "price" => self.price = Some(value),
            "measure" => self.measure = Some(value),
            "location" => self.location = Some(value),
            "lat" => self.lat = Some(value),
            "lng" => self.lng = Some(value),
            "environments" => self.environments = Some(value),
            "bedrooms" => self.bedrooms = Some(value),
            "bathrooms" => self.bathrooms = Some(value),
            "condition" => self.condition = Some(value),
            "age" => self.age = Some(value),
            "houseMeasures" => self.house_measures = Some(value),
            "services" => push_value(&mut self.services, value),
            "extras" => push_value(&mut self.extras, value),
            "environmentsList" => push_value(&mut self.environments_list, value),
            "videoUrls" => push_value(&mut self.video_urls, value),
            "keepImages" => push_value(&mut self.keep_images, value),
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Trimmed text, or `None` when blank.
fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse an optional number. Blank input is `None`; anything else must be a
/// finite number.
pub fn parse_number(raw: &str, field: &str) -> Result<Option<f64>, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(CoreError::Validation(format!(
            "{field} must be a number, got '{trimmed}'"
        ))),
    }
}

/// Parse an optional non-negative whole count.
fn parse_count(raw: &str, field: &str) -> Result<Option<i32>, CoreError> {
    let Some(n) = parse_number(raw, field)? else {
        return Ok(None);
    };
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(i32::MAX) {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative whole number"
        )));
    }
    Ok(Some(n as i32))
}

/// Flatten raw list values. Each value may be a JSON array or a
/// comma-separated string; items are trimmed and blanks dropped.
pub fn parse_string_array<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(value) {
                out.extend(
                    items
                        .into_iter()
                        .map(|item| match item {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .filter_map(|s| non_blank(&s)),
                );
                continue;
            }
        }
        out.extend(value.split(',').filter_map(non_blank));
    }
    out
}

fn check_min(value: Option<f64>, field: &str, min: f64) -> Result<Option<f64>, CoreError> {
    match value {
        Some(v) if v < min => Err(CoreError::Validation(format!(
            "{field} must be at least {min}"
        ))),
        other => Ok(other),
    }
}

fn check_coordinate(value: Option<f64>, field: &str, limit: f64) -> Result<Option<f64>, CoreError> {
    match value {
        Some(v) if v.abs() > limit => Err(CoreError::Validation(format!(
            "{field} must be between -{limit} and {limit}"
        ))),
        other => Ok(other),
    }
}

fn parse_measure(raw: &str) -> Result<f64, CoreError> {
    match parse_number(raw, "measure")? {
        Some(m) if m > 0.0 => Ok(m),
        _ => Err(CoreError::Validation(
            "measure must be a positive number".into(),
        )),
    }
}

fn parse_price(raw: &str) -> Result<Option<f64>, CoreError> {
    check_min(parse_number(raw, "price")?, "price", 0.0)
}

fn parse_lat(raw: &str) -> Result<Option<f64>, CoreError> {
    check_coordinate(parse_number(raw, "lat")?, "lat", 90.0)
}

fn parse_lng(raw: &str) -> Result<Option<f64>, CoreError> {
    check_coordinate(parse_number(raw, "lng")?, "lng", 180.0)
}

fn parse_house_measures(raw: &str) -> Result<Option<f64>, CoreError> {
    check_min(parse_number(raw, "houseMeasures")?, "houseMeasures", 0.0)
}

fn required_text(raw: Option<&str>, field: &str) -> Result<String, CoreError> {
    raw.and_then(non_blank)
        .ok_or_else(|| CoreError::Validation(format!("{field} is required")))
}

fn optional<T>(
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> Result<Option<T>, CoreError>,
) -> Result<Option<T>, CoreError> {
    raw.map(parse).transpose().map(Option::flatten)
}

/// Like [`optional`] but keeps "not sent" (`None`) apart from "sent blank"
/// (`Some(None)`).
fn patch<T>(
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> Result<Option<T>, CoreError>,
) -> Result<Option<Option<T>>, CoreError> {
    raw.map(parse).transpose()
}

fn text_patch(raw: Option<&str>) -> Option<Option<String>> {
    raw.map(non_blank)
}

fn list(raw: Option<&Vec<String>>) -> Option<Vec<String>> {
    raw.map(|values| parse_string_array(values))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Validated attributes for a new property.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateProperty {
    /// Client-supplied reference; generated when absent.
    pub ref_code: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub operation_type: OperationType,
    pub property_type: Option<String>,
    pub price: Option<f64>,
    pub measure: f64,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub services: Vec<String>,
    pub extras: Vec<String>,
    pub dwelling: Dwelling,
    pub video_urls: Vec<String>,
}

impl CreateProperty {
    pub fn from_form(form: &PropertyForm) -> Result<Self, CoreError> {
        let title = required_text(form.title.as_deref(), "title")?;
        let location = required_text(form.location.as_deref(), "location")?;
        let measure = parse_measure(form.measure.as_deref().unwrap_or(""))?;
        let operation_type =
            OperationType::parse(&required_text(form.operation_type.as_deref(), "operationType")?)?;

        let extras = list(form.extras.as_ref()).unwrap_or_default();
        let dwelling = Dwelling {
            environments: optional(form.environments.as_deref(), |r| parse_count(r, "environments"))?,
            environments_list: list(form.environments_list.as_ref()).unwrap_or_default(),
            bedrooms: optional(form.bedrooms.as_deref(), |r| parse_count(r, "bedrooms"))?,
            bathrooms: optional(form.bathrooms.as_deref(), |r| parse_count(r, "bathrooms"))?,
            condition: form.condition.as_deref().and_then(non_blank),
            age: form.age.as_deref().and_then(non_blank),
            house_measures: optional(form.house_measures.as_deref(), parse_house_measures)?,
        };

        Ok(Self {
            ref_code: form.ref_code.as_deref().and_then(non_blank),
            title,
            description: form.description.as_deref().and_then(non_blank),
            operation_type,
            property_type: form.property_type.as_deref().and_then(non_blank),
            price: optional(form.price.as_deref(), parse_price)?,
            measure,
            location,
            lat: optional(form.lat.as_deref(), parse_lat)?,
            lng: optional(form.lng.as_deref(), parse_lng)?,
            services: list(form.services.as_ref()).unwrap_or_default(),
            dwelling: apply_dwelling_rule(&extras, dwelling),
            extras,
            video_urls: normalize_video_urls(&list(form.video_urls.as_ref()).unwrap_or_default()),
        })
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Validated changes for an existing property.
///
/// `None` leaves the stored value untouched. For clearable fields
/// `Some(None)` clears the value. List fields replace the stored list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyChanges {
    pub ref_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub operation_type: Option<OperationType>,
    pub property_type: Option<Option<String>>,
    pub price: Option<Option<f64>>,
    pub measure: Option<f64>,
    pub location: Option<String>,
    pub lat: Option<Option<f64>>,
    pub lng: Option<Option<f64>>,
    pub services: Option<Vec<String>>,
    pub extras: Option<Vec<String>>,
    pub environments: Option<Option<i32>>,
    pub environments_list: Option<Vec<String>>,
    pub bedrooms: Option<Option<i32>>,
    pub bathrooms: Option<Option<i32>>,
    pub condition: Option<Option<String>>,
    pub age: Option<Option<String>>,
    pub house_measures: Option<Option<f64>>,
    pub video_urls: Option<Vec<String>>,
    /// Image URLs to retain. `None` keeps every existing image.
    pub keep_images: Option<Vec<String>>,
}

impl PropertyChanges {
    pub fn from_form(form: &PropertyForm) -> Result<Self, CoreError> {
        let title = form
            .title
            .as_deref()
            .map(|t| required_text(Some(t), "title"))
            .transpose()?;
        let location = form
            .location
            .as_deref()
            .map(|l| required_text(Some(l), "location"))
            .transpose()?;

        Ok(Self {
            ref_code: form.ref_code.as_deref().and_then(non_blank),
            title,
            description: text_patch(form.description.as_deref()),
            operation_type: form
                .operation_type
                .as_deref()
                .map(OperationType::parse)
                .transpose()?,
            property_type: text_patch(form.property_type.as_deref()),
            price: patch(form.price.as_deref(), parse_price)?,
            measure: form.measure.as_deref().map(parse_measure).transpose()?,
            location,
            lat: patch(form.lat.as_deref(), parse_lat)?,
            lng: patch(form.lng.as_deref(), parse_lng)?,
            services: list(form.services.as_ref()),
            extras: list(form.extras.as_ref()),
            environments: patch(form.environments.as_deref(), |r| parse_count(r, "environments"))?,
            environments_list: list(form.environments_list.as_ref()),
            bedrooms: patch(form.bedrooms.as_deref(), |r| parse_count(r, "bedrooms"))?,
            bathrooms: patch(form.bathrooms.as_deref(), |r| parse_count(r, "bathrooms"))?,
            condition: text_patch(form.condition.as_deref()),
            age: text_patch(form.age.as_deref()),
            house_measures: patch(form.house_measures.as_deref(), parse_house_measures)?,
            video_urls: list(form.video_urls.as_ref()).map(|urls| normalize_video_urls(&urls)),
            keep_images: list(form.keep_images.as_ref()),
        })
    }

    /// Whether the incoming title differs from `current` (both trimmed).
    pub fn changes_title(&self, current: &str) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| t != current.trim())
    }

    /// Apply every supplied change to `property`, then re-apply the dwelling
    /// rule against the resulting extras. Ref, slug, images and keywords are
    /// the service's responsibility.
    pub fn apply_to(&self, property: &mut Property) {
        fn set<T: Clone>(target: &mut T, change: &Option<T>) {
            if let Some(value) = change {
                *target = value.clone();
            }
        }

        set(&mut property.title, &self.title);
        set(&mut property.description, &self.description);
        set(&mut property.operation_type, &self.operation_type);
        set(&mut property.property_type, &self.property_type);
        set(&mut property.price, &self.price);
        set(&mut property.measure, &self.measure);
        set(&mut property.location, &self.location);
        set(&mut property.lat, &self.lat);
        set(&mut property.lng, &self.lng);
        set(&mut property.services, &self.services);
        set(&mut property.extras, &self.extras);
        set(&mut property.video_urls, &self.video_urls);

        let mut dwelling = property.dwelling.clone();
        set(&mut dwelling.environments, &self.environments);
        set(&mut dwelling.environments_list, &self.environments_list);
        set(&mut dwelling.bedrooms, &self.bedrooms);
        set(&mut dwelling.bathrooms, &self.bathrooms);
        set(&mut dwelling.condition, &self.condition);
        set(&mut dwelling.age, &self.age);
        set(&mut dwelling.house_measures, &self.house_measures);
        property.dwelling = apply_dwelling_rule(&property.extras, dwelling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_property;
    use assert_matches::assert_matches;

    fn form(fields: &[(&str, &str)]) -> PropertyForm {
        let mut form = PropertyForm::default();
        for (name, value) in fields {
            assert!(form.set_field(name, value.to_string()), "unknown field {name}");
        }
        form
    }

    fn valid_create() -> PropertyForm {
        form(&[
            ("title", "  Campo Los Alamos "),
            ("location", "San José, Entre Ríos"),
            ("measure", "120"),
            ("operationType", "Venta"),
        ])
    }

    #[test]
    fn unknown_fields_are_reported() {
        let mut f = PropertyForm::default();
        assert!(!f.set_field("isAdmin", "true".into()));
        assert!(f.set_field("services[]", "Agua".into()));
        assert_eq!(f.services, Some(vec!["Agua".to_string()]));
    }

    #[test]
    fn parse_number_handles_blank_and_garbage() {
        assert_eq!(parse_number("", "price").unwrap(), None);
        assert_eq!(parse_number(" 12.5 ", "price").unwrap(), Some(12.5));
        assert_matches!(parse_number("doce", "price"), Err(CoreError::Validation(_)));
        assert_matches!(parse_number("NaN", "price"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn parse_count_requires_whole_numbers() {
        assert_eq!(parse_count("3", "bedrooms").unwrap(), Some(3));
        assert_matches!(parse_count("2.5", "bedrooms"), Err(CoreError::Validation(_)));
        assert_matches!(parse_count("-1", "bedrooms"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn string_arrays_accept_json_csv_and_repeats() {
        assert_eq!(
            parse_string_array(&[r#"["Agua", " Luz ", ""]"#]),
            vec!["Agua", "Luz"]
        );
        assert_eq!(parse_string_array(&["Agua, Luz,,Gas"]), vec!["Agua", "Luz", "Gas"]);
        assert_eq!(parse_string_array(&["Agua", "Luz"]), vec!["Agua", "Luz"]);
        assert_eq!(parse_string_array(&["[not json"]), vec!["[not json"]);
    }

    #[test]
    fn create_trims_and_types_fields() {
        let input = CreateProperty::from_form(&valid_create()).unwrap();
        assert_eq!(input.title, "Campo Los Alamos");
        assert_eq!(input.measure, 120.0);
        assert_eq!(input.operation_type, OperationType::Sale);
        assert_eq!(input.ref_code, None);
        assert_eq!(input.price, None);
    }

    #[test]
    fn create_requires_title_location_measure_and_operation() {
        for missing in ["title", "location", "measure", "operationType"] {
            let mut f = valid_create();
            f.set_field(missing, "   ".into());
            assert_matches!(
                CreateProperty::from_form(&f),
                Err(CoreError::Validation(msg)) if msg.contains(missing),
                "field {missing}"
            );
        }
    }

    #[test]
    fn create_rejects_non_positive_measure_and_unknown_operation() {
        let mut f = valid_create();
        f.set_field("measure", "0".into());
        assert_matches!(CreateProperty::from_form(&f), Err(CoreError::Validation(_)));

        let mut f = valid_create();
        f.set_field("measure", "mucho".into());
        assert_matches!(CreateProperty::from_form(&f), Err(CoreError::Validation(_)));

        let mut f = valid_create();
        f.set_field("operationType", "Permuta".into());
        assert_matches!(CreateProperty::from_form(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_rejects_negative_price_and_bad_coordinates() {
        let mut f = valid_create();
        f.set_field("price", "-5".into());
        assert_matches!(CreateProperty::from_form(&f), Err(CoreError::Validation(_)));

        let mut f = valid_create();
        f.set_field("lat", "-91".into());
        assert_matches!(CreateProperty::from_form(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_drops_dwelling_fields_without_marker() {
        let mut f = valid_create();
        f.set_field("bedrooms", "3".into());
        f.set_field("condition", "Bueno".into());
        f.set_field("extras", "Agua".into());
        let input = CreateProperty::from_form(&f).unwrap();
        assert_eq!(input.dwelling, Dwelling::default());

        f.set_field("extras", "Vivienda".into());
        let input = CreateProperty::from_form(&f).unwrap();
        assert_eq!(input.dwelling.bedrooms, Some(3));
        assert_eq!(input.dwelling.condition.as_deref(), Some("Bueno"));
    }

    #[test]
    fn create_filters_video_urls() {
        let mut f = valid_create();
        f.set_field("videoUrls", "https://youtu.be/x, https://example.com/y".into());
        let input = CreateProperty::from_form(&f).unwrap();
        assert_eq!(input.video_urls, vec!["https://youtu.be/x"]);
    }

    #[test]
    fn changes_distinguish_missing_from_blank() {
        let changes = PropertyChanges::from_form(&form(&[("price", "")])).unwrap();
        assert_eq!(changes.price, Some(None));
        assert_eq!(changes.description, None);
        assert_eq!(changes.title, None);
    }

    #[test]
    fn changes_reject_blank_required_fields() {
        assert_matches!(
            PropertyChanges::from_form(&form(&[("title", " ")])),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            PropertyChanges::from_form(&form(&[("measure", "")])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn title_change_detection_trims() {
        let changes = PropertyChanges::from_form(&form(&[("title", " Campo ")])).unwrap();
        assert!(!changes.changes_title("Campo"));
        assert!(changes.changes_title("Otro"));
        assert!(!PropertyChanges::default().changes_title("Campo"));
    }

    #[test]
    fn omitted_fields_keep_stored_values() {
        let mut property = sample_property(1, "Campo Los Alamos");
        let before = property.clone();

        let changes = PropertyChanges::from_form(&form(&[("price", "5000")])).unwrap();
        changes.apply_to(&mut property);

        assert_eq!(property.price, Some(5000.0));
        assert_eq!(property.title, before.title);
        assert_eq!(property.location, before.location);
        assert_eq!(property.services, before.services);
        assert_eq!(property.dwelling, before.dwelling);
    }

    #[test]
    fn lists_are_replaced_wholesale() {
        let mut property = sample_property(1, "Campo");
        property.services = vec!["Agua".into(), "Luz".into()];

        let changes = PropertyChanges::from_form(&form(&[("services", "Gas")])).unwrap();
        changes.apply_to(&mut property);
        assert_eq!(property.services, vec!["Gas"]);
    }

    #[test]
    fn extras_without_marker_clear_dwelling_even_if_supplied() {
        let mut property = sample_property(1, "Campo");
        assert!(property.dwelling.bedrooms.is_some());

        let changes = PropertyChanges::from_form(&form(&[
            ("extras", "Agua"),
            ("bedrooms", "4"),
            ("condition", "Nuevo"),
        ]))
        .unwrap();
        changes.apply_to(&mut property);

        assert_eq!(property.extras, vec!["Agua"]);
        assert_eq!(property.dwelling, Dwelling::default());
    }
}
