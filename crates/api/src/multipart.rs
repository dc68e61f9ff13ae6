//! Reading property forms from `multipart/form-data` bodies.

use axum::extract::Multipart;
use campos_core::form::PropertyForm;
use campos_core::media::UploadFile;

use crate::error::{AppError, AppResult};

/// Field name carrying image files (`images` or `images[]`).
const IMAGES_FIELD: &str = "images";

/// Split a multipart body into raw text fields and image files.
///
/// Unknown text fields are ignored. File parts sent without a file name and
/// without content (an empty file input) are skipped. Any other file field
/// is rejected.
pub async fn read_property_form(
    mut multipart: Multipart,
) -> AppResult<(PropertyForm, Vec<UploadFile>)> {
    let mut form = PropertyForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let base_name = name.strip_suffix("[]").unwrap_or(&name);

        if let Some(filename) = field.file_name().map(str::to_string) {
            if base_name != IMAGES_FIELD {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file field '{name}'"
                )));
            }
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if filename.is_empty() && data.is_empty() {
                continue;
            }
            files.push(UploadFile {
                filename,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if !form.set_field(&name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok((form, files))
}
