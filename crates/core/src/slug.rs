//! URL slugs derived from property titles.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::CoreError;
use crate::store::PropertyStore;
use crate::types::DbId;

/// Maximum slug length before any uniqueness suffix.
pub const MAX_SLUG_LEN: usize = 90;

/// Slug used when the title contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "propiedad";

/// Lowercase ASCII with diacritics stripped. Shared with keyword generation.
pub(crate) fn fold_diacritics(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Convert arbitrary text into a URL-safe slug.
///
/// Diacritics are stripped, `&` reads as `y`, every run of characters outside
/// `[a-z0-9]` becomes a single hyphen, and the result is capped at
/// [`MAX_SLUG_LEN`]. Returns [`FALLBACK_SLUG`] when nothing remains.
///
/// ```
/// use campos_core::slug::slugify;
///
/// assert_eq!(slugify("Campo Los Álamos"), "campo-los-alamos");
/// assert_eq!(slugify("Casa & Quinta"), "casa-y-quinta");
/// assert_eq!(slugify("!!!"), "propiedad");
/// ```
pub fn slugify(input: &str) -> String {
    let folded = fold_diacritics(input).replace('&', " y ");

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    // ASCII only at this point, so byte truncation is char-safe.
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Candidate number `n` for a base slug: `base`, `base-2`, `base-3`, ...
fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// Produce a slug for `title` not held by any record other than `current_id`.
///
/// Tries `base`, `base-2`, `base-3`, ... and fails with
/// [`CoreError::GenerationExhausted`] after `max_attempts` attempts.
pub async fn make_unique_slug(
    store: &dyn PropertyStore,
    title: &str,
    current_id: Option<DbId>,
    max_attempts: u32,
) -> Result<String, CoreError> {
    let base = slugify(title);

    for n in 1..=max_attempts {
        let slug = candidate(&base, n);
        if !store.slug_exists(&slug, current_id).await? {
            return Ok(slug);
        }
        tracing::debug!(slug = %slug, "Slug taken, probing next candidate");
    }

    Err(CoreError::GenerationExhausted {
        what: "slug",
        attempts: max_attempts,
    })
}
