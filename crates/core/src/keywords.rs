//! Search keyword phrases derived from a property's descriptive attributes.
//!
//! The output is a cache over `{title, location, operation type, measure,
//! property type}`: the same input always yields the same list, and it is
//! recomputed on every create and update.

use std::collections::HashSet;

use crate::property::OperationType;
use crate::slug::fold_diacritics;

/// Maximum number of phrases kept per property.
pub const MAX_KEYWORDS: usize = 60;

/// Maximum number of title words that feed phrase generation.
const MAX_TITLE_WORDS: usize = 10;

/// Words dropped from titles before phrase generation.
const STOP_WORDS: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "y", "o", "a", "en", "con", "para", "por", "km", "kms",
    "m2", "m²", "ha", "hectareas", "un", "una", "unos", "unas", "al", "lo", "su", "sus", "tu",
    "tus", "mi", "mis", "que", "es", "se", "u$s", "usd",
];

/// Nouns every property is searchable under.
const BASE_NOUNS: &[&str] = &[
    "campo",
    "campos",
    "campo rural",
    "campo agricola",
    "campo ganadero",
    "chacra",
    "estancia",
];

const LEASE_VARIANTS: &[&str] = &[
    "arrendamiento",
    "alquiler",
    "arriendo",
    "en alquiler",
    "en arriendo",
];

const SALE_VARIANTS: &[&str] = &["venta", "en venta", "comprar", "venta de campos"];

/// Attributes the generator reads. All optional so partially filled records
/// still produce the fallback phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordInput<'a> {
    pub title: Option<&'a str>,
    pub location: Option<&'a str>,
    pub operation_type: Option<OperationType>,
    pub measure: Option<f64>,
    pub property_type: Option<&'a str>,
}

fn places_from_location(location: Option<&str>) -> Vec<String> {
    let Some(location) = location else {
        return Vec::new();
    };
    fold_diacritics(location)
        .split([',', '-', '/', '|', '>'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn words_from_title(title: Option<&str>) -> Vec<String> {
    let Some(title) = title else {
        return Vec::new();
    };
    let cleaned: String = fold_diacritics(title)
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .take(MAX_TITLE_WORDS)
        .map(str::to_string)
        .collect()
}

fn operation_variants(operation_type: Option<OperationType>) -> &'static [&'static str] {
    match operation_type {
        Some(op) if op.is_lease() => LEASE_VARIANTS,
        _ => SALE_VARIANTS,
    }
}

/// Case-insensitive dedupe keeping the first-seen spelling and order.
fn dedupe(phrases: impl IntoIterator<Item = String>, seen: &mut HashSet<String>) -> Vec<String> {
    let mut out = Vec::new();
    for phrase in phrases {
        let trimmed = phrase.trim();
        let key = trimmed.to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

/// Generate the keyword phrases for a property.
///
/// Place-scoped phrases come first, followed by the bare operation variants
/// and base nouns. The bare phrases are always kept; the place-scoped ones are
/// cut so the total never exceeds [`MAX_KEYWORDS`].
///
/// Bare phrases are deduplicated first, so a place-scoped phrase equal to one
/// of them is dropped from the head and appears only in the bare tail.
pub fn generate_keywords(input: &KeywordInput<'_>) -> Vec<String> {
    let places = places_from_location(input.location);
    let title_words = words_from_title(input.title);
    let ops = operation_variants(input.operation_type);

    let mut nouns: Vec<String> = BASE_NOUNS.iter().map(|n| n.to_string()).collect();
    if let Some(kind) = input.property_type.map(fold_diacritics) {
        let kind = kind.trim();
        if !kind.is_empty() {
            nouns.push(kind.to_string());
        }
    }

    let size_bits: Vec<String> = match input.measure {
        Some(m) if m > 0.0 => vec![format!("{m} ha"), format!("{m} hectareas")],
        _ => Vec::new(),
    };

    let mut scoped = Vec::new();

    for p in &places {
        for o in ops {
            scoped.push(format!("campo {o} {p}"));
            scoped.push(format!("campos {o} {p}"));
            scoped.push(format!("{o} de campo {p}"));
            scoped.push(format!("{o} de campos {p}"));
        }
    }

    for p in &places {
        for n in &nouns {
            scoped.push(format!("{n} {p}"));
            scoped.push(format!("{n} en {p}"));
        }
    }

    for p in &places {
        for s in &size_bits {
            scoped.push(format!("campo {s} {p}"));
            scoped.push(format!("campo {s} en {p}"));
            for o in ops {
                scoped.push(format!("campo {s} {o} {p}"));
            }
        }
    }

    for p in &places {
        for (i, a) in title_words.iter().enumerate() {
            if a == "campo" || a == "campos" {
                continue;
            }
            scoped.push(format!("campo {a} {p}"));
            if let Some(b) = title_words.get(i + 1) {
                scoped.push(format!("campo {a} {b} {p}"));
            }
        }
    }

    let bare = ops
        .iter()
        .chain(BASE_NOUNS.iter())
        .map(|s| s.to_string());

    let mut seen = HashSet::new();
    let fallback = dedupe(bare, &mut seen);
    let mut keywords = dedupe(scoped, &mut seen);
    keywords.truncate(MAX_KEYWORDS.saturating_sub(fallback.len()));
    keywords.extend(fallback);
    keywords
}
