//! Human-readable property reference codes (`PREFIX-YEAR-XXXXXX`).

use chrono::Datelike;
use rand::Rng;

use crate::error::CoreError;
use crate::store::PropertyStore;

/// Default prefix for generated references.
pub const DEFAULT_REF_PREFIX: &str = "BARR";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 6;

/// Suffix alphabet. Excludes `I`, `O`, `0` and `1`, which read alike.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Build one candidate reference for `year`.
pub fn ref_candidate(prefix: &str, year: i32) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{year}-{suffix}")
}

/// Generate a reference no stored property uses yet.
///
/// Fails with [`CoreError::GenerationExhausted`] after `max_attempts`
/// collisions, which in practice only happens when the store is broken.
pub async fn generate_unique_ref(
    store: &dyn PropertyStore,
    prefix: &str,
    max_attempts: u32,
) -> Result<String, CoreError> {
    let year = chrono::Utc::now().year();

    for attempt in 1..=max_attempts {
        let candidate = ref_candidate(prefix, year);
        if !store.ref_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::warn!(attempt, candidate = %candidate, "Generated ref already exists");
    }

    Err(CoreError::GenerationExhausted {
        what: "ref",
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryPropertyStore;
    use assert_matches::assert_matches;

    #[test]
    fn candidate_has_expected_shape() {
        let re = regex::Regex::new(r"^BARR-2031-[A-HJ-NP-Z2-9]{6}$").unwrap();
        for _ in 0..50 {
            let c = ref_candidate("BARR", 2031);
            assert!(re.is_match(&c), "unexpected candidate {c}");
        }
    }

    #[test]
    fn candidates_vary() {
        let a = ref_candidate("BARR", 2031);
        let b = ref_candidate("BARR", 2031);
        let c = ref_candidate("BARR", 2031);
        assert!(a != b || b != c);
    }

    #[tokio::test]
    async fn unique_ref_uses_current_year() {
        let store = MemoryPropertyStore::default();
        let r = generate_unique_ref(&store, "BARR", 20).await.unwrap();
        let year = chrono::Utc::now().year();
        assert!(r.starts_with(&format!("BARR-{year}-")));
    }

    #[tokio::test]
    async fn unique_ref_gives_up_when_every_candidate_collides() {
        let store = MemoryPropertyStore::default();
        store.set_every_ref_taken(true);

        let result = generate_unique_ref(&store, "BARR", 5).await;
        assert_matches!(
            result,
            Err(CoreError::GenerationExhausted { what: "ref", attempts: 5 })
        );
        assert_eq!(store.ref_lookup_count(), 5);
    }
}
