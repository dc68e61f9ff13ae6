//! One-off maintenance tasks over the property catalogue.
//!
//! - [`backfill_slugs`] assigns a slug to every record that lacks one.
//! - [`backfill_keywords`] recomputes keyword phrases, saving only records
//!   whose keywords changed.
//! - [`ping_existing`] announces every canonical property URL to search
//!   engines in paced batches.

use std::time::Duration;

use anyhow::Context;
use campos_core::keywords::generate_keywords;
use campos_core::notify::SearchNotifier;
use campos_core::site::{normalize_base, property_url};
use campos_core::slug::make_unique_slug;
use campos_core::store::PropertyStore;

/// Outcome of a backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
}

/// Assign a unique slug to every record without one.
pub async fn backfill_slugs(
    store: &dyn PropertyStore,
    max_attempts: u32,
) -> anyhow::Result<BackfillReport> {
    let properties = store.list_all().await.context("Failed to load properties")?;
    let mut report = BackfillReport {
        scanned: properties.len(),
        ..Default::default()
    };

    for mut property in properties.into_iter().filter(|p| p.slug.is_none()) {
        let slug = make_unique_slug(store, &property.title, Some(property.id), max_attempts)
            .await
            .with_context(|| format!("No free slug for property {}", property.id))?;
        property.slug = Some(slug);
        store
            .save(&property)
            .await
            .with_context(|| format!("Failed to save property {}", property.id))?;

        tracing::info!(property_id = property.id, slug = ?property.slug, "Slug assigned");
        report.updated += 1;
    }

    Ok(report)
}

/// Recompute keywords for every record, saving only those that changed.
pub async fn backfill_keywords(store: &dyn PropertyStore) -> anyhow::Result<BackfillReport> {
    let properties = store.list_all().await.context("Failed to load properties")?;
    let mut report = BackfillReport {
        scanned: properties.len(),
        ..Default::default()
    };

    for mut property in properties {
        let keywords = generate_keywords(&property.keyword_input());
        if keywords == property.keywords {
            tracing::debug!(property_id = property.id, "Keywords unchanged");
            continue;
        }
        property.keywords = keywords;
        store
            .save(&property)
            .await
            .with_context(|| format!("Failed to save property {}", property.id))?;

        tracing::info!(
            property_id = property.id,
            count = property.keywords.len(),
            "Keywords updated"
        );
        report.updated += 1;
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Search-engine pings
// ---------------------------------------------------------------------------

/// Batch size and pauses used by [`ping_existing`].
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub batch_size: usize,
    /// Pause after every batch.
    pub batch_pause: Duration,
    /// Pause after each single-URL retry.
    pub single_pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_pause: Duration::from_millis(1500),
            single_pause: Duration::from_millis(300),
        }
    }
}

/// Outcome of [`ping_existing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingReport {
    pub total: usize,
    pub notified: usize,
    /// URLs that failed alone after their batch failed.
    pub failed: Vec<String>,
}

/// Canonical URL of every property, most recently updated first.
pub async fn canonical_urls(
    store: &dyn PropertyStore,
    site_base_url: &str,
) -> anyhow::Result<Vec<String>> {
    let base = normalize_base(site_base_url);
    let entries = store
        .sitemap_entries()
        .await
        .context("Failed to load sitemap entries")?;
    Ok(entries
        .iter()
        .map(|e| property_url(&base, e.id, e.slug.as_deref()))
        .collect())
}

/// Notify `urls` in batches. A failed batch is retried one URL at a time.
pub async fn ping_existing(
    notifier: &dyn SearchNotifier,
    urls: &[String],
    pacing: Pacing,
) -> PingReport {
    let mut report = PingReport {
        total: urls.len(),
        ..Default::default()
    };

    for chunk in urls.chunks(pacing.batch_size.max(1)) {
        match notifier.notify(chunk).await {
            Ok(()) => {
                report.notified += chunk.len();
                tracing::info!(done = report.notified, total = report.total, "Batch notified");
            }
            Err(e) => {
                tracing::warn!(size = chunk.len(), error = %e, "Batch failed, retrying one by one");
                for url in chunk {
                    match notifier.notify(std::slice::from_ref(url)).await {
                        Ok(()) => {
                            report.notified += 1;
                            tracing::info!(url = %url, "Notified");
                        }
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "Notification failed");
                            report.failed.push(url.clone());
                        }
                    }
                    tokio::time::sleep(pacing.single_pause).await;
                }
            }
        }
        tokio::time::sleep(pacing.batch_pause).await;
    }

    report
}
