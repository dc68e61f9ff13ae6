//! Search-engine notification over HTTP.
//!
//! [`SearchPinger`] tells search engines a property page changed: it pings
//! the sitemap URL at Google and Bing and, when an IndexNow key is
//! configured, submits the changed URLs to IndexNow. Pings are only sent
//! when enabled (production).

use std::time::Duration;

use async_trait::async_trait;
use campos_core::notify::{NotifyError, SearchNotifier};
use futures::future::join_all;
use serde::Serialize;

/// HTTP request timeout for a single ping.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const GOOGLE_PING_URL: &str = "https://www.google.com/ping";
pub const BING_PING_URL: &str = "https://www.bing.com/ping";
pub const INDEXNOW_URL: &str = "https://api.indexnow.org/IndexNow";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Endpoints and credentials used by [`SearchPinger`].
#[derive(Debug, Clone)]
pub struct PingSettings {
    /// Public site origin, e.g. `https://campos.com`.
    pub site_base_url: String,
    pub indexnow_key: Option<String>,
    /// When `false`, `notify` returns immediately without sending anything.
    pub enabled: bool,
    /// Sitemap ping endpoints; the sitemap URL is sent as `?sitemap=`.
    pub sitemap_ping_urls: Vec<String>,
    pub indexnow_url: String,
}

impl PingSettings {
    /// Production endpoints for `site_base_url`.
    pub fn new(site_base_url: &str, indexnow_key: Option<String>, enabled: bool) -> Self {
        Self {
            site_base_url: site_base_url.trim_end_matches('/').to_string(),
            indexnow_key: indexnow_key.filter(|k| !k.trim().is_empty()),
            enabled,
            sitemap_ping_urls: vec![GOOGLE_PING_URL.to_string(), BING_PING_URL.to_string()],
            indexnow_url: INDEXNOW_URL.to_string(),
        }
    }

    pub fn sitemap_url(&self) -> String {
        format!("{}/sitemap.xml", self.site_base_url)
    }
}

/// IndexNow submission body.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexNowPayload<'a> {
    pub host: String,
    pub key: &'a str,
    pub key_location: String,
    pub url_list: &'a [String],
}

// ---------------------------------------------------------------------------
// SearchPinger
// ---------------------------------------------------------------------------

/// [`SearchNotifier`] that pings sitemaps and submits URLs to IndexNow.
pub struct SearchPinger {
    client: reqwest::Client,
    settings: PingSettings,
}

impl SearchPinger {
    /// Create a pinger with a pre-configured HTTP client.
    pub fn new(settings: PingSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, settings }
    }

    pub fn settings(&self) -> &PingSettings {
        &self.settings
    }

    /// IndexNow body for `urls`, or `None` when there is no key, no URL or the
    /// site origin has no host.
    pub fn indexnow_payload<'a>(&'a self, urls: &'a [String]) -> Option<IndexNowPayload<'a>> {
        let key = self.settings.indexnow_key.as_deref()?;
        if urls.is_empty() {
            return None;
        }
        let host = url::Url::parse(&self.settings.site_base_url)
            .ok()?
            .host_str()?
            .to_string();
        Some(IndexNowPayload {
            host,
            key,
            key_location: format!("{}/{key}.txt", self.settings.site_base_url),
            url_list: urls,
        })
    }

    async fn ping_sitemap(&self, endpoint: &str) -> Result<(), NotifyError> {
        let sitemap = self.settings.sitemap_url();
        let response = self
            .client
            .get(endpoint)
            .query(&[("sitemap", sitemap.as_str())])
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        check_status(response.status())
    }

    async fn submit_indexnow(&self, payload: &IndexNowPayload<'_>) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.settings.indexnow_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        check_status(response.status())
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), NotifyError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::HttpStatus(status.as_u16()))
    }
}

#[async_trait]
impl SearchNotifier for SearchPinger {
    /// Send every ping concurrently. Sitemap ping failures are logged only;
    /// an IndexNow failure is returned.
    async fn notify(&self, urls: &[String]) -> Result<(), NotifyError> {
        if !self.settings.enabled {
            tracing::debug!(count = urls.len(), "Search pings disabled, skipping");
            return Ok(());
        }

        let pings = join_all(
            self.settings
                .sitemap_ping_urls
                .iter()
                .map(|endpoint| async move { (endpoint, self.ping_sitemap(endpoint).await) }),
        );
        let indexnow = async {
            match self.indexnow_payload(urls) {
                Some(payload) => self.submit_indexnow(&payload).await,
                None => Ok(()),
            }
        };

        let (ping_results, indexnow_result) = tokio::join!(pings, indexnow);

        for (endpoint, result) in ping_results {
            if let Err(e) = result {
                tracing::warn!(endpoint = %endpoint, error = %e, "Sitemap ping failed");
            }
        }
        indexnow_result?;

        tracing::debug!(count = urls.len(), "Search engines pinged");
        Ok(())
    }
}
