use std::path::PathBuf;
use std::time::Duration;

use campos_core::service::ServiceConfig;
use campos_indexing::PingSettings;
use campos_media::S3Settings;

/// Dev frontend origin, always allowed by CORS.
const DEV_FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Where uploaded property images are kept.
#[derive(Debug, Clone)]
pub enum ImageStoreConfig {
    /// Files under `upload_dir`, served by this server at `/uploads`.
    Local {
        upload_dir: PathBuf,
        public_base_url: String,
    },
    /// Objects in an S3-compatible bucket.
    S3(S3Settings),
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for pending search-engine notifications on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Public site origin used in canonical URLs, the sitemap and robots.txt.
    pub frontend_origin: String,
    /// Prefix of generated property refs (default: `BARR`).
    pub ref_prefix: String,
    /// Bound on the uploads of one request, in seconds (default: `60`).
    pub upload_timeout_secs: u64,
    /// Maximum request body size for property writes (default: 100 MiB).
    pub max_upload_bytes: usize,
    pub image_store: ImageStoreConfig,
    pub indexnow_key: Option<String>,
    /// Send sitemap pings and IndexNow submissions (default: `false`).
    pub search_ping_enabled: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                              |
    /// |-------------------------|--------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                            |
    /// | `PORT`                  | `3000`                               |
    /// | `FRONTEND_ORIGIN`       | `http://localhost:5173`              |
    /// | `FRONTEND_ORIGIN_WWW`   | unset                                |
    /// | `CORS_ORIGINS`          | frontend origins + dev origin        |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                 |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                 |
    /// | `REF_PREFIX`            | `BARR`                               |
    /// | `UPLOAD_TIMEOUT_SECS`   | `60`                                 |
    /// | `MAX_UPLOAD_BYTES`      | `104857600`                          |
    /// | `IMAGE_STORE`           | `local` (`local` or `s3`)            |
    /// | `UPLOAD_DIR`            | `./uploads`                          |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:<PORT>/uploads`    |
    /// | `S3_BUCKET`             | required when `IMAGE_STORE=s3`       |
    /// | `S3_REGION`             | `us-east-1`                          |
    /// | `S3_ENDPOINT`           | unset                                |
    /// | `S3_PUBLIC_URL`         | unset                                |
    /// | `INDEXNOW_KEY`          | unset                                |
    /// | `SEARCH_PING_ENABLED`   | `false`                              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let frontend_origin =
            std::env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| DEV_FRONTEND_ORIGIN.into());

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(raw) => split_origins(&raw),
            Err(_) => default_cors_origins(
                &frontend_origin,
                std::env::var("FRONTEND_ORIGIN_WWW").ok().as_deref(),
            ),
        };

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let ref_prefix = std::env::var("REF_PREFIX").unwrap_or_else(|_| "BARR".into());

        let upload_timeout_secs: u64 = std::env::var("UPLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("UPLOAD_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "104857600".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let image_store = match std::env::var("IMAGE_STORE").as_deref() {
            Ok("s3") => ImageStoreConfig::S3(S3Settings {
                bucket: std::env::var("S3_BUCKET")
                    .expect("S3_BUCKET must be set when IMAGE_STORE=s3"),
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
                public_base_url: std::env::var("S3_PUBLIC_URL").ok(),
            }),
            Ok("local") | Err(_) => ImageStoreConfig::Local {
                upload_dir: std::env::var("UPLOAD_DIR")
                    .unwrap_or_else(|_| "./uploads".into())
                    .into(),
                public_base_url: std::env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{port}/uploads")),
            },
            Ok(other) => panic!("IMAGE_STORE must be 'local' or 's3', got '{other}'"),
        };

        let indexnow_key = std::env::var("INDEXNOW_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let search_ping_enabled: bool = std::env::var("SEARCH_PING_ENABLED")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("SEARCH_PING_ENABLED must be 'true' or 'false'");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            frontend_origin,
            ref_prefix,
            upload_timeout_secs,
            max_upload_bytes,
            image_store,
            indexnow_key,
            search_ping_enabled,
        }
    }

    /// Tunables for the property service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            site_base_url: self.frontend_origin.clone(),
            ref_prefix: self.ref_prefix.clone(),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            ..ServiceConfig::default()
        }
    }

    /// Search-engine endpoints and credentials.
    pub fn ping_settings(&self) -> PingSettings {
        PingSettings::new(
            &self.frontend_origin,
            self.indexnow_key.clone(),
            self.search_ping_enabled,
        )
    }

    /// Directory served at `/uploads`, when images are stored locally.
    pub fn local_upload_dir(&self) -> Option<&PathBuf> {
        match &self.image_store {
            ImageStoreConfig::Local { upload_dir, .. } => Some(upload_dir),
            ImageStoreConfig::S3(_) => None,
        }
    }
}

/// Parse a comma-separated origin list, dropping blanks.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The frontend origin, its optional `www` variant and the dev origin,
/// without duplicates.
fn default_cors_origins(frontend: &str, frontend_www: Option<&str>) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in [Some(frontend), frontend_www, Some(DEV_FRONTEND_ORIGIN)]
        .into_iter()
        .flatten()
    {
        let origin = origin.trim().trim_end_matches('/');
        if !origin.is_empty() && !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}
