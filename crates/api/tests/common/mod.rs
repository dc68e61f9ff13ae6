#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use campos_core::service::PropertyService;
use campos_core::testing::{MemoryImageStore, MemoryPropertyStore, RecordingNotifier};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use campos_api::config::{ImageStoreConfig, ServerConfig};
use campos_api::routes;
use campos_api::state::AppState;

pub const SITE: &str = "https://campos.test";

const BOUNDARY: &str = "campos-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        frontend_origin: SITE.to_string(),
        ref_prefix: "BARR".to_string(),
        upload_timeout_secs: 5,
        max_upload_bytes: 1024 * 1024,
        image_store: ImageStoreConfig::Local {
            upload_dir: PathBuf::from("./uploads"),
            public_base_url: "http://localhost/uploads".to_string(),
        },
        indexnow_key: None,
        search_ping_enabled: false,
    }
}

/// The in-memory collaborators behind a test app, for inspection.
pub struct TestApp {
    pub router: Router,
    pub service: PropertyService,
    pub store: Arc<MemoryPropertyStore>,
    pub images: Arc<MemoryImageStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    /// A fresh handle to the router (each `oneshot` consumes one).
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Wait for detached search-engine notifications.
    pub async fn drain_notifications(&self) {
        self.service.notifications().drain().await;
    }
}

/// Build the full application router with all middleware layers over
/// in-memory collaborators.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryPropertyStore::default());
    let images = Arc::new(MemoryImageStore::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let service = PropertyService::new(
        store.clone(),
        images.clone(),
        notifier.clone(),
        config.service_config(),
    );

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::seo::router())
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(AppState {
            service: service.clone(),
            config: Arc::new(config),
        });

    TestApp {
        router,
        service,
        store,
        images,
        notifier,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_multipart(app: Router, method: Method, uri: &str, form: MultipartBody) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form.finish()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn image(self, filename: &str) -> Self {
        self.file("images", filename, b"\xFF\xD8\xFFimage")
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// The fields of a valid create request.
pub fn campo_form(title: &str) -> MultipartBody {
    MultipartBody::new()
        .text("title", title)
        .text("location", "San José, Entre Ríos")
        .text("measure", "120")
        .text("operationType", "Venta")
}
