use std::sync::Arc;

use campos_core::service::PropertyService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Property reconciliation service with its store, image store and
    /// search notifier.
    pub service: PropertyService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
