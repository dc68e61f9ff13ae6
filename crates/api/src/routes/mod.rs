pub mod health;
pub mod property;
pub mod seo;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /properties                      list, create
/// /properties/{id_or_slug}         get
/// /properties/{id}                 update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/properties", property::router())
}
