//! Route definitions for the `/properties` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::property;
use crate::state::AppState;

/// Routes mounted at `/properties`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id_or_slug}     -> get_by_id_or_slug
/// PUT    /{id_or_slug}     -> update (numeric id)
/// DELETE /{id_or_slug}     -> delete (numeric id)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(property::list).post(property::create))
        .route(
            "/{id_or_slug}",
            get(property::get_by_id_or_slug)
                .put(property::update)
                .delete(property::delete),
        )
}
