use axum::routing::get;
use axum::Router;

use crate::handlers::seo;
use crate::state::AppState;

/// Mount `robots.txt` and `sitemap.xml` at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
}
