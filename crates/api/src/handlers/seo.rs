//! `robots.txt` and `sitemap.xml`.

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;

use crate::error::AppResult;
use crate::state::AppState;

/// Both documents may be cached by clients and proxies for ten minutes.
const CACHE_POLICY: &str = "public, max-age=600";

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, CACHE_POLICY),
        ],
        state.service.robots_txt(),
    )
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let xml = state.service.sitemap_xml().await?;
    Ok((
        [
            (CONTENT_TYPE, "application/xml; charset=utf-8"),
            (CACHE_CONTROL, CACHE_POLICY),
        ],
        xml,
    ))
}
