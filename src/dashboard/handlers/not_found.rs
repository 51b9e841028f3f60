use super::{render_view, TITLE_NOT_FOUND};
use crate::dashboard::{render::VIEW_NOT_FOUND, AppState, Page};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[instrument(skip_all)]
pub async fn not_found(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let session = state.cookies().extract(&headers);
    let user = state.gate().current_user(session.as_ref()).await;
    let config = state.config().snapshot();
    let page = Page::new(TITLE_NOT_FOUND, &config.app.logo, &config.app.contact)
        .with_user(user.as_deref());

    let mut response = render_view(&state, VIEW_NOT_FOUND, &page);
    if response.status().is_success() {
        *response.status_mut() = StatusCode::NOT_FOUND;
    }
    response
}

/// Anything the router does not know.
pub async fn fallback(uri: axum::http::Uri) -> impl IntoResponse {
    debug!(path = uri.path(), "Unknown path");
    Redirect::permanent("/not-found")
}
