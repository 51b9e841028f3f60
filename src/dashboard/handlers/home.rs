use super::{render_view, TITLE_DASHBOARD};
use crate::dashboard::{render::VIEW_DASHBOARD, AppState, Page};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Link groups for the signed-in operator; everyone else goes to the login form.
#[instrument(skip_all)]
pub async fn home(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let session = state.cookies().extract(&headers);
    let Some(user) = state.gate().current_user(session.as_ref()).await else {
        debug!("Anonymous request, redirecting to login");
        return Redirect::temporary("/login").into_response();
    };

    let config = state.config().snapshot();
    let page = Page::new(TITLE_DASHBOARD, &config.app.logo, &config.app.contact)
        .with_groups(&config.groups)
        .with_user(Some(user.as_str()));

    render_view(&state, VIEW_DASHBOARD, &page)
}
