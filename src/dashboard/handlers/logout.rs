use crate::{auth::LogoutOutcome, dashboard::AppState};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

/// Always ends on the login form; the cookie is cleared only when a session was ended.
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let session = state.cookies().extract(&headers);

    match state.gate().logout(session).await {
        LogoutOutcome::SignedOut => {
            let mut response_headers = HeaderMap::new();
            match state.cookies().clear_session_cookie() {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build logout cookie: {err}"),
            }
            (response_headers, Redirect::temporary("/login")).into_response()
        }
        LogoutOutcome::Anonymous => Redirect::temporary("/login").into_response(),
    }
}
