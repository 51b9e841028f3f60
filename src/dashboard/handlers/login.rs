use super::{render_view, TITLE_LOGIN};
use crate::{
    auth::{LoginForm, LoginOutcome},
    dashboard::{render::VIEW_LOGIN, AppState, Page},
};
use axum::{
    extract::{Extension, Form},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn login_page(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let session = state.cookies().extract(&headers);
    let outcome = state.gate().login_page(session).await;
    respond(&state, outcome).await
}

// A body that does not parse is handled like an empty form.
#[instrument(skip_all)]
pub async fn login_submit(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    form: Option<Form<LoginForm>>,
) -> Response {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let session = state.cookies().extract(&headers);
    let config = state.config().snapshot();
    let outcome = state
        .gate()
        .login_submit(session, &form, config.credentials())
        .await;
    respond(&state, outcome).await
}

async fn respond(state: &AppState, outcome: LoginOutcome) -> Response {
    let mut response_headers = HeaderMap::new();

    match outcome {
        LoginOutcome::Redirect { session } => {
            if let Some(session) = session {
                if let Some(cookie) = state.session_cookie(&session).await {
                    response_headers.insert(SET_COOKIE, cookie);
                }
            }
            (response_headers, Redirect::temporary("/")).into_response()
        }
        LoginOutcome::Form(view) => {
            if let Some(session) = &view.new_session {
                if let Some(cookie) = state.session_cookie(session).await {
                    response_headers.insert(SET_COOKIE, cookie);
                }
            }
            let config = state.config().snapshot();
            let page = Page::new(TITLE_LOGIN, &config.app.logo, &config.app.contact)
                .with_csrf(&view.csrf)
                .with_errors(view.errors);
            (response_headers, render_view(state, VIEW_LOGIN, &page)).into_response()
        }
    }
}
