use crate::GIT_COMMIT_HASH;
use axum::{
    http::{HeaderMap, HeaderValue, Method},
    response::IntoResponse,
};
use tracing::{debug, error};

/// Liveness probe, independent of authentication.
pub async fn ping(method: Method) -> impl IntoResponse {
    let body = if method == Method::GET { "OK" } else { "NOK" };
    (app_headers(), body)
}

fn app_headers() -> HeaderMap {
    let short_hash = if GIT_COMMIT_HASH.len() > 7 {
        &GIT_COMMIT_HASH[0..7]
    } else {
        ""
    };

    format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )
    .parse::<HeaderValue>()
    .map(|x_app_header_value| {
        debug!("X-App header: {:?}", x_app_header_value);

        let mut headers = HeaderMap::new();

        headers.insert("X-App", x_app_header_value);

        headers
    })
    .unwrap_or_else(|err| {
        error!("Failed to parse X-App header: {}", err);
        HeaderMap::new()
    })
}
