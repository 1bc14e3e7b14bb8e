use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{AppInfo, Cache};

#[derive(Serialize, Debug)]
pub(super) struct Health {
    name: String,
    version: String,
    exporter: String,
}

#[instrument(skip(cache), fields(http.route = "/metrics"))]
pub(super) async fn metrics(Extension(cache): Extension<Cache>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    let cache = cache.read().await;
    let mut body = String::new();
    for lines in cache.values() {
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
    }
    debug!(objects = cache.len(), "served metrics");
    (StatusCode::OK, headers, body)
}

#[instrument(skip(info), fields(http.route = "/health"))]
pub(super) async fn health(Extension(info): Extension<AppInfo>) -> impl IntoResponse {
    Json(Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        exporter: info.name,
    })
}
