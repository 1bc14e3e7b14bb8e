use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Extension,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug, debug_span, error, info};
use ulid::Ulid;

use super::{Exporter, ExporterCore};
use crate::error::Error;
use crate::matrix::Matrix;
use crate::status::{State, StatusCode};

mod handlers;

type Cache = Arc<RwLock<IndexMap<String, Vec<String>>>>;

#[derive(Clone, Debug)]
struct AppInfo {
    name: String,
}

/// Pull exporter: `export` renders matrices into a shared cache and an
/// axum server exposes the concatenation on `/metrics`. The listen port
/// comes from the exporter params or, when absent, the poller-level
/// `prometheus_port`.
pub struct PrometheusExporter {
    core: ExporterCore,
    cache: Cache,
    local_addr: Option<SocketAddr>,
}

impl PrometheusExporter {
    pub fn new(core: ExporterCore) -> Self {
        Self {
            core,
            cache: Arc::new(RwLock::new(IndexMap::new())),
            local_addr: None,
        }
    }

    /// The bound address once `init` has run; port 0 in the params picks
    /// an ephemeral port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn render(data: &Matrix) -> Vec<String> {
        let opts = data.export_options();
        let object = sanitize(data.object());
        let mut lines = Vec::new();
        for (ikey, instance) in data.get_instances() {
            if !instance.is_exportable() {
                continue;
            }
            let mut labels = Vec::new();
            for (key, value) in instance.labels() {
                if opts.include_all_labels || opts.instance_keys.iter().any(|k| k == key) {
                    labels.push(format!("{}=\"{}\"", sanitize(key), value));
                }
            }
            for (mkey, metric) in data.get_metrics() {
                if !metric.is_exportable() {
                    continue;
                }
                if let Some(value) = data.get_value(mkey, ikey) {
                    let name = format!("{}_{}", object, sanitize(mkey));
                    if labels.is_empty() {
                        lines.push(format!("{name} {value}"));
                    } else {
                        lines.push(format!("{name}{{{}}} {value}", labels.join(",")));
                    }
                }
            }
        }
        lines
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn router(cache: Cache, info: AppInfo) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(cache))
                .layer(Extension(info)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, request_id)
}

impl Exporter for PrometheusExporter {
    fn core(&self) -> &ExporterCore {
        &self.core
    }

    fn init<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let name = self.core.name().to_string();
            let port = self
                .core
                .params()
                .get_int("port")
                .and_then(|p| u16::try_from(p).ok())
                .or(self.core.options().prometheus_port)
                .ok_or_else(|| Error::Init(format!("exporter [{name}]: no port configured")))?;
            let addr = self
                .core
                .params()
                .get_str("addr")
                .unwrap_or("0.0.0.0")
                .to_string();

            let listener = TcpListener::bind((addr.as_str(), port))
                .await
                .map_err(|e| Error::Init(format!("exporter [{name}]: bind {addr}:{port}: {e}")))?;
            self.local_addr = listener.local_addr().ok();

            let app = router(
                Arc::clone(&self.cache),
                AppInfo { name: name.clone() },
            );
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!(exporter = %name, "metrics server: {e}");
                }
            });

            if let Some(local) = self.local_addr {
                info!(exporter = self.core.name(), addr = %local, "serving metrics");
            }
            self.core.status().set_state(State::Initialized);
            Ok(())
        })
    }

    fn export<'a>(&'a self, data: &'a Matrix) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if !data.is_exportable() {
                return Ok(());
            }
            let key = format!("{}.{}", data.collector(), data.object());
            let lines = Self::render(data);
            debug!(exporter = self.core.name(), %key, lines = lines.len(), "cached render");
            self.cache.write().await.insert(key, lines);
            self.core.status().set(StatusCode::Up, "");
            Ok(())
        })
    }
}
