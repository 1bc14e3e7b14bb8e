use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::{Exporter, ExporterCore};
use crate::error::Error;
use crate::matrix::{Matrix, MetricKind};
use crate::status::{State, StatusCode};

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// InfluxDB v2 exporter: renders matrices to line protocol and writes
/// them to `/api/v2/write`. In debug mode the rendered lines are logged
/// instead of sent.
pub struct InfluxExporter {
    core: ExporterCore,
    endpoint: Option<Url>,
    token: Option<SecretString>,
    client: Option<Client>,
}

impl InfluxExporter {
    pub fn new(core: ExporterCore) -> Self {
        Self {
            core,
            endpoint: None,
            token: None,
            client: None,
        }
    }

    fn render(data: &Matrix) -> Vec<String> {
        let opts = data.export_options();
        let measurement = escape_measurement(data.object());
        let mut lines = Vec::new();
        for (ikey, instance) in data.get_instances() {
            if !instance.is_exportable() {
                continue;
            }
            let mut tags = Vec::new();
            for (key, value) in instance.labels() {
                if value.is_empty() {
                    continue;
                }
                if opts.include_all_labels || opts.instance_keys.iter().any(|k| k == key) {
                    tags.push(format!("{}={}", escape(key), escape(value)));
                }
            }
            let mut fields = Vec::new();
            for (mkey, metric) in data.get_metrics() {
                if !metric.is_exportable() {
                    continue;
                }
                if let Some(value) = data.get_value(mkey, ikey) {
                    let field = match metric.kind() {
                        MetricKind::Int64 => format!("{}={}i", escape(mkey), value as i64),
                        MetricKind::Float64 => format!("{}={}", escape(mkey), value),
                    };
                    fields.push(field);
                }
            }
            if fields.is_empty() {
                continue;
            }
            if tags.is_empty() {
                lines.push(format!("{} {}", measurement, fields.join(",")));
            } else {
                lines.push(format!("{},{} {}", measurement, tags.join(","), fields.join(",")));
            }
        }
        lines
    }
}

fn escape(text: &str) -> String {
    text.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn escape_measurement(text: &str) -> String {
    text.replace(',', "\\,").replace(' ', "\\ ")
}

impl Exporter for InfluxExporter {
    fn core(&self) -> &ExporterCore {
        &self.core
    }

    fn init<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let (endpoint, token) = {
                let name = self.core.name();
                let params = self.core.params();
                let missing =
                    |field: &str| Error::Init(format!("exporter [{name}]: missing [{field}]"));
                let addr = params.get_str("addr").ok_or_else(|| missing("addr"))?;
                let org = params.get_str("org").ok_or_else(|| missing("org"))?;
                let bucket = params.get_str("bucket").ok_or_else(|| missing("bucket"))?;
                let token = params.get_str("token").ok_or_else(|| missing("token"))?;

                let base = Url::parse(addr).map_err(|e| {
                    Error::Init(format!("exporter [{name}]: invalid addr [{addr}]: {e}"))
                })?;
                let mut endpoint = base.join("api/v2/write").map_err(|e| {
                    Error::Init(format!("exporter [{name}]: invalid addr [{addr}]: {e}"))
                })?;
                endpoint
                    .query_pairs_mut()
                    .append_pair("org", org)
                    .append_pair("bucket", bucket);
                (endpoint, token.to_string())
            };

            let client = Client::builder()
                .timeout(WRITE_TIMEOUT)
                .build()
                .map_err(|e| Error::Init(format!("exporter [{}]: {e}", self.core.name())))?;

            self.endpoint = Some(endpoint);
            self.token = Some(SecretString::from(token));
            self.client = Some(client);
            self.core.status().set_state(State::Initialized);
            debug!(exporter = self.core.name(), "initialized");
            Ok(())
        })
    }

    fn export<'a>(&'a self, data: &'a Matrix) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if !data.is_exportable() {
                return Ok(());
            }
            let lines = Self::render(data);
            if lines.is_empty() {
                return Ok(());
            }

            if self.core.options().debug {
                for line in &lines {
                    debug!(exporter = self.core.name(), %line, "rendered, not sent");
                }
                self.core.status().set(StatusCode::Up, "");
                return Ok(());
            }

            let (client, endpoint, token) = match (&self.client, &self.endpoint, &self.token) {
                (Some(client), Some(endpoint), Some(token)) => (client, endpoint, token),
                _ => {
                    return Err(Error::Export(format!(
                        "exporter [{}] not initialized",
                        self.core.name()
                    )));
                }
            };

            let result = client
                .post(endpoint.clone())
                .header("Authorization", format!("Token {}", token.expose_secret()))
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(lines.join("\n"))
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    self.core.status().set(StatusCode::Up, "");
                    Ok(())
                }
                Ok(response) => {
                    let message = format!("write rejected: {}", response.status());
                    self.core.status().set(StatusCode::Failed, message.clone());
                    Err(Error::Export(message))
                }
                Err(e) => {
                    let message = format!("write failed: {e}");
                    self.core.status().set(StatusCode::Failed, message.clone());
                    Err(Error::Export(message))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Template;
    use crate::matrix::ExportOptions;
    use crate::poller::options::Options;
    use std::sync::Arc;

    fn exporter(params: &str, debug: bool) -> InfluxExporter {
        let options = Options {
            debug,
            ..Default::default()
        };
        let core = ExporterCore::new(
            "Influx",
            "influx-test",
            Arc::new(options),
            Template::parse_str(params).unwrap(),
        );
        InfluxExporter::new(core)
    }

    fn fake_matrix() -> Matrix {
        let mut data = Matrix::new("fake", "disks");
        data.set_export_options(ExportOptions {
            instance_keys: vec!["disk".to_string()],
            ..Default::default()
        });
        data.new_metric_int64("bytes_read").unwrap();
        data.new_metric_float64("busy_ratio").unwrap();
        let instance = data.new_instance("disk-01").unwrap();
        instance.set_label("disk", "disk 01");
        instance.set_label("node", "n1");
        data.set_value_int64("bytes_read", "disk-01", 42).unwrap();
        data.set_value("busy_ratio", "disk-01", 0.5).unwrap();
        data
    }

    const PARAMS: &str = concat!(
        "addr: http://localhost:8086\n",
        "org: harvest\n",
        "bucket: harvest\n",
        "token: xxxxxxx\n",
    );

    #[tokio::test]
    async fn test_init_requires_all_params() {
        for missing in ["addr", "org", "bucket", "token"] {
            let params: String = PARAMS
                .lines()
                .filter(|l| !l.starts_with(missing))
                .map(|l| format!("{l}\n"))
                .collect();
            let mut exporter = exporter(&params, false);
            let err = exporter.init().await.unwrap_err();
            assert!(matches!(err, Error::Init(_)), "expected Init for {missing}");
        }
    }

    #[tokio::test]
    async fn test_init_rejects_bad_addr() {
        let mut exporter = exporter("addr: 'not a url'\norg: o\nbucket: b\ntoken: t\n", false);
        assert!(matches!(exporter.init().await, Err(Error::Init(_))));
    }

    #[tokio::test]
    async fn test_init_builds_write_endpoint() {
        let mut exporter = exporter(PARAMS, false);
        exporter.init().await.unwrap();
        let endpoint = exporter.endpoint.as_ref().unwrap();
        assert_eq!(endpoint.path(), "/api/v2/write");
        assert!(endpoint.query().unwrap().contains("bucket=harvest"));
    }

    #[test]
    fn test_render_line_protocol() {
        let lines = InfluxExporter::render(&fake_matrix());
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        // instance-key label only, escaped; int field carries the i suffix
        assert!(line.starts_with("disks,disk=disk\\ 01 "));
        assert!(line.contains("bytes_read=42i"));
        assert!(line.contains("busy_ratio=0.5"));
        assert!(!line.contains("node=n1"));
    }

    #[test]
    fn test_render_include_all_labels() {
        let mut data = fake_matrix();
        let mut opts = data.export_options().clone();
        opts.include_all_labels = true;
        data.set_export_options(opts);
        let lines = InfluxExporter::render(&data);
        assert!(lines[0].contains("node=n1"));
    }

    #[tokio::test]
    async fn test_debug_export_renders_only() {
        // debug mode must not touch the network and reports up
        let mut exporter = exporter(PARAMS, true);
        exporter.init().await.unwrap();
        exporter.export(&fake_matrix()).await.unwrap();
        assert_eq!(exporter.core().status().get().0, 1);
    }
}
