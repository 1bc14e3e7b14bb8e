use std::sync::Arc;

use harvest_poller::config::Template;
use harvest_poller::exporters::{Exporter as _, ExporterCore, PrometheusExporter};
use harvest_poller::matrix::{ExportOptions, Matrix};
use harvest_poller::poller::options::Options;

fn fake_matrix() -> Matrix {
    let mut data = Matrix::new("fake", "disks");
    data.set_export_options(ExportOptions {
        instance_keys: vec!["disk".to_string()],
        ..Default::default()
    });
    data.new_metric_int64("bytes_read").unwrap();
    let instance = data.new_instance("disk-01").unwrap();
    instance.set_label("disk", "disk-01");
    data.set_value_int64("bytes_read", "disk-01", 42).unwrap();
    data
}

async fn serving_exporter() -> PrometheusExporter {
    let core = ExporterCore::new(
        "Prometheus",
        "prom-test",
        Arc::new(Options::default()),
        Template::parse_str("port: 0").unwrap(),
    );
    let mut exporter = PrometheusExporter::new(core);
    exporter.init().await.unwrap();
    exporter
}

#[tokio::test]
async fn test_metrics_endpoint_serves_rendered_cache() {
    let exporter = serving_exporter().await;
    exporter.export(&fake_matrix()).await.unwrap();
    let addr = exporter.local_addr().unwrap();

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("disks_bytes_read{disk=\"disk-01\"} 42"));
}

#[tokio::test]
async fn test_metrics_endpoint_empty_before_first_export() {
    let exporter = serving_exporter().await;
    let addr = exporter.local_addr().unwrap();

    let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let exporter = serving_exporter().await;
    let addr = exporter.local_addr().unwrap();

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["exporter"], "prom-test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_reexport_replaces_object_render() {
    let exporter = serving_exporter().await;
    let addr = exporter.local_addr().unwrap();

    exporter.export(&fake_matrix()).await.unwrap();

    let mut updated = fake_matrix();
    updated.set_value_int64("bytes_read", "disk-01", 43).unwrap();
    exporter.export(&updated).await.unwrap();

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // one line per object, latest render wins
    assert_eq!(body.matches("disks_bytes_read").count(), 1);
    assert!(body.contains("} 43"));
}
