use indexmap::IndexMap;
use tracing::warn;

use super::{Plugin, PluginMetadata};
use crate::error::Error;
use crate::matrix::Matrix;

const METRICS: &[&str] = &[
    "max_throughput_iops",
    "max_throughput_mbps",
    "min_throughput_iops",
    "min_throughput_mbps",
];

/// Normalizes fixed throughput policies: splits the `max_xput` and
/// `min_xput` labels into per-unit metrics and keeps only user defined
/// policy classes exportable, so every source publishes the same shape.
#[derive(Debug)]
pub struct FixedThroughput {
    object: String,
}

impl FixedThroughput {
    pub fn new(object: &str) -> Self {
        Self {
            object: object.to_string(),
        }
    }
}

impl Plugin for FixedThroughput {
    fn name(&self) -> &'static str {
        "FixedThroughput"
    }

    fn run(
        &mut self,
        data: &mut IndexMap<String, Matrix>,
    ) -> Result<(Vec<Matrix>, Option<PluginMetadata>), Error> {
        let data = data.get_mut(&self.object).ok_or_else(|| {
            Error::Plugin(format!("object [{}] missing from plugin input", self.object))
        })?;

        for key in METRICS {
            data.create_metric(key)
                .map_err(|e| Error::Plugin(e.to_string()))?;
        }

        let keys: Vec<String> = data
            .get_instances()
            .filter(|(_, instance)| instance.is_exportable())
            .map(|(key, _)| key.to_string())
            .collect();

        let mut instances = 0;
        for key in &keys {
            let class = data
                .get_instance(key)
                .and_then(|i| i.get_label("class").map(str::to_string));
            if class.as_deref() != Some("user_defined") {
                if let Some(instance) = data.get_instance_mut(key) {
                    instance.set_exportable(false);
                }
                continue;
            }
            set_throughput(data, key, "max_xput", "max_throughput_iops", "max_throughput_mbps");
            set_throughput(data, key, "min_xput", "min_throughput_iops", "min_throughput_mbps");
            instances += 1;
        }

        Ok((
            Vec::new(),
            Some(PluginMetadata {
                instances,
                metrics: METRICS.len() as u64,
            }),
        ))
    }
}

/// Splits a throughput label like `100iops` or `250mb/s` into the
/// matching per-unit metric. An absent or empty label is skipped; an
/// unexpected unit or number is logged and skipped.
fn set_throughput(data: &mut Matrix, instance: &str, label: &str, iops: &str, mbps: &str) {
    let Some(raw) = data
        .get_instance(instance)
        .and_then(|i| i.get_label(label).map(str::to_string))
    else {
        return;
    };
    if raw.is_empty() {
        return;
    }
    let value = raw.to_lowercase();
    let (metric, number) = if let Some(n) = value.strip_suffix("iops") {
        (iops, n)
    } else if let Some(n) = value.strip_suffix("mb/s") {
        (mbps, n)
    } else {
        warn!(instance, label, value = %raw, "unexpected throughput unit");
        return;
    };
    match number.trim().parse::<f64>() {
        Ok(parsed) => {
            if let Err(e) = data.set_value(metric, instance, parsed) {
                warn!(instance, metric, error = %e, "setting throughput value");
            }
        }
        Err(e) => warn!(instance, label, value = %raw, error = %e, "parsing throughput"),
    }
}
