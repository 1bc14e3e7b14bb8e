use futures::future::BoxFuture;
use tracing::debug;

use crate::collectors::{Collector, CollectorCore};
use crate::error::Error;

/// Simulated-source collector: discovers its metrics and instances from
/// the template and writes deterministically increasing values on each
/// tick. A `fail_at` list of tick numbers injects fetch failures, which
/// makes runtime failure handling testable end to end.
pub struct FakeCollector {
    core: CollectorCore,
    metrics: Vec<String>,
    fail_at: Vec<u64>,
    tick: u64,
}

impl FakeCollector {
    pub fn new(core: CollectorCore) -> Self {
        Self {
            core,
            metrics: Vec::new(),
            fail_at: Vec::new(),
            tick: 0,
        }
    }
}

impl Collector for FakeCollector {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CollectorCore {
        &mut self.core
    }

    fn init(&mut self) -> Result<(), Error> {
        self.core.init()?;

        let metrics = self.core.template().get_string_list("metrics");
        if metrics.is_empty() {
            return Err(Error::Init(format!(
                "collector [{}:{}]: no metrics declared",
                self.core.class(),
                self.core.object()
            )));
        }
        self.fail_at = self
            .core
            .template()
            .get_string_list("fail_at")
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        let declared = self.core.template().get_child("instances");

        let matrix = self
            .core
            .matrix_mut()
            .ok_or_else(|| Error::Init("primary matrix missing".to_string()))?;
        for key in &metrics {
            matrix
                .create_metric(key)
                .map_err(|e| Error::Init(e.to_string()))?;
        }
        match declared {
            Some(instances) => {
                for (key, labels) in instances.children() {
                    let instance = matrix
                        .new_instance(&key)
                        .map_err(|e| Error::Init(e.to_string()))?;
                    for (label, value) in labels.string_pairs() {
                        instance.set_label(&label, &value);
                    }
                }
            }
            None => {
                matrix
                    .new_instance("instance-0")
                    .map_err(|e| Error::Init(e.to_string()))?;
            }
        }

        self.metrics = metrics;
        debug!(
            collector = self.core.class(),
            object = self.core.object(),
            metrics = self.metrics.len(),
            "initialized"
        );
        Ok(())
    }

    fn poll_data<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            self.tick += 1;
            if self.fail_at.contains(&self.tick) {
                return Err(Error::Poll(format!(
                    "simulated fetch failure at tick {}",
                    self.tick
                )));
            }
            let tick = self.tick;
            let matrix = self
                .core
                .matrix_mut()
                .ok_or_else(|| Error::Poll("primary matrix missing".to_string()))?;
            let instances: Vec<String> = matrix.get_instances().map(|(k, _)| k.to_string()).collect();
            for (i, ikey) in instances.iter().enumerate() {
                for (j, mkey) in self.metrics.iter().enumerate() {
                    let value = tick * (i + j + 1) as u64;
                    matrix
                        .set_value(mkey, ikey, value as f64)
                        .map_err(|e| Error::Poll(e.to_string()))?;
                }
            }
            debug!(
                collector = self.core.class(),
                object = self.core.object(),
                tick,
                "collected"
            );
            Ok(())
        })
    }
}
