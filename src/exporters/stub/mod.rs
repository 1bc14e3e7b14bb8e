use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::BoxFuture;
use serde_json::json;
use tracing::debug;

use super::{Exporter, ExporterCore};
use crate::error::Error;
use crate::matrix::Matrix;
use crate::status::{State, StatusCode};

// keep the rendered backlog bounded; tests only ever look at recent lines
const MAX_LINES: usize = 256;

/// Sink-less exporter: renders exportable cells to JSON lines, logs them
/// at debug and keeps counters. The default target for tests and smoke
/// setups without a real backend.
pub struct StubExporter {
    core: ExporterCore,
    state: Arc<Mutex<StubState>>,
}

#[derive(Debug, Default)]
pub struct StubState {
    /// Export calls received, gated or not.
    pub exports: u64,
    /// Instances actually rendered.
    pub instances: u64,
    /// Most recent rendered lines.
    pub lines: Vec<String>,
}

impl StubExporter {
    pub fn new(core: ExporterCore) -> Self {
        Self {
            core,
            state: Arc::new(Mutex::new(StubState::default())),
        }
    }

    /// Shared handle to the counters, inspectable while the exporter is
    /// linked and running.
    pub fn state(&self) -> Arc<Mutex<StubState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn render(data: &Matrix) -> Vec<String> {
        let mut lines = Vec::new();
        for (ikey, instance) in data.get_instances() {
            if !instance.is_exportable() {
                continue;
            }
            let mut values = serde_json::Map::new();
            for (mkey, metric) in data.get_metrics() {
                if !metric.is_exportable() {
                    continue;
                }
                if let Some(value) = data.get_value(mkey, ikey) {
                    values.insert(mkey.to_string(), json!(value));
                }
            }
            if values.is_empty() {
                continue;
            }
            let line = json!({
                "collector": data.collector(),
                "object": data.object(),
                "instance": ikey,
                "labels": instance.labels(),
                "values": values,
            });
            lines.push(line.to_string());
        }
        lines
    }
}

impl Exporter for StubExporter {
    fn core(&self) -> &ExporterCore {
        &self.core
    }

    fn init<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            self.core.status().set_state(State::Initialized);
            debug!(exporter = self.core.name(), "initialized");
            Ok(())
        })
    }

    fn export<'a>(&'a self, data: &'a Matrix) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let lines = if data.is_exportable() {
                Self::render(data)
            } else {
                Vec::new()
            };
            for line in &lines {
                debug!(exporter = self.core.name(), %line, "export");
            }
            let mut state = self.lock();
            state.exports += 1;
            state.instances += lines.len() as u64;
            state.lines.extend(lines);
            let overflow = state.lines.len().saturating_sub(MAX_LINES);
            if overflow > 0 {
                state.lines.drain(..overflow);
            }
            drop(state);
            self.core.status().set(StatusCode::Up, "");
            Ok(())
        })
    }
}
