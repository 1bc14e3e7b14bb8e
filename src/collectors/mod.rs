//! Collector contract, shared collector state and the compile-time
//! collector registry.
//!
//! A concrete collector implements fetch and decode (`poll_data`); the
//! shared driver on `CollectorType` adds the tick orchestration every
//! collector gets for free: due-time bookkeeping, the plugin chain and
//! the fan-out to linked exporters. One worker task per collector calls
//! `run`, so ticks within a collector are strictly sequential.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Template;
use crate::error::Error;
use crate::exporters::{Exporter as _, ExporterType};
use crate::matrix::{ExportOptions, Matrix};
use crate::plugins::{self, Plugin as _, PluginType};
use crate::poller::options::Options;
use crate::schedule::Schedule;
use crate::status::{State, Status, StatusCode};

#[macro_use]
mod register_macro;

pub type CollectorFactory = fn(CollectorCore) -> CollectorType;

pub trait Collector: Send {
    fn core(&self) -> &CollectorCore;

    fn core_mut(&mut self) -> &mut CollectorCore;

    /// Parse the merged template and build the primary matrix. Expected
    /// to run `CollectorCore::init` first.
    fn init(&mut self) -> Result<(), Error>;

    /// One fetch and decode pass updating the primary matrix.
    fn poll_data<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>>;
}

/// Shared state every concrete collector embeds: identity, merged
/// template, cadence, matrices, plugin chain and exporter links.
pub struct CollectorCore {
    class: String,
    object: String,
    options: Arc<Options>,
    template: Template,
    schedule: Schedule,
    matrices: IndexMap<String, Matrix>,
    plugins: Vec<PluginType>,
    exporters: Vec<Arc<ExporterType>>,
    status: Arc<Status>,
}

impl CollectorCore {
    pub fn new(class: &str, object: &str, options: Arc<Options>, template: Template) -> Self {
        let mut matrices = IndexMap::new();
        matrices.insert(object.to_string(), Matrix::new(class, object));
        Self {
            class: class.to_string(),
            object: object.to_string(),
            options,
            template,
            schedule: Schedule::new(),
            matrices,
            plugins: Vec::new(),
            exporters: Vec::new(),
            status: Arc::new(Status::new()),
        }
    }

    /// Shared init: polling cadence, export options and the plugin chain
    /// from the merged template.
    pub fn init(&mut self) -> Result<(), Error> {
        let interval = self.template.get_str("schedule").unwrap_or("60s").to_string();
        self.schedule
            .add_task("data", &interval)
            .map_err(|e| Error::Init(e.to_string()))?;

        if let Some(value) = self.template.get("export_options") {
            let opts: ExportOptions = serde_yaml::from_value(value.clone())
                .map_err(|e| Error::Init(format!("export_options: {e}")))?;
            if let Some(matrix) = self.matrices.get_mut(self.object.as_str()) {
                matrix.set_export_options(opts);
            }
        }

        for class in self.template.get_string_list("plugins") {
            let plugin = plugins::load(&class, &self.object)?;
            self.plugins.push(plugin);
        }

        self.status.set_state(State::Initialized);
        Ok(())
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn status(&self) -> Arc<Status> {
        Arc::clone(&self.status)
    }

    pub fn matrix(&self) -> Option<&Matrix> {
        self.matrices.get(self.object.as_str())
    }

    pub fn matrix_mut(&mut self) -> Option<&mut Matrix> {
        self.matrices.get_mut(self.object.as_str())
    }

    /// Exporter names declared in the merged template.
    pub fn wanted_exporters(&self) -> Vec<String> {
        self.template.get_string_list("exporters")
    }

    /// Appends an exporter handle; linking the same exporter twice is a
    /// no-op.
    pub fn link_exporter(&mut self, exporter: Arc<ExporterType>) {
        if self.exporters.iter().any(|e| e.name() == exporter.name()) {
            return;
        }
        self.exporters.push(exporter);
    }

    pub fn exporters(&self) -> &[Arc<ExporterType>] {
        &self.exporters
    }
}

register_collectors! {
    fake => FakeCollector,
}

impl CollectorType {
    pub fn class(&self) -> &str {
        self.core().class()
    }

    pub fn object(&self) -> &str {
        self.core().object()
    }

    pub fn status(&self) -> Arc<Status> {
        self.core().status()
    }

    pub fn get_status(&self) -> (u8, &'static str, String) {
        self.core().status.get()
    }

    pub fn wanted_exporters(&self) -> Vec<String> {
        self.core().wanted_exporters()
    }

    pub fn link_exporter(&mut self, exporter: Arc<ExporterType>) {
        self.core_mut().link_exporter(exporter);
    }

    /// One tick: fetch and decode, run the plugin chain, then hand every
    /// emitted matrix to every linked exporter. A poll or plugin failure
    /// aborts the tick before dispatch; an export failure is logged and
    /// the remaining dispatch continues.
    pub async fn poll(&mut self) -> Result<(), Error> {
        self.poll_data().await?;

        let CollectorCore {
            class,
            object,
            matrices,
            plugins,
            exporters,
            ..
        } = self.core_mut();

        let mut extra: Vec<Matrix> = Vec::new();
        for plugin in plugins.iter_mut() {
            let (more, metadata) = plugin.run(matrices).map_err(|e| match e {
                Error::Plugin(_) => e,
                other => Error::Plugin(other.to_string()),
            })?;
            if let Some(meta) = metadata {
                debug!(
                    collector = class.as_str(),
                    object = object.as_str(),
                    plugin = plugin.name(),
                    instances = meta.instances,
                    metrics = meta.metrics,
                    "plugin done"
                );
            }
            extra.extend(more);
        }

        for exporter in exporters.iter() {
            for data in matrices.values().chain(extra.iter()) {
                if let Err(e) = exporter.export(data).await {
                    warn!(
                        collector = class.as_str(),
                        object = object.as_str(),
                        exporter = exporter.name(),
                        error = %e,
                        "export failed"
                    );
                }
            }
        }
        Ok(())
    }

    /// Self-clocked worker loop. Tick failures update status and the
    /// next tick still runs on schedule; only the stop token ends the
    /// loop, at a sleep boundary.
    pub async fn run(mut self, token: CancellationToken) {
        let status = self.core().status();
        let name = format!("{}:{}", self.class(), self.object());
        status.set_state(State::Running);
        info!(collector = %name, "started");

        loop {
            if token.is_cancelled() {
                break;
            }
            let due = self
                .core_mut()
                .schedule
                .get_task("data")
                .is_some_and(|t| t.is_due());
            if due {
                if let Some(task) = self.core_mut().schedule.get_task("data") {
                    task.start();
                }
                match self.poll().await {
                    Ok(()) => status.set(StatusCode::Up, ""),
                    Err(e) => {
                        warn!(collector = %name, error = %e, "tick failed");
                        status.set(StatusCode::Failed, e.to_string());
                    }
                }
                if let Some(task) = self.core_mut().schedule.get_task("data") {
                    task.stop();
                }
            }
            tokio::select! {
                () = token.cancelled() => break,
                () = self.core().schedule.sleep() => {}
            }
        }

        status.set(StatusCode::Standby, "stopped");
        status.set_state(State::Stopped);
        info!(collector = %name, "stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_are_keyed_by_lowercase_class() {
        let factories = all_factories();
        assert!(factories.contains_key("fake"));
        assert!(!factories.contains_key("Fake"));
    }

    #[test]
    fn test_collector_names_match_registry() {
        let factories = all_factories();
        for name in COLLECTOR_NAMES {
            assert!(factories.contains_key(name));
        }
    }

    #[test]
    fn test_link_exporter_is_idempotent() {
        use crate::exporters::{ExporterCore, StubExporter};

        let options = Arc::new(Options::default());
        let mut core = CollectorCore::new("Fake", "disks", Arc::clone(&options), Template::new());
        let exporter = Arc::new(ExporterType::StubExporter(StubExporter::new(
            ExporterCore::new("Stub", "stub1", options, Template::new()),
        )));
        core.link_exporter(Arc::clone(&exporter));
        core.link_exporter(exporter);
        assert_eq!(core.exporters().len(), 1);
    }

    #[test]
    fn test_core_init_reads_cadence_and_plugins() {
        let template = Template::parse_str(concat!(
            "schedule: 10s\n",
            "plugins: [FixedThroughput]\n",
            "export_options:\n",
            "  instance_keys: [disk]\n",
        ))
        .unwrap();
        let mut core = CollectorCore::new("Fake", "disks", Arc::new(Options::default()), template);
        core.init().unwrap();
        assert_eq!(core.plugins.len(), 1);
        assert_eq!(
            core.matrix().unwrap().export_options().instance_keys,
            vec!["disk"]
        );
        assert_eq!(core.status().state(), State::Initialized);
    }

    #[test]
    fn test_core_init_rejects_bad_cadence() {
        let template = Template::parse_str("schedule: whenever").unwrap();
        let mut core = CollectorCore::new("Fake", "disks", Arc::new(Options::default()), template);
        assert!(matches!(core.init(), Err(Error::Init(_))));
    }

    #[test]
    fn test_core_init_unknown_plugin_is_dynamic_load() {
        let template = Template::parse_str("plugins: [Nope]").unwrap();
        let mut core = CollectorCore::new("Fake", "disks", Arc::new(Options::default()), template);
        assert!(matches!(core.init(), Err(Error::DynamicLoad(_))));
    }
}
