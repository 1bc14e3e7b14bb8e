//! Process-level supervisor: boots collectors and exporters from config,
//! wires the many-to-many collector to exporter graph, runs one worker
//! per collector plus a self-monitor, and handles signals and shutdown.
//!
//! Ownership: the supervisor owns both sides of the graph. Collectors
//! receive shared exporter handles whose lifetime outlives every worker;
//! the exporter registry is written only during boot and read-only
//! afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::collectors::{self, Collector as _, CollectorCore, CollectorType};
use crate::config::{self, CONFIG_FILE, Template};
use crate::error::Error;
use crate::exporters::{self, Exporter as _, ExporterCore, ExporterType};
use crate::schedule::Schedule;
use crate::status::{Status, StatusCode};

pub mod options;
mod signals;

use options::Options;

/// Status handle the self-monitor keeps after a collector moves into its
/// worker task.
struct CollectorHandle {
    name: String,
    status: Arc<Status>,
}

pub struct Poller {
    name: String,
    options: Arc<Options>,
    pid: u32,
    pid_file: Option<PathBuf>,
    schedule: Schedule,
    collectors: Vec<CollectorType>,
    exporters: Vec<Arc<ExporterType>>,
    params: Template,
    exporter_params: Template,
    token: CancellationToken,
    stopped: AtomicBool,
}

impl Poller {
    pub fn new(options: Options) -> Self {
        let name = options.poller.clone();
        Self {
            name,
            options: Arc::new(options),
            pid: std::process::id(),
            pid_file: None,
            schedule: Schedule::new(),
            collectors: Vec::new(),
            exporters: Vec::new(),
            params: Template::new(),
            exporter_params: Template::new(),
            token: CancellationToken::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// The stop token; cancelling it shuts the poller down cooperatively.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn collectors(&self) -> &[CollectorType] {
        &self.collectors
    }

    pub fn exporters(&self) -> &[Arc<ExporterType>] {
        &self.exporters
    }

    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    /// Boot sequence, strict order. Component-level failures (a collector
    /// class, a subcollector, an exporter) are logged and skipped; config
    /// failures and an empty collector set abort.
    pub async fn init(&mut self) -> Result<(), Error> {
        tokio::spawn(signals::handle_signals(self.token.clone()));
        debug!(poller = %self.name, "signal handler installed");

        self.register_pid();

        if self.options.daemon {
            info!(poller = %self.name, pid = self.pid, "starting as daemon");
        } else {
            info!(poller = %self.name, pid = self.pid, "starting in foreground");
        }
        if self.options.debug {
            info!(poller = %self.name, options = %self.options, "debug mode, nothing will be shipped");
            self.log_debug_info();
        }

        self.params = config::get_poller(&self.options.conf_path, CONFIG_FILE, &self.name)?;

        // the port moved from exporter params to the poller level
        if let Some(port) = self.params.get_int("prometheus_port") {
            Arc::make_mut(&mut self.options).prometheus_port = u16::try_from(port).ok();
        }

        match config::get_exporters(&self.options.conf_path, CONFIG_FILE) {
            Ok(params) => self.exporter_params = params,
            Err(e) => warn!(poller = %self.name, "reading exporters from config: {e}"),
        }

        let classes = self.params.get_string_list("collectors");
        if classes.is_empty() {
            warn!(poller = %self.name, "no collectors defined for poller");
            return Err(Error::NoCollector);
        }
        for class in &classes {
            if let Err(e) = self.load_collector(class).await {
                error!(poller = %self.name, collector = %class, "initializing collector: {e}");
            }
        }
        if self.collectors.is_empty() {
            warn!(poller = %self.name, "no collectors initialized, stopping");
            return Err(Error::NoCollector);
        }
        debug!(poller = %self.name, "initialized {} collectors", self.collectors.len());

        if self.exporters.is_empty() {
            warn!(poller = %self.name, "no exporters initialized, continuing without exporters");
        } else {
            debug!(poller = %self.name, "initialized {} exporters", self.exporters.len());
        }

        self.schedule.add_task("poller", "60s")?;

        info!(poller = %self.name, "poller start-up complete");
        Ok(())
    }

    /// Resolves a collector class through the registry, merges its
    /// template with the poller subtree and initializes one subcollector
    /// per declared object. A subcollector that fails to init is skipped.
    async fn load_collector(&mut self, class: &str) -> Result<(), Error> {
        let factory = collectors::all_factories()
            .get(class.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| {
                Error::DynamicLoad(format!(
                    "unknown collector class [{class}], known classes: {:?}",
                    collectors::COLLECTOR_NAMES
                ))
            })?;

        let mut template = config::import_template(&self.options.conf_path, class)?;
        template.union(&self.params);

        let objects = match template.get_str("object") {
            Some(object) => vec![object.to_string()],
            None => template.child_names("objects"),
        };
        if objects.is_empty() {
            return Err(Error::Template(format!(
                "collector [{class}]: no object or objects declared"
            )));
        }

        let mut initialized: Vec<CollectorType> = Vec::new();
        for object in &objects {
            let core =
                CollectorCore::new(class, object, Arc::clone(&self.options), template.clone());
            let mut collector = factory(core);
            match collector.init() {
                Ok(()) => {
                    debug!(poller = %self.name, "initialized subcollector [{class}:{object}]");
                    initialized.push(collector);
                }
                Err(e) => {
                    error!(poller = %self.name, "initializing subcollector [{class}:{object}]: {e}");
                }
            }
        }

        for collector in &mut initialized {
            for name in collector.wanted_exporters() {
                match self.load_exporter(&name).await {
                    Some(exporter) => {
                        collector.link_exporter(exporter);
                        debug!(
                            poller = %self.name,
                            "linked [{}:{}] to exporter [{name}]",
                            collector.class(),
                            collector.object()
                        );
                    }
                    None => warn!(
                        poller = %self.name,
                        "exporter [{name}] requested by [{}:{}] not available",
                        collector.class(),
                        collector.object()
                    ),
                }
            }
        }

        self.collectors.extend(initialized);
        Ok(())
    }

    /// Instantiates an exporter once per name; later requests get the
    /// cached handle. Any failure is logged and reported as unavailable.
    async fn load_exporter(&mut self, name: &str) -> Option<Arc<ExporterType>> {
        if let Some(existing) = self.exporters.iter().find(|e| e.name() == name) {
            return Some(Arc::clone(existing));
        }

        let Some(params) = self.exporter_params.get_child(name) else {
            warn!(poller = %self.name, "exporter [{name}] not defined in config");
            return None;
        };
        let Some(class) = params.get_str("exporter").map(str::to_string) else {
            warn!(poller = %self.name, "exporter [{name}] missing field \"exporter\"");
            return None;
        };
        let Some(factory) = exporters::all_factories()
            .get(class.to_lowercase().as_str())
            .copied()
        else {
            error!(
                poller = %self.name,
                "unknown exporter class [{class}], known classes: {:?}",
                exporters::EXPORTER_NAMES
            );
            return None;
        };

        let core = ExporterCore::new(&class, name, Arc::clone(&self.options), params);
        let mut exporter = factory(core);
        if let Err(e) = exporter.init().await {
            error!(poller = %self.name, "initializing exporter [{name}]: {e}");
            return None;
        }

        let exporter = Arc::new(exporter);
        self.exporters.push(Arc::clone(&exporter));
        info!(poller = %self.name, "initialized exporter [{name}]");
        Some(exporter)
    }

    /// Runs one worker per collector plus the self-monitor until a signal
    /// cancels the stop token or every worker has exited.
    pub async fn start(&mut self) {
        let mut workers = JoinSet::new();
        let mut handles = Vec::new();
        for collector in self.collectors.drain(..) {
            let name = format!("{}:{}", collector.class(), collector.object());
            debug!(poller = %self.name, collector = %name, "starting collector");
            handles.push(CollectorHandle {
                name,
                status: collector.status(),
            });
            workers.spawn(collector.run(self.token.clone()));
        }

        let monitor = tokio::spawn(self_monitor(
            std::mem::take(&mut self.schedule),
            handles,
            self.exporters.clone(),
            self.token.clone(),
            self.name.clone(),
        ));

        while workers.join_next().await.is_some() {}
        info!(poller = %self.name, "no active collectors, poller terminating");
        self.token.cancel();
        let _ = monitor.await;
        self.stop();
    }

    /// Idempotent cleanup: cancels workers and removes the PID file.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.token.cancel();
        info!(poller = %self.name, pid = self.pid, "cleaning up and stopping poller");
        if let Some(path) = &self.pid_file {
            match fs::remove_file(path) {
                Ok(()) => debug!(poller = %self.name, "removed pid file [{}]", path.display()),
                Err(e) => warn!(poller = %self.name, "removing pid file [{}]: {e}", path.display()),
            }
        }
    }

    /// Daemon mode only; failure to write the file is logged, not fatal.
    fn register_pid(&mut self) {
        if !self.options.daemon {
            return;
        }
        if let Err(e) = fs::create_dir_all(&self.options.pid_path) {
            warn!(poller = %self.name, "creating pid directory: {e}");
            return;
        }
        let path = self.options.pid_path.join(format!("{}.pid", self.name));
        match fs::write(&path, self.pid.to_string()) {
            Ok(()) => {
                debug!(poller = %self.name, "wrote pid file [{}]", path.display());
                self.pid_file = Some(path);
            }
            Err(e) => warn!(poller = %self.name, "writing pid file [{}]: {e}", path.display()),
        }
    }

    fn log_debug_info(&self) {
        use sysinfo::System;

        let mut system = System::new();
        system.refresh_memory();
        debug!(
            poller = %self.name,
            hostname = %self.options.hostname,
            os = %System::name().unwrap_or_default(),
            kernel = %System::kernel_version().unwrap_or_default(),
            uptime = System::uptime(),
            total_memory = system.total_memory(),
            available_memory = system.available_memory(),
            "host info"
        );
    }
}

/// Periodically reads every component's status and emits one aggregate
/// line. Runs on its own task with the supervisor's schedule.
async fn self_monitor(
    mut schedule: Schedule,
    collectors: Vec<CollectorHandle>,
    exporters: Vec<Arc<ExporterType>>,
    token: CancellationToken,
    poller: String,
) {
    loop {
        let due = schedule.get_task("poller").is_some_and(|t| t.is_due());
        if due {
            if let Some(task) = schedule.get_task("poller") {
                task.start();
            }

            let mut up_collectors = 0;
            for handle in &collectors {
                let (code, label, message) = handle.status.get();
                debug!(poller = %poller, collector = %handle.name, code, label, message = %message, "collector status");
                if code == StatusCode::Up as u8 {
                    up_collectors += 1;
                }
            }
            let mut up_exporters = 0;
            for exporter in &exporters {
                let (code, label, message) = exporter.get_status();
                debug!(poller = %poller, exporter = exporter.name(), code, label, message = %message, "exporter status");
                if code == StatusCode::Up as u8 {
                    up_exporters += 1;
                }
            }
            info!(
                poller = %poller,
                "updated status: {up_collectors} up collectors (of {}) and {up_exporters} up exporters (of {})",
                collectors.len(),
                exporters.len()
            );

            if let Some(task) = schedule.get_task("poller") {
                task.stop();
            }
        }
        tokio::select! {
            () = token.cancelled() => break,
            () = schedule.sleep() => {}
        }
    }
}
