//! Exporter contract and the compile-time exporter registry.
//!
//! Exporters are shared by every collector that links them, so `export`
//! takes `&self` and must tolerate concurrent callers; each concrete
//! exporter serializes internally as its backend requires. The registry
//! maps lowercase class names to constructors; the supervisor instantiates
//! each configured exporter once and hands out shared handles.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;

use crate::config::Template;
use crate::error::Error;
use crate::matrix::Matrix;
use crate::poller::options::Options;
use crate::status::Status;

#[macro_use]
mod register_macro;

pub type ExporterFactory = fn(ExporterCore) -> ExporterType;

pub trait Exporter: Send + Sync {
    fn core(&self) -> &ExporterCore;

    /// Validate parameters and establish a session where the transport is
    /// connection-oriented.
    fn init<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>>;

    /// Ship one matrix. Callable concurrently from multiple collector
    /// workers; failures are non-fatal and surface through status.
    fn export<'a>(&'a self, data: &'a Matrix) -> BoxFuture<'a, Result<(), Error>>;
}

/// Shared identity and state every concrete exporter embeds.
pub struct ExporterCore {
    class: String,
    name: String,
    options: Arc<Options>,
    params: Template,
    status: Status,
}

impl ExporterCore {
    pub fn new(class: &str, name: &str, options: Arc<Options>, params: Template) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
            options,
            params,
            status: Status::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn params(&self) -> &Template {
        &self.params
    }

    pub fn status(&self) -> &Status {
        &self.status
    }
}

register_exporters! {
    stub => StubExporter,
    influx => InfluxExporter,
    prometheus => PrometheusExporter,
}

impl ExporterType {
    pub fn class(&self) -> &str {
        self.core().class()
    }

    pub fn name(&self) -> &str {
        self.core().name()
    }

    pub fn get_status(&self) -> (u8, &'static str, String) {
        self.core().status().get()
    }
}
