//! Per-collector transforms applied between collection and export.
//!
//! A plugin receives the collector's matrices keyed by object name and may
//! rewrite them in place, returning any additional matrices it derived.
//! Plugin classes are a compile-time registry: the `plugins` list of a
//! collector template names them, and an unknown class surfaces as a
//! dynamic-load error at collector init.

use indexmap::IndexMap;

use crate::error::Error;
use crate::matrix::Matrix;

mod fixed_throughput;

pub use fixed_throughput::FixedThroughput;

/// Counters a plugin may report about the work it did.
#[derive(Clone, Copy, Debug, Default)]
pub struct PluginMetadata {
    pub instances: u64,
    pub metrics: u64,
}

pub trait Plugin: Send {
    fn name(&self) -> &'static str;

    /// One pass over the collector's matrices. Returned matrices are
    /// dispatched to the exporters alongside the originals.
    fn run(
        &mut self,
        data: &mut IndexMap<String, Matrix>,
    ) -> Result<(Vec<Matrix>, Option<PluginMetadata>), Error>;
}

#[derive(Debug)]
pub enum PluginType {
    FixedThroughput(FixedThroughput),
}

impl Plugin for PluginType {
    fn name(&self) -> &'static str {
        match self {
            Self::FixedThroughput(p) => p.name(),
        }
    }

    fn run(
        &mut self,
        data: &mut IndexMap<String, Matrix>,
    ) -> Result<(Vec<Matrix>, Option<PluginMetadata>), Error> {
        match self {
            Self::FixedThroughput(p) => p.run(data),
        }
    }
}

/// Resolves a plugin class declared in a template to an instance bound to
/// the collector's object.
pub fn load(class: &str, object: &str) -> Result<PluginType, Error> {
    match class.to_lowercase().as_str() {
        "fixedthroughput" => Ok(PluginType::FixedThroughput(FixedThroughput::new(object))),
        _ => Err(Error::DynamicLoad(format!("unknown plugin class [{class}]"))),
    }
}
