use std::io;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kinds of the poller runtime.
///
/// Boot-time kinds (`Config`, `NoCollector`) abort the process; the
/// per-component kinds (`DynamicLoad`, `Init`, `Template`) skip the
/// component and let boot continue; the runtime kinds (`Poll`, `Export`,
/// `Plugin`) never propagate out of a worker and are surfaced through
/// component status instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),

    #[error("no collectors initialized")]
    NoCollector,

    #[error("dynamic load: {0}")]
    DynamicLoad(String),

    #[error("init: {0}")]
    Init(String),

    #[error("template: {0}")]
    Template(String),

    #[error("poll: {0}")]
    Poll(String),

    #[error("export: {0}")]
    Export(String),

    #[error("plugin: {0}")]
    Plugin(String),

    #[error("matrix: {0}")]
    Matrix(String),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
