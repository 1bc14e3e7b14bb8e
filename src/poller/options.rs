use std::fmt;
use std::path::PathBuf;

/// Process options: flags merged with the `HARVEST_*` environment.
///
/// `prometheus_port` starts out unset and is filled from the poller's
/// config subtree during boot.
#[derive(Clone, Debug)]
pub struct Options {
    pub poller: String,
    pub daemon: bool,
    pub debug: bool,
    pub loglevel: u8,
    pub prometheus_port: Option<u16>,
    pub home_path: PathBuf,
    pub conf_path: PathBuf,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
    pub hostname: String,
    pub version: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            poller: String::new(),
            daemon: false,
            debug: false,
            loglevel: 2,
            prometheus_port: None,
            home_path: PathBuf::from("/opt/harvest/"),
            conf_path: PathBuf::from("/etc/harvest/"),
            log_path: PathBuf::from("/var/log/harvest/"),
            pid_path: PathBuf::from("/var/run/harvest/"),
            hostname: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "poller = {}, daemon = {}, debug = {}, loglevel = {}, prometheus_port = {:?}, \
             home = {}, conf = {}, logs = {}, pids = {}, hostname = {}, version = {}",
            self.poller,
            self.daemon,
            self.debug,
            self.loglevel,
            self.prometheus_port,
            self.home_path.display(),
            self.conf_path.display(),
            self.log_path.display(),
            self.pid_path.display(),
            self.hostname,
            self.version,
        )
    }
}
