#![allow(dead_code)]

use std::fs;

use harvest_poller::poller::options::Options;
use tempfile::TempDir;

/// Minimal simulated-source template: one object, one metric, two
/// labelled instances.
pub const FAKE_TEMPLATE: &str = concat!(
    "object: disks\n",
    "schedule: 100ms\n",
    "metrics:\n",
    "  - bytes_read\n",
    "instances:\n",
    "  disk-01:\n",
    "    disk: disk-01\n",
    "  disk-02:\n",
    "    disk: disk-02\n",
    "export_options:\n",
    "  instance_keys: [disk]\n",
);

/// Lays out a scratch config directory: `harvest.yml` plus one
/// `conf/<class>/default.yml` per entry.
pub fn write_config(harvest_yml: &str, templates: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("harvest.yml"), harvest_yml).unwrap();
    for (class, content) in templates {
        let conf = dir.path().join("conf").join(class.to_lowercase());
        fs::create_dir_all(&conf).unwrap();
        fs::write(conf.join("default.yml"), content).unwrap();
    }
    dir
}

/// Options pointing every path at the scratch directory.
pub fn options_for(dir: &TempDir, poller: &str) -> Options {
    Options {
        poller: poller.to_string(),
        home_path: dir.path().to_path_buf(),
        conf_path: dir.path().to_path_buf(),
        log_path: dir.path().join("logs"),
        pid_path: dir.path().join("pids"),
        ..Default::default()
    }
}
