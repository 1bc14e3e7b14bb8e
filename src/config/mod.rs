//! Configuration loading: the main config file and per-class collector
//! templates.
//!
//! The config file lives at `$HARVEST_CONF/harvest.yml` with two top-level
//! subtrees: `Pollers` (poller name to its parameter tree) and `Exporters`
//! (exporter name to its parameter tree). Collector class templates live
//! at `$HARVEST_CONF/conf/<class>/default.yml` and get the poller subtree
//! deep-merged on top at boot.

use std::path::Path;

use crate::error::Error;

mod template;

pub use template::Template;

pub const CONFIG_FILE: &str = "harvest.yml";

fn load_config(conf_path: &Path, file: &str) -> Result<Template, Error> {
    let path = conf_path.join(file);
    Template::load(&path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// The named poller's subtree from the config file.
pub fn get_poller(conf_path: &Path, file: &str, name: &str) -> Result<Template, Error> {
    let root = load_config(conf_path, file)?;
    root.get_child("Pollers")
        .and_then(|pollers| pollers.get_child(name))
        .ok_or_else(|| Error::Config(format!("poller [{name}] not defined in {file}")))
}

/// The global `Exporters` subtree from the config file.
pub fn get_exporters(conf_path: &Path, file: &str) -> Result<Template, Error> {
    let root = load_config(conf_path, file)?;
    root.get_child("Exporters")
        .ok_or_else(|| Error::Config(format!("no Exporters defined in {file}")))
}

/// The class default template, `conf/<class>/default.yml` under the
/// config directory.
pub fn import_template(conf_path: &Path, class: &str) -> Result<Template, Error> {
    let path = conf_path
        .join("conf")
        .join(class.to_lowercase())
        .join("default.yml");
    Template::load(&path)
        .map_err(|e| Error::Template(format!("collector [{class}]: {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            concat!(
                "Pollers:\n",
                "  p1:\n",
                "    collectors: [Fake]\n",
                "    exporters: [StubExporter]\n",
                "Exporters:\n",
                "  StubExporter:\n",
                "    exporter: Stub\n",
            ),
        )
        .unwrap();
        let conf = dir.path().join("conf").join("fake");
        fs::create_dir_all(&conf).unwrap();
        fs::write(conf.join("default.yml"), "object: disks\nschedule: 10s\n").unwrap();
        dir
    }

    #[test]
    fn test_get_poller() {
        let dir = write_tree();
        let poller = get_poller(dir.path(), CONFIG_FILE, "p1").unwrap();
        assert_eq!(poller.get_string_list("collectors"), vec!["Fake"]);
    }

    #[test]
    fn test_get_poller_missing_is_config_error() {
        let dir = write_tree();
        let err = get_poller(dir.path(), CONFIG_FILE, "p2").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_get_exporters() {
        let dir = write_tree();
        let exporters = get_exporters(dir.path(), CONFIG_FILE).unwrap();
        let stub = exporters.get_child("StubExporter").unwrap();
        assert_eq!(stub.get_str("exporter"), Some("Stub"));
    }

    #[test]
    fn test_import_template_lowercases_class() {
        let dir = write_tree();
        let template = import_template(dir.path(), "Fake").unwrap();
        assert_eq!(template.get_str("object"), Some("disks"));
    }

    #[test]
    fn test_import_template_missing_is_template_error() {
        let dir = write_tree();
        let err = import_template(dir.path(), "Zapi").unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }
}
