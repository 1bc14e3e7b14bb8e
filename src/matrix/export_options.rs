use serde::Deserialize;

/// Per-matrix export policy, typically deserialized from the
/// `export_options` subtree of a collector template.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Labels that identify an instance on the wire (tags, key labels).
    pub instance_keys: Vec<String>,
    /// Ship every label, not just the instance keys.
    pub include_all_labels: bool,
    /// Whether the matrix participates in export at all.
    pub is_exportable: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            instance_keys: Vec::new(),
            include_all_labels: false,
            is_exportable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_exportable() {
        let opts = ExportOptions::default();
        assert!(opts.is_exportable);
        assert!(opts.instance_keys.is_empty());
        assert!(!opts.include_all_labels);
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: ExportOptions = serde_yaml::from_str("instance_keys: [disk]").unwrap();
        assert_eq!(opts.instance_keys, vec!["disk"]);
        assert!(opts.is_exportable);
    }
}
