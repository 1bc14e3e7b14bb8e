use indexmap::IndexMap;

/// One labelled row of a matrix, e.g. a specific disk or volume.
///
/// Labels are an ordered mapping with unique keys; the column index into
/// the dense value store is assigned once at creation.
#[derive(Clone, Debug)]
pub struct Instance {
    index: usize,
    labels: IndexMap<String, String>,
    exportable: bool,
}

impl Instance {
    pub(super) fn new(index: usize) -> Self {
        Self {
            index,
            labels: IndexMap::new(),
            exportable: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(super) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_label(&mut self, key: &str, value: &str) {
        self.labels.insert(key.to_string(), value.to_string());
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &IndexMap<String, String> {
        &self.labels
    }

    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    pub fn set_exportable(&mut self, exportable: bool) {
        self.exportable = exportable;
    }
}
