/// Numeric kind of a metric column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Int64,
    Float64,
}

/// One typed column of a matrix.
///
/// The row index into the dense value store is assigned once at creation
/// and never reused while the matrix is live.
#[derive(Clone, Debug)]
pub struct Metric {
    index: usize,
    kind: MetricKind,
    label: String,
    unit: String,
    exportable: bool,
}

impl Metric {
    pub(super) fn new(index: usize, kind: MetricKind) -> Self {
        Self {
            index,
            kind,
            label: String::new(),
            unit: String::new(),
            exportable: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(super) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Display name for downstream wire formats; empty means "use the key".
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }

    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    pub fn set_exportable(&mut self, exportable: bool) {
        self.exportable = exportable;
    }
}
