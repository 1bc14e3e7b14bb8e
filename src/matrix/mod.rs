//! In-memory metric container: instances × metrics with per-cell values.
//!
//! The value store is dense: metrics and instances get integer row/column
//! indices at creation, so a cell update is two map lookups and one array
//! write, independent of matrix size. Removing a metric or instance only
//! retires its index; freed rows and columns are reclaimed by `reset()`.

use indexmap::IndexMap;

use crate::error::Error;

mod export_options;
mod instance;
mod metric;

pub use export_options::ExportOptions;
pub use instance::Instance;
pub use metric::{Metric, MetricKind};

#[derive(Clone, Debug)]
pub struct Matrix {
    collector: String,
    object: String,
    metrics: IndexMap<String, Metric>,
    instances: IndexMap<String, Instance>,
    values: Vec<Vec<f64>>,
    record: Vec<Vec<bool>>,
    // column slots allocated so far, including retired ones
    num_cols: usize,
    export_options: ExportOptions,
}

impl Matrix {
    pub fn new(collector: &str, object: &str) -> Self {
        Self {
            collector: collector.to_string(),
            object: object.to_string(),
            metrics: IndexMap::new(),
            instances: IndexMap::new(),
            values: Vec::new(),
            record: Vec::new(),
            num_cols: 0,
            export_options: ExportOptions::default(),
        }
    }

    pub fn collector(&self) -> &str {
        &self.collector
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    pub fn set_export_options(&mut self, options: ExportOptions) {
        self.export_options = options;
    }

    pub fn is_exportable(&self) -> bool {
        self.export_options.is_exportable
    }

    /// Idempotent on key: returns the existing metric or creates a new
    /// float column. Fails only on an empty key.
    pub fn create_metric(&mut self, key: &str) -> Result<&mut Metric, Error> {
        if key.is_empty() {
            return Err(Error::Matrix("empty metric key".to_string()));
        }
        if !self.metrics.contains_key(key) {
            self.push_metric(key, MetricKind::Float64);
        }
        self.metrics
            .get_mut(key)
            .ok_or_else(|| Error::Matrix(format!("metric [{key}] vanished")))
    }

    pub fn new_metric_int64(&mut self, key: &str) -> Result<&mut Metric, Error> {
        self.new_metric(key, MetricKind::Int64)
    }

    pub fn new_metric_float64(&mut self, key: &str) -> Result<&mut Metric, Error> {
        self.new_metric(key, MetricKind::Float64)
    }

    fn new_metric(&mut self, key: &str, kind: MetricKind) -> Result<&mut Metric, Error> {
        if key.is_empty() {
            return Err(Error::Matrix("empty metric key".to_string()));
        }
        if self.metrics.contains_key(key) {
            return Err(Error::Matrix(format!("metric [{key}] already exists")));
        }
        self.push_metric(key, kind);
        self.metrics
            .get_mut(key)
            .ok_or_else(|| Error::Matrix(format!("metric [{key}] vanished")))
    }

    fn push_metric(&mut self, key: &str, kind: MetricKind) {
        let index = self.values.len();
        self.values.push(vec![0.0; self.num_cols]);
        self.record.push(vec![false; self.num_cols]);
        self.metrics.insert(key.to_string(), Metric::new(index, kind));
    }

    pub fn get_metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.get(key)
    }

    pub fn get_metric_mut(&mut self, key: &str) -> Option<&mut Metric> {
        self.metrics.get_mut(key)
    }

    /// Retires the metric's row; the row slot is reclaimed at `reset()`.
    pub fn remove_metric(&mut self, key: &str) {
        self.metrics.shift_remove(key);
    }

    pub fn new_instance(&mut self, key: &str) -> Result<&mut Instance, Error> {
        if key.is_empty() {
            return Err(Error::Matrix("empty instance key".to_string()));
        }
        if self.instances.contains_key(key) {
            return Err(Error::Matrix(format!("instance [{key}] already exists")));
        }
        let index = self.num_cols;
        self.num_cols += 1;
        for row in &mut self.values {
            row.push(0.0);
        }
        for row in &mut self.record {
            row.push(false);
        }
        self.instances.insert(key.to_string(), Instance::new(index));
        self.instances
            .get_mut(key)
            .ok_or_else(|| Error::Matrix(format!("instance [{key}] vanished")))
    }

    pub fn get_instance(&self, key: &str) -> Option<&Instance> {
        self.instances.get(key)
    }

    pub fn get_instance_mut(&mut self, key: &str) -> Option<&mut Instance> {
        self.instances.get_mut(key)
    }

    /// Retires the instance's column; the column slot is reclaimed at
    /// `reset()`. Cells written for this instance are left in place.
    pub fn remove_instance(&mut self, key: &str) {
        self.instances.shift_remove(key);
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Insertion-order walk over metrics; the iterator restarts on each call.
    pub fn get_metrics(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.metrics.iter().map(|(k, m)| (k.as_str(), m))
    }

    /// Insertion-order walk over instances; the iterator restarts on each call.
    pub fn get_instances(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.instances.iter().map(|(k, i)| (k.as_str(), i))
    }

    /// Writes a cell and marks it valid. Both handles must belong to this
    /// matrix.
    pub fn set_value(&mut self, metric: &str, instance: &str, value: f64) -> Result<(), Error> {
        let row = self
            .metrics
            .get(metric)
            .map(Metric::index)
            .ok_or_else(|| Error::Matrix(format!("unknown metric [{metric}]")))?;
        let col = self
            .instances
            .get(instance)
            .map(Instance::index)
            .ok_or_else(|| Error::Matrix(format!("unknown instance [{instance}]")))?;
        let cell = self
            .values
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| Error::Matrix(format!("cell [{metric}][{instance}] out of range")))?;
        *cell = value;
        if let Some(bit) = self.record.get_mut(row).and_then(|r| r.get_mut(col)) {
            *bit = true;
        }
        Ok(())
    }

    pub fn set_value_int64(&mut self, metric: &str, instance: &str, value: i64) -> Result<(), Error> {
        self.set_value(metric, instance, value as f64)
    }

    /// Returns the cell value if it has been written since the last reset.
    pub fn get_value(&self, metric: &str, instance: &str) -> Option<f64> {
        let row = self.metrics.get(metric)?.index();
        let col = self.instances.get(instance)?.index();
        if *self.record.get(row)?.get(col)? {
            self.values.get(row)?.get(col).copied()
        } else {
            None
        }
    }

    /// Clears every cell and compacts the dense store: surviving metrics
    /// and instances are re-indexed in insertion order, reclaiming slots
    /// retired by earlier removals.
    pub fn reset(&mut self) {
        for (index, metric) in self.metrics.values_mut().enumerate() {
            metric.set_index(index);
        }
        for (index, instance) in self.instances.values_mut().enumerate() {
            instance.set_index(index);
        }
        self.num_cols = self.instances.len();
        self.values = vec![vec![0.0; self.num_cols]; self.metrics.len()];
        self.record = vec![vec![false; self.num_cols]; self.metrics.len()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        let mut data = Matrix::new("fake", "disks");
        data.new_metric_int64("bytes_read").unwrap();
        data.new_metric_float64("busy_ratio").unwrap();
        data.new_instance("disk-01").unwrap();
        data.new_instance("disk-02").unwrap();
        data
    }

    #[test]
    fn test_create_metric_is_idempotent() {
        let mut data = Matrix::new("fake", "disks");
        data.create_metric("iops").unwrap();
        data.create_metric("iops").unwrap();
        assert_eq!(data.metric_count(), 1);
    }

    #[test]
    fn test_create_metric_rejects_empty_key() {
        let mut data = Matrix::new("fake", "disks");
        assert!(data.create_metric("").is_err());
    }

    #[test]
    fn test_new_metric_rejects_duplicate() {
        let mut data = sample();
        assert!(data.new_metric_int64("bytes_read").is_err());
    }

    #[test]
    fn test_new_instance_rejects_duplicate() {
        let mut data = sample();
        assert!(data.new_instance("disk-01").is_err());
    }

    #[test]
    fn test_set_and_get_value() {
        let mut data = sample();
        data.set_value_int64("bytes_read", "disk-01", 42).unwrap();
        assert_eq!(data.get_value("bytes_read", "disk-01"), Some(42.0));
        // untouched cell carries no validity bit
        assert_eq!(data.get_value("bytes_read", "disk-02"), None);
    }

    #[test]
    fn test_set_value_rejects_unknown_handles() {
        let mut data = sample();
        assert!(data.set_value("nope", "disk-01", 1.0).is_err());
        assert!(data.set_value("bytes_read", "nope", 1.0).is_err());
    }

    #[test]
    fn test_metric_added_after_instances() {
        let mut data = sample();
        data.new_metric_int64("bytes_written").unwrap();
        data.set_value("bytes_written", "disk-02", 7.0).unwrap();
        assert_eq!(data.get_value("bytes_written", "disk-02"), Some(7.0));
    }

    #[test]
    fn test_insertion_order_iteration() {
        let data = sample();
        let metrics: Vec<&str> = data.get_metrics().map(|(k, _)| k).collect();
        assert_eq!(metrics, vec!["bytes_read", "busy_ratio"]);
        let instances: Vec<&str> = data.get_instances().map(|(k, _)| k).collect();
        assert_eq!(instances, vec!["disk-01", "disk-02"]);
    }

    #[test]
    fn test_remove_instance_keeps_cells() {
        let mut data = sample();
        data.set_value("bytes_read", "disk-01", 1.0).unwrap();
        data.set_value("bytes_read", "disk-02", 2.0).unwrap();
        data.remove_instance("disk-01");
        assert_eq!(data.instance_count(), 1);
        // the surviving instance keeps its column and value
        assert_eq!(data.get_value("bytes_read", "disk-02"), Some(2.0));
        // retired slots are not reused before reset
        let added = data.new_instance("disk-03").unwrap();
        assert_eq!(added.index(), 2);
    }

    #[test]
    fn test_reset_compacts_and_clears() {
        let mut data = sample();
        data.set_value("bytes_read", "disk-02", 9.0).unwrap();
        data.remove_instance("disk-01");
        data.reset();
        // indices compacted, values cleared
        assert_eq!(data.get_instance("disk-02").map(Instance::index), Some(0));
        assert_eq!(data.get_value("bytes_read", "disk-02"), None);
        data.set_value("bytes_read", "disk-02", 3.0).unwrap();
        assert_eq!(data.get_value("bytes_read", "disk-02"), Some(3.0));
    }

    #[test]
    fn test_export_flag_does_not_touch_cells() {
        let mut data = sample();
        data.set_value("bytes_read", "disk-01", 5.0).unwrap();
        if let Some(instance) = data.get_instance_mut("disk-01") {
            instance.set_exportable(false);
        }
        assert_eq!(data.get_value("bytes_read", "disk-01"), Some(5.0));
    }

    #[test]
    fn test_labels_are_ordered_and_unique() {
        let mut data = sample();
        let instance = data.get_instance_mut("disk-01").unwrap();
        instance.set_label("node", "a");
        instance.set_label("class", "user_defined");
        instance.set_label("node", "b");
        let keys: Vec<&String> = instance.labels().keys().collect();
        assert_eq!(keys, vec!["node", "class"]);
        assert_eq!(instance.get_label("node"), Some("b"));
    }
}
