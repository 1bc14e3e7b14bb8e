use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::Error;

/// A parameter tree: a YAML mapping with typed child accessors and the
/// deep-merge used to overlay poller settings onto class templates.
#[derive(Clone, Debug)]
pub struct Template(Value);

impl Default for Template {
    fn default() -> Self {
        Self(Value::Mapping(serde_yaml::Mapping::new()))
    }
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn parse_str(text: &str) -> Result<Self, Error> {
        Ok(Self(serde_yaml::from_str(text)?))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::parse_str(&text)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A private copy of a subtree, itself a template.
    pub fn get_child(&self, key: &str) -> Option<Template> {
        self.0.get(key).cloned().map(Self)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// A list child as strings. A scalar child is treated as a list of one.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(scalar_to_string)
                .collect(),
            Some(value) => scalar_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Names of a child's entries: keys of a mapping, or the items of a
    /// sequence of scalars. Used for the `objects` declaration.
    pub fn child_names(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Mapping(map)) => map
                .keys()
                .filter_map(scalar_to_string)
                .collect(),
            _ => self.get_string_list(key),
        }
    }

    /// Entries of this mapping as named subtrees.
    pub fn children(&self) -> Vec<(String, Template)> {
        match &self.0 {
            Value::Mapping(map) => map
                .iter()
                .filter_map(|(k, v)| scalar_to_string(k).map(|name| (name, Self(v.clone()))))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Scalar entries of this mapping as string pairs, e.g. a label set.
    pub fn string_pairs(&self) -> Vec<(String, String)> {
        match &self.0 {
            Value::Mapping(map) => map
                .iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Deep merge: `overlay` wins on scalar and list conflicts, mappings
    /// merge recursively. Lists are replaced, never concatenated.
    pub fn union(&mut self, overlay: &Template) {
        union_value(&mut self.0, &overlay.0);
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn union_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_child) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_child) => union_value(base_child, overlay_child),
                    None => {
                        base_map.insert(key.clone(), overlay_child.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
