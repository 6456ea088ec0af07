// src/dataset.rs

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A categorical axis (country, year, indicator, ...) along which
/// observations are organized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<DimensionValue>,
}

impl Dimension {
    /// Build a dimension from `(index, label)` pairs.
    pub fn new<L>(name: impl Into<String>, values: impl IntoIterator<Item = (u32, L)>) -> Self
    where
        L: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(index, label)| DimensionValue {
                    index,
                    label: label.into(),
                })
                .collect(),
        }
    }
}

/// One admissible value of a dimension: a key index paired with the
/// human-readable label it stands for. Indices need not be contiguous or
/// sorted; resolution is by declared index, not position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub index: u32,
    pub label: String,
}

/// A single measurement located by one value index per dimension, in
/// dimension order. `value: None` marks a present-but-missing measurement;
/// it is data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub key: Vec<u32>,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(key: Vec<u32>, value: Option<f64>) -> Self {
        Self { key, value }
    }
}

/// The root input document: ordered dimensions plus the observations keyed
/// by them. Dimension order is significant: it defines the positional key
/// layout every observation must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dimensions: Vec<Dimension>,
    pub observations: Vec<Observation>,
}

/// One flattened output row: every dimension's resolved label in dimension
/// order, plus the observation's measurement.
///
/// Serializes as a flat JSON map, `{"Country": "France", ..., "value": 1.15}`,
/// keys in dimension order with `value` last.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, String)>,
    value: Option<f64>,
}

impl FlatRecord {
    pub fn new(fields: Vec<(String, String)>, value: Option<f64>) -> Self {
        Self { fields, value }
    }

    /// Column names in dimension order, `value` excluded.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Resolved labels in dimension order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, label)| label.as_str())
    }

    /// The resolved label for `name`, if the record has that dimension.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, label)| label.as_str())
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, label) in &self.fields {
            map.serialize_entry(name, label)?;
        }
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}
