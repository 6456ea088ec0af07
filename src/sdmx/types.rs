// src/sdmx/types.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// A raw stats.oecd.org SDMX-JSON response: the `structure` block that
/// explains how to read observation keys, plus the keyed data itself.
#[derive(Debug, Deserialize)]
pub struct SdmxResponse {
    pub structure: Structure,
    #[serde(rename = "dataSets", default)]
    pub data_sets: Vec<SdmxDataSet>,
}

#[derive(Debug, Deserialize)]
pub struct Structure {
    #[serde(default)]
    pub name: Option<String>,
    pub dimensions: DimensionGroups,
}

/// Dimensions grouped by the level they attach to. The series/observation
/// split mirrors the wire layout: series keys are decoded against `series`,
/// per-observation keys (usually the time axis) against `observation`.
#[derive(Debug, Deserialize)]
pub struct DimensionGroups {
    #[serde(default)]
    pub dataset: Vec<SdmxDimension>,
    #[serde(default)]
    pub series: Vec<SdmxDimension>,
    #[serde(default)]
    pub observation: Vec<SdmxDimension>,
}

#[derive(Debug, Deserialize)]
pub struct SdmxDimension {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<SdmxDimensionValue>,
}

impl SdmxDimension {
    /// Human-readable column name, falling back to the SDMX id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct SdmxDimensionValue {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SdmxDimensionValue {
    /// Display label, falling back to the SDMX id (time periods often carry
    /// the id only).
    pub fn display_label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One `dataSets` entry. The series layout keys observations in two steps
/// (series key, then time index inside the series); the
/// `dimensionAtObservation=allDimensions` layout keys each observation by
/// the full dimension tuple at the top level. Either map may be absent.
#[derive(Debug, Deserialize)]
pub struct SdmxDataSet {
    #[serde(default)]
    pub series: BTreeMap<String, SdmxSeries>,
    #[serde(default)]
    pub observations: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Observations of one series: time index → `[measurement, attributes...]`.
#[derive(Debug, Deserialize)]
pub struct SdmxSeries {
    #[serde(default)]
    pub observations: BTreeMap<String, Vec<serde_json::Value>>,
}
