// src/flatten/mod.rs

use std::collections::HashMap;

use thiserror::Error;
use tracing::{instrument, warn};

use crate::dataset::{Dataset, FlatRecord};

/// Knobs for [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// When true, an observation key index its dimension never declared
    /// aborts the run. When false, the offending observation is skipped with
    /// a warning and counted in [`Normalized::skipped`].
    pub strict: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Errors that end a normalization run. Each names the offending
/// observation's position so the caller can locate the bad input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// No dimensions means no key can be interpreted at all.
    #[error("dataset declares no dimensions")]
    EmptyDimensions,

    /// A key tuple that disagrees with the dimension count. Structural
    /// corruption, never recoverable per-record.
    #[error("observation {position}: key has {found} indices, expected {expected}")]
    MalformedKey {
        position: usize,
        expected: usize,
        found: usize,
    },

    /// A key index the corresponding dimension never declared.
    #[error("observation {position}: index {index} is not declared by dimension \"{dimension}\"")]
    UnresolvedIndex {
        position: usize,
        dimension: String,
        index: u32,
    },
}

/// The outcome of a successful run: one record per surviving observation, in
/// input order, plus how many observations lenient mode dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub records: Vec<FlatRecord>,
    pub skipped: usize,
}

/// Resolve every observation of `dataset` into a [`FlatRecord`]: one label
/// per dimension, in dimension order, plus the measurement.
///
/// Pure and deterministic: performs no I/O and preserves input observation
/// order. Either the full record sequence comes back or an error does;
/// partial output is never returned.
#[instrument(
    level = "debug",
    skip(dataset, options),
    fields(
        dimensions = dataset.dimensions.len(),
        observations = dataset.observations.len(),
        strict = options.strict,
    )
)]
pub fn normalize(
    dataset: &Dataset,
    options: &NormalizeOptions,
) -> Result<Normalized, NormalizeError> {
    if dataset.dimensions.is_empty() {
        return Err(NormalizeError::EmptyDimensions);
    }

    // One index → label table per dimension. Declared indices may be sparse,
    // so resolution goes through the table rather than positions.
    let lookups: Vec<HashMap<u32, &str>> = dataset
        .dimensions
        .iter()
        .map(|dim| {
            let mut table = HashMap::with_capacity(dim.values.len());
            for value in &dim.values {
                if table.insert(value.index, value.label.as_str()).is_some() {
                    warn!(
                        dimension = %dim.name,
                        index = value.index,
                        "duplicate value index, keeping the later label"
                    );
                }
            }
            table
        })
        .collect();

    let mut records = Vec::with_capacity(dataset.observations.len());
    let mut skipped = 0usize;

    'observations: for (position, obs) in dataset.observations.iter().enumerate() {
        if obs.key.len() != dataset.dimensions.len() {
            return Err(NormalizeError::MalformedKey {
                position,
                expected: dataset.dimensions.len(),
                found: obs.key.len(),
            });
        }

        let mut fields = Vec::with_capacity(obs.key.len());
        for ((dim, lookup), &index) in dataset.dimensions.iter().zip(&lookups).zip(&obs.key) {
            match lookup.get(&index) {
                Some(label) => fields.push((dim.name.clone(), (*label).to_string())),
                None if options.strict => {
                    return Err(NormalizeError::UnresolvedIndex {
                        position,
                        dimension: dim.name.clone(),
                        index,
                    });
                }
                None => {
                    warn!(
                        position,
                        dimension = %dim.name,
                        index,
                        "skipping observation with unresolved index"
                    );
                    skipped += 1;
                    continue 'observations;
                }
            }
        }

        records.push(FlatRecord::new(fields, obs.value));
    }

    Ok(Normalized { records, skipped })
}
