// src/sdmx/decode.rs

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::dataset::{Dataset, Dimension, Observation};
use crate::sdmx::types::{SdmxDimension, SdmxResponse};

/// Errors raised while turning a raw SDMX-JSON response into a [`Dataset`].
/// All of them mean the payload disagrees with its own structure block, so
/// the whole decode fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SdmxError {
    #[error("response carries no dataSets")]
    NoDataSet,

    #[error("key \"{key}\": segment \"{segment}\" is not a numeric index")]
    BadKey { key: String, segment: String },

    #[error("key \"{key}\": observation holds {found} where a number or null was expected")]
    BadValue { key: String, found: String },
}

/// Decode a raw response into the flattener's input model.
///
/// Series-attached dimensions come first, observation-attached ones (the
/// time axis) after them, both in declared order. Every observation key is
/// the concatenation of its colon-split series key and observation key, so
/// the series layout and the `allDimensions` layout decode to the same
/// model. Value indices are the positions in each dimension's declared
/// value list.
///
/// Observations come out in ascending numeric key order: JSON object member
/// order is not meaningful in SDMX, and the canonical order makes equal
/// documents decode to equal datasets.
#[instrument(level = "debug", skip(response), fields(data_sets = response.data_sets.len()))]
pub fn decode(response: &SdmxResponse) -> Result<Dataset, SdmxError> {
    let groups = &response.structure.dimensions;
    if !groups.dataset.is_empty() {
        warn!(
            count = groups.dataset.len(),
            "ignoring dataset-level dimensions"
        );
    }

    let data_set = response.data_sets.first().ok_or(SdmxError::NoDataSet)?;
    if response.data_sets.len() > 1 {
        warn!(
            count = response.data_sets.len(),
            "response carries multiple dataSets, decoding the first"
        );
    }

    let dimensions: Vec<Dimension> = groups
        .series
        .iter()
        .chain(&groups.observation)
        .map(dimension_from_sdmx)
        .collect();

    let mut observations = Vec::new();

    for (series_key, series) in &data_set.series {
        let prefix = parse_key(series_key)?;
        for (obs_key, cells) in &series.observations {
            let mut key = prefix.clone();
            key.extend(parse_key(obs_key)?);
            let value = measurement(Some(series_key), obs_key, cells)?;
            observations.push(Observation::new(key, value));
        }
    }

    for (obs_key, cells) in &data_set.observations {
        let key = parse_key(obs_key)?;
        let value = measurement(None, obs_key, cells)?;
        observations.push(Observation::new(key, value));
    }

    observations.sort_by(|a, b| a.key.cmp(&b.key));

    debug!(
        dimensions = dimensions.len(),
        observations = observations.len(),
        "decoded SDMX response"
    );

    Ok(Dataset {
        dimensions,
        observations,
    })
}

fn dimension_from_sdmx(dim: &SdmxDimension) -> Dimension {
    Dimension::new(
        dim.display_name(),
        dim.values
            .iter()
            .enumerate()
            .map(|(position, value)| (position as u32, value.display_label())),
    )
}

fn parse_key(key: &str) -> Result<Vec<u32>, SdmxError> {
    key.split(':')
        .map(|segment| {
            segment.parse::<u32>().map_err(|_| SdmxError::BadKey {
                key: key.to_string(),
                segment: segment.to_string(),
            })
        })
        .collect()
}

/// The first cell of an observation array is the measurement; the rest are
/// attribute indices, which are not carried over.
fn measurement(
    series_key: Option<&str>,
    obs_key: &str,
    cells: &[Value],
) -> Result<Option<f64>, SdmxError> {
    match cells.first() {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(SdmxError::BadValue {
            key: match series_key {
                Some(series) => format!("{series}:{obs_key}"),
                None => obs_key.to_string(),
            },
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    /// Series layout, shaped like a `detail=dataonly` IDD/PDB_GR response.
    fn series_response() -> &'static str {
        r#"{
            "structure": {
                "name": "Growth in GDP per capita",
                "dimensions": {
                    "series": [
                        {
                            "id": "LOCATION",
                            "name": "Country",
                            "values": [
                                {"id": "AUS", "name": "Australia"},
                                {"id": "USA", "name": "United States"}
                            ]
                        },
                        {
                            "id": "MEASURE",
                            "name": "Measure",
                            "values": [
                                {"id": "T_GDPPOP_V", "name": "GDP per capita"}
                            ]
                        }
                    ],
                    "observation": [
                        {
                            "id": "TIME_PERIOD",
                            "name": "Time",
                            "values": [
                                {"id": "2013"},
                                {"id": "2014"}
                            ]
                        }
                    ]
                }
            },
            "dataSets": [
                {
                    "series": {
                        "1:0": {"observations": {"0": [43696.0, null], "1": [null]}},
                        "0:0": {"observations": {"1": [45934.5]}}
                    }
                }
            ]
        }"#
    }

    /// `dimensionAtObservation=allDimensions` layout, all dimensions on the
    /// observation level.
    fn flat_response() -> &'static str {
        r#"{
            "structure": {
                "dimensions": {
                    "observation": [
                        {"id": "LOCATION", "values": [{"id": "AUS"}, {"id": "AUT"}]},
                        {"id": "TIME_PERIOD", "values": [{"id": "2009-Q2"}]}
                    ]
                }
            },
            "dataSets": [
                {
                    "observations": {
                        "1:0": [271.3],
                        "0:0": [311.8]
                    }
                }
            ]
        }"#
    }

    #[test]
    fn decodes_the_series_layout() -> Result<()> {
        let response: SdmxResponse = serde_json::from_str(series_response())?;
        let dataset = decode(&response)?;

        // series dimensions first, time axis last
        let names: Vec<&str> = dataset.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Country", "Measure", "Time"]);

        // labels resolve through `name`, ids fill in where `name` is absent
        assert_eq!(dataset.dimensions[0].values[0].label, "Australia");
        assert_eq!(dataset.dimensions[2].values[1].label, "2014");

        // canonical ascending key order regardless of JSON member order
        let keys: Vec<&[u32]> = dataset.observations.iter().map(|o| &o.key[..]).collect();
        assert_eq!(keys, [&[0, 0, 1][..], &[1, 0, 0][..], &[1, 0, 1][..]]);

        assert_eq!(dataset.observations[0].value, Some(45934.5));
        assert_eq!(dataset.observations[1].value, Some(43696.0));
        // [null] measurement is the missing marker
        assert_eq!(dataset.observations[2].value, None);
        Ok(())
    }

    #[test]
    fn decodes_the_all_dimensions_layout() -> Result<()> {
        let response: SdmxResponse = serde_json::from_str(flat_response())?;
        let dataset = decode(&response)?;

        assert_eq!(dataset.dimensions.len(), 2);
        assert_eq!(dataset.dimensions[0].name, "LOCATION");

        assert_eq!(dataset.observations.len(), 2);
        assert_eq!(dataset.observations[0].key, vec![0, 0]);
        assert_eq!(dataset.observations[0].value, Some(311.8));
        assert_eq!(dataset.observations[1].key, vec![1, 0]);
        Ok(())
    }

    #[test]
    fn series_keys_sort_numerically_not_lexicographically() -> Result<()> {
        let doc = r#"{
            "structure": {
                "dimensions": {
                    "observation": [
                        {"id": "N", "values": [
                            {"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"},
                            {"id": "e"}, {"id": "f"}, {"id": "g"}, {"id": "h"},
                            {"id": "i"}, {"id": "j"}, {"id": "k"}
                        ]}
                    ]
                }
            },
            "dataSets": [{"observations": {"10": [1.0], "2": [2.0]}}]
        }"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;
        let dataset = decode(&response)?;

        assert_eq!(dataset.observations[0].key, vec![2]);
        assert_eq!(dataset.observations[1].key, vec![10]);
        Ok(())
    }

    #[test]
    fn decoded_output_feeds_the_flattener() -> Result<()> {
        let response: SdmxResponse = serde_json::from_str(series_response())?;
        let dataset = decode(&response)?;

        let out = crate::flatten::normalize(&dataset, &Default::default())?;
        assert_eq!(out.records.len(), 3);

        let first = &out.records[0];
        assert_eq!(first.get("Country"), Some("Australia"));
        assert_eq!(first.get("Measure"), Some("GDP per capita"));
        assert_eq!(first.get("Time"), Some("2014"));
        assert_eq!(first.value(), Some(45934.5));
        Ok(())
    }

    #[test]
    fn non_numeric_key_segment_fails() -> Result<()> {
        let doc = r#"{
            "structure": {"dimensions": {"observation": [{"id": "N", "values": [{"id": "x"}]}]}},
            "dataSets": [{"observations": {"0:x": [1.0]}}]
        }"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;

        let err = decode(&response).unwrap_err();
        assert_eq!(
            err,
            SdmxError::BadKey {
                key: "0:x".to_string(),
                segment: "x".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn non_numeric_measurement_fails() -> Result<()> {
        let doc = r#"{
            "structure": {"dimensions": {"observation": [{"id": "N", "values": [{"id": "x"}]}]}},
            "dataSets": [{"observations": {"0": ["oops"]}}]
        }"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;

        let err = decode(&response).unwrap_err();
        assert!(matches!(err, SdmxError::BadValue { .. }));
        assert!(err.to_string().contains("\"oops\""));
        Ok(())
    }

    #[test]
    fn empty_observation_array_is_missing() -> Result<()> {
        let doc = r#"{
            "structure": {"dimensions": {"observation": [{"id": "N", "values": [{"id": "x"}]}]}},
            "dataSets": [{"observations": {"0": []}}]
        }"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;
        let dataset = decode(&response)?;

        assert_eq!(dataset.observations[0].value, None);
        Ok(())
    }

    #[test]
    fn missing_data_sets_fail() -> Result<()> {
        let doc = r#"{"structure": {"dimensions": {"observation": []}}, "dataSets": []}"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;

        assert_eq!(decode(&response).unwrap_err(), SdmxError::NoDataSet);
        Ok(())
    }

    #[test]
    fn extra_data_sets_and_dataset_level_dimensions_are_ignored() -> Result<()> {
        let doc = r#"{
            "structure": {
                "dimensions": {
                    "dataset": [
                        {"id": "FREQUENCY", "name": "Frequency", "values": [{"id": "A", "name": "Annual"}]}
                    ],
                    "observation": [
                        {"id": "LOCATION", "name": "Country", "values": [{"id": "AUS", "name": "Australia"}]}
                    ]
                }
            },
            "dataSets": [
                {"observations": {"0": [1.0]}},
                {"observations": {"0": [999.0]}}
            ]
        }"#;
        let response: SdmxResponse = serde_json::from_str(doc)?;
        let dataset = decode(&response)?;

        // key layout comes from series + observation dimensions only
        let names: Vec<&str> = dataset.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Country"]);

        // only the first dataSet's observations survive
        assert_eq!(dataset.observations.len(), 1);
        assert_eq!(dataset.observations[0].key, vec![0]);
        assert_eq!(dataset.observations[0].value, Some(1.0));
        Ok(())
    }
}
