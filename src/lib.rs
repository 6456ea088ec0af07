//! Fetch OECD SDMX-JSON datasets and flatten them into tabular records.
//!
//! The pipeline runs in four stages: [`fetch`] retrieves a raw
//! [`sdmx::SdmxResponse`] from stats.oecd.org, [`sdmx::decode`] turns it into
//! the positional [`dataset::Dataset`] model, [`flatten::normalize`] resolves
//! every observation key into one [`dataset::FlatRecord`] per observation,
//! and [`output`] serializes the records to CSV or JSON. The flattening core
//! performs no I/O; retrieval and file writing stay at the edges.

pub mod dataset;
pub mod fetch;
pub mod flatten;
pub mod output;
pub mod sdmx;
