pub mod data;
pub mod query;

pub use data::fetch_dataset;
pub use query::{DataQuery, Detail, DEFAULT_BASE_URL};
