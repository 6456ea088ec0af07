pub mod decode;
pub mod types;

pub use decode::{decode, SdmxError};
pub use types::SdmxResponse;
