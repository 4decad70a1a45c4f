//! Configuration and output data models.

pub mod config;
pub mod result;

pub use config::BillieConfig;
pub use result::{ExtractedFields, ExtractionResult, Scored};
