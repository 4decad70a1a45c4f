//! Invoice field extraction module.

mod extractor;
pub mod rules;

pub use extractor::{InvoiceExtractor, InvoiceExtractorBuilder};
pub use rules::FieldExtractor;
