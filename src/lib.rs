pub mod core;
pub mod curriculum;
pub mod export;
pub mod extract;
pub mod imaging;
pub mod ocr;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod validate;

pub use crate::core::model::{AccuracyReport, ExtractedSubject, ReconciliationResult};
pub use pipeline::{ExtractionOutcome, Pipeline};
