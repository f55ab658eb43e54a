//! Error taxonomy for the extraction pipeline.
//!
//! Adapters (recognizer bridge, image I/O) report `anyhow::Error`; the
//! pipeline wraps those into [`PipelineError::Processing`] together with the
//! stage that failed. Validation errors live next to the validation rules in
//! [`crate::validate`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::model::CaptureSource;

impl CaptureSource {
    /// User-facing guidance for an empty extraction.
    pub fn remediation(&self) -> &'static str {
        match self {
            CaptureSource::Camera => {
                "Retake the photo in good lighting with the page flat and all four curriculum tables in frame."
            }
            CaptureSource::File => {
                "Upload an uncropped, high-resolution scan of the checklist where the course codes are legible."
            }
        }
    }
}

/// Stage of a pipeline run, used to tag processing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Preprocessing,
    DetectingYear,
    Splitting,
    Recognizing,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Preprocessing => write!(f, "preprocessing"),
            ProcessingStage::DetectingYear => write!(f, "year detection"),
            ProcessingStage::Splitting => write!(f, "quadrant splitting"),
            ProcessingStage::Recognizing => write!(f, "text recognition"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reconciliation produced no subjects; nothing gets persisted.
    #[error("no subjects found in the {capture} upload. {}", .capture.remediation())]
    EmptyResult { capture: CaptureSource },

    /// An image or recognition call failed; the whole run is aborted.
    #[error("processing failed during {stage}: {source:#}")]
    Processing {
        stage: ProcessingStage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn processing(stage: ProcessingStage, source: anyhow::Error) -> Self {
        PipelineError::Processing { stage, source }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no subjects to save")]
    Empty,

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode subjects: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown program: {0}")]
    UnknownProgram(String),

    #[error("invalid curriculum {program}: {reason}")]
    Invalid { program: String, reason: String },
}
