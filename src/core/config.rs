//! Tunable pipeline settings.
//!
//! Every field has a serde default so a settings file only needs to list the
//! values it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;
use crate::core::model::Units;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSettings {
    /// Target width for camera captures.
    #[serde(default = "ImageSettings::default_camera_width")]
    pub camera_width: u32,
    /// Target width for uploaded files.
    #[serde(default = "ImageSettings::default_file_width")]
    pub file_width: u32,
    /// Width of the throwaway image used for year-range detection.
    #[serde(default = "ImageSettings::default_detect_width")]
    pub detect_width: u32,
}

impl ImageSettings {
    fn default_camera_width() -> u32 {
        2400
    }

    fn default_file_width() -> u32 {
        1600
    }

    fn default_detect_width() -> u32 {
        1000
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            camera_width: Self::default_camera_width(),
            file_width: Self::default_file_width(),
            detect_width: Self::default_detect_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionSettings {
    /// Vertical distance within which elements share a row.
    #[serde(default = "ExtractionSettings::default_row_tolerance")]
    pub row_tolerance: f32,
    /// Units assumed when a row carries no readable unit run.
    #[serde(default)]
    pub default_units: Units,
    #[serde(default = "ExtractionSettings::default_max_title_len")]
    pub max_title_len: usize,
    /// Tokens searched after an elective keyword for its number.
    #[serde(default = "ExtractionSettings::default_rescue_lookahead")]
    pub rescue_lookahead: usize,
}

impl ExtractionSettings {
    fn default_row_tolerance() -> f32 {
        25.0
    }

    fn default_max_title_len() -> usize {
        200
    }

    fn default_rescue_lookahead() -> usize {
        3
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            row_tolerance: Self::default_row_tolerance(),
            default_units: Units::default(),
            max_title_len: Self::default_max_title_len(),
            rescue_lookahead: Self::default_rescue_lookahead(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    /// Minimum fuzzy score (0-100) for auto-correction.
    #[serde(default = "PipelineSettings::default_match_threshold")]
    pub match_threshold: u8,
    /// Process the four quadrants concurrently.
    #[serde(default = "PipelineSettings::default_parallel")]
    pub parallel: bool,
}

impl PipelineSettings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn default_match_threshold() -> u8 {
        80
    }

    fn default_parallel() -> bool {
        true
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            image: ImageSettings::default(),
            extraction: ExtractionSettings::default(),
            match_threshold: Self::default_match_threshold(),
            parallel: Self::default_parallel(),
        }
    }
}
