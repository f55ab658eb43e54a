//! Persistence of reviewed subjects.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::errors::PersistenceError;
use crate::core::model::ExtractedSubject;

pub const SUBJECTS_FILE: &str = "subjects.json";

pub trait SubjectStore {
    fn save(&self, subjects: &[ExtractedSubject]) -> Result<(), PersistenceError>;
}

/// Writes `subjects.json` into an output directory, replacing earlier saves.
#[derive(Debug, Clone)]
pub struct JsonStore {
    out_dir: PathBuf,
}

impl JsonStore {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.out_dir.join(SUBJECTS_FILE)
    }

    pub fn load(path: &Path) -> Result<Vec<ExtractedSubject>, PersistenceError> {
        let data = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl SubjectStore for JsonStore {
    fn save(&self, subjects: &[ExtractedSubject]) -> Result<(), PersistenceError> {
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: self.out_dir.clone(),
            source,
        };
        fs::create_dir_all(&self.out_dir).map_err(io_err)?;
        let path = self.path();
        let data = serde_json::to_string_pretty(subjects)?;
        fs::write(&path, data).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), count = subjects.len(), "saved subjects");
        Ok(())
    }
}
