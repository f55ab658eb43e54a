use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::export::Exporter;
use crate::pipeline::ExtractionOutcome;

/// Machine-readable report: reconciled subjects, fixes, warnings and accuracy.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, outcome: &ExtractionOutcome) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("report.json");
        let data = serde_json::to_string_pretty(outcome)?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
