use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::{ExtractedSubject, Slot};
use crate::export::Exporter;
use crate::pipeline::ExtractionOutcome;

/// Human-readable summary grouped by slot.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(outcome: &ExtractionOutcome) -> String {
        let mut out = String::new();
        let report = &outcome.report;

        let _ = writeln!(out, "Program: {}", outcome.program);
        if let Some(capture) = outcome.capture {
            let _ = writeln!(out, "Capture: {capture}");
        }
        if let Some(range) = outcome.year_range {
            let first = range.first_year();
            let _ = writeln!(out, "Years: {first}-{}", first + 1);
        }
        for quadrant in &outcome.quadrants {
            let _ = writeln!(
                out,
                "  {:<12} {}  rows {:>3}  extracted {:>2}  rescued {:>2}",
                format!("{:?}", quadrant.position),
                quadrant.slot.label(),
                quadrant.rows,
                quadrant.extracted,
                quadrant.rescued
            );
        }
        let _ = writeln!(
            out,
            "Accuracy: {:.1}% ({}/{})",
            report.accuracy, report.correct, report.total
        );

        let mut by_slot: BTreeMap<Slot, Vec<&ExtractedSubject>> = BTreeMap::new();
        for subject in outcome.subjects() {
            by_slot.entry(subject.slot()).or_default().push(subject);
        }
        for (slot, subjects) in by_slot {
            let _ = writeln!(out, "\n== {} ({slot}) ==", slot.label());
            for subject in subjects {
                let _ = writeln!(
                    out,
                    "  {:<12} {:<48} {}",
                    subject.subject_code,
                    subject.subject_name,
                    subject.units()
                );
            }
        }

        Self::write_list(&mut out, "Fixes", &outcome.result.fixes);
        Self::write_list(&mut out, "Warnings", &outcome.result.warnings);
        out
    }

    fn write_list(out: &mut String, heading: &str, entries: &[String]) {
        if entries.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n{heading} ({}):", entries.len());
        for entry in entries {
            let _ = writeln!(out, "  - {entry}");
        }
    }
}

impl Exporter for TextExporter {
    fn export(&self, outcome: &ExtractionOutcome) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("report.txt");
        fs::write(&path, Self::render(outcome))
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        AccuracyReport, ReconciliationResult, Semester, SlotCompleteness, Units,
    };

    #[test]
    fn renders_slots_fixes_and_warnings() {
        let slot = Slot::new(2, Semester::First);
        let outcome = ExtractionOutcome::from_reconciliation(
            "bsit",
            ReconciliationResult {
                subjects: vec![ExtractedSubject::new(
                    "CC 104",
                    "Data Structures and Algorithms",
                    Units::new(2, 1, 3),
                    slot,
                )],
                fixes: vec!["Y2S1 C 104: code 'C 104' → 'CC 104'".to_string()],
                warnings: vec!["Y2S1 missing IT 201".to_string()],
            },
            AccuracyReport {
                accuracy: 50.0,
                correct: 1,
                total: 2,
                slots: vec![SlotCompleteness {
                    slot,
                    expected: 2,
                    present: vec!["CC 104".to_string()],
                    missing: vec!["IT 201".to_string()],
                }],
            },
        );

        let text = TextExporter::render(&outcome);

        assert!(text.contains("Program: bsit"));
        assert!(text.contains("Accuracy: 50.0% (1/2)"));
        assert!(text.contains("== Y2S1 (Year 2, 1st Semester) =="));
        assert!(text.contains("2/1/3"));
        assert!(text.contains("Fixes (1):"));
        assert!(text.contains("  - Y2S1 missing IT 201"));
        assert!(!text.contains("Capture:"));
    }
}
