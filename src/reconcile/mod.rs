//! Reconciliation of extracted subjects against a reference curriculum.
//!
//! Runs in four passes: garbage filtering, fuzzy code matching with
//! wholesale correction, critical-subject injection, then completeness and
//! accuracy reporting. Every change is recorded in the result's `fixes` and
//! every dropped or missing entry in its `warnings`.

pub mod align;
pub mod compare;
pub mod filter;
pub mod finalize;

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::core::model::{AccuracyReport, ExtractedSubject, ReconciliationResult, Slot};
use crate::curriculum::ReferenceCurriculum;

pub const DEFAULT_MATCH_THRESHOLD: u8 = 80;

pub struct Reconciler<'a> {
    curriculum: &'a ReferenceCurriculum,
    threshold: u8,
}

impl<'a> Reconciler<'a> {
    pub fn new(curriculum: &'a ReferenceCurriculum) -> Self {
        Self {
            curriculum,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn reconcile(
        &self,
        subjects: Vec<ExtractedSubject>,
    ) -> (ReconciliationResult, AccuracyReport) {
        let input_count = subjects.len();
        let (kept, mut warnings) = filter::remove_garbage(subjects);
        let mut fixes = Vec::new();

        let mut corrected: Vec<ExtractedSubject> = Vec::with_capacity(kept.len());
        let mut seen: HashSet<(Slot, String)> = HashSet::new();
        for mut subject in kept {
            let slot = subject.slot();
            let references = self.curriculum.subjects_for(slot);
            match align::best_match(&subject.subject_code, references, self.threshold) {
                Some(found) => {
                    fixes.extend(align::apply_reference(&mut subject, found.reference));
                }
                None => {
                    let total = subject.lec_units.saturating_add(subject.lab_units);
                    if subject.total_units != total {
                        fixes.push(format!(
                            "{} {}: total {} → {total} (lec + lab)",
                            slot.label(),
                            subject.subject_code,
                            subject.total_units
                        ));
                        subject.total_units = total;
                    }
                }
            }

            if seen.insert((slot, subject.subject_code.clone())) {
                corrected.push(subject);
            } else {
                warnings.push(format!(
                    "{} dropped duplicate {}",
                    slot.label(),
                    subject.subject_code
                ));
            }
        }

        let represented: BTreeSet<Slot> = corrected.iter().map(ExtractedSubject::slot).collect();
        fixes.extend(finalize::inject_critical(
            self.curriculum,
            &mut corrected,
            &represented,
        ));

        let report = finalize::accuracy_report(self.curriculum, &corrected, &represented);
        for completeness in &report.slots {
            for code in &completeness.missing {
                warnings.push(format!("{} missing {code}", completeness.slot.label()));
            }
        }

        for fix in &fixes {
            debug!(%fix, "reconciler fix");
        }
        for warning in &warnings {
            debug!(%warning, "reconciler warning");
        }
        info!(
            input = input_count,
            output = corrected.len(),
            fixes = fixes.len(),
            warnings = warnings.len(),
            accuracy = report.accuracy,
            "reconciled subjects"
        );

        (
            ReconciliationResult {
                subjects: corrected,
                fixes,
                warnings,
            },
            report,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Semester, Units};
    use pretty_assertions::assert_eq;

    fn bsit() -> ReferenceCurriculum {
        ReferenceCurriculum::builtin("bsit").unwrap()
    }

    fn subject(code: &str, name: &str, units: (u8, u8, u8), year: u8, sem: Semester) -> ExtractedSubject {
        ExtractedSubject::new(code, name, Units::new(units.0, units.1, units.2), Slot::new(year, sem))
    }

    fn canonical_slot(curriculum: &ReferenceCurriculum, slot: Slot) -> Vec<ExtractedSubject> {
        curriculum
            .subjects_for(slot)
            .iter()
            .map(|reference| ExtractedSubject::from_reference(reference, slot))
            .collect()
    }

    #[test]
    fn repairs_single_letter_artifact() {
        let curriculum = bsit();
        let (result, _) = Reconciler::new(&curriculum).reconcile(vec![subject(
            "C 104",
            "Data Structures",
            (3, 0, 3),
            2,
            Semester::First,
        )]);
        let repaired = result
            .subjects
            .iter()
            .find(|s| s.subject_code == "CC 104")
            .unwrap();
        assert_eq!(repaired.units(), Units::new(2, 1, 3));
        assert!(result.fixes.iter().any(|f| f == "Y2S1 C 104: code 'C 104' → 'CC 104'"));
    }

    #[test]
    fn every_total_equals_lec_plus_lab() {
        let curriculum = bsit();
        let (result, _) = Reconciler::new(&curriculum).reconcile(vec![
            subject("XYZ 900", "Unknown Course", (2, 1, 5), 1, Semester::First),
            subject("IT 301", "Wrong Units", (1, 1, 1), 3, Semester::First),
        ]);
        assert!(result.subjects.iter().all(|s| s.units().is_consistent()));
        assert!(result
            .fixes
            .iter()
            .any(|f| f == "Y1S1 XYZ 900: total 5 → 3 (lec + lab)"));
    }

    #[test]
    fn canonical_input_needs_no_fixes() {
        let curriculum = bsit();
        let slot = Slot::new(2, Semester::First);
        let (result, report) = Reconciler::new(&curriculum).reconcile(canonical_slot(&curriculum, slot));
        assert_eq!(result.fixes, Vec::<String>::new());
        assert_eq!(result.warnings, Vec::<String>::new());
        assert_eq!(report.accuracy, 100.0);
    }

    #[test]
    fn reconciling_twice_changes_nothing() {
        let curriculum = bsit();
        let reconciler = Reconciler::new(&curriculum);
        let (first, _) = reconciler.reconcile(vec![
            subject("C 104", "Data Structures", (3, 0, 3), 2, Semester::First),
            subject("IT 2O1", "Networking", (2, 1, 3), 2, Semester::First),
        ]);
        let (second, _) = reconciler.reconcile(first.subjects.clone());
        assert_eq!(second.fixes, Vec::<String>::new());
        assert_eq!(second.subjects, first.subjects);
    }

    #[test]
    fn removes_garbage_and_duplicates() {
        let curriculum = bsit();
        let (result, _) = Reconciler::new(&curriculum).reconcile(vec![
            subject("C", "Noise", (3, 0, 3), 1, Semester::First),
            subject("101", "Noise", (3, 0, 3), 1, Semester::First),
            subject("CC 101", "Intro", (3, 0, 3), 1, Semester::First),
            subject("CC-101", "Intro again", (3, 0, 3), 1, Semester::First),
        ]);
        let codes: Vec<_> = result.subjects.iter().map(|s| s.subject_code.as_str()).collect();
        assert_eq!(codes, vec!["CC 101"]);
        assert!(result.warnings.iter().any(|w| w == "Y1S1 removed 'C' (single letter)"));
        assert!(result.warnings.iter().any(|w| w == "Y1S1 dropped duplicate CC 101"));
    }

    #[test]
    fn injects_critical_subjects_with_canonical_units() {
        let curriculum = bsit();
        let (result, _) = Reconciler::new(&curriculum).reconcile(vec![subject(
            "IT 401",
            "Whatever",
            (3, 0, 3),
            4,
            Semester::First,
        )]);
        let capstone = result
            .subjects
            .iter()
            .find(|s| s.subject_code == "IT 403")
            .unwrap();
        let (_, reference) = curriculum.find("IT 403").unwrap();
        assert!(capstone.matches_reference(reference));
        assert!(result.subjects.iter().any(|s| s.subject_code == "IT Elec 4"));
        // Y4S2 is not represented, so the practicum is not injected.
        assert!(!result.subjects.iter().any(|s| s.subject_code == "IT 499"));
    }

    #[test]
    fn missing_and_present_are_disjoint() {
        let curriculum = bsit();
        let slot = Slot::new(1, Semester::First);
        let mut subjects = canonical_slot(&curriculum, slot);
        let dropped = subjects.remove(0).subject_code;
        let (result, report) = Reconciler::new(&curriculum).reconcile(subjects);

        assert_eq!(report.slots.len(), 1);
        let completeness = &report.slots[0];
        assert_eq!(completeness.missing, vec![dropped.clone()]);
        assert!(completeness
            .present
            .iter()
            .all(|code| !completeness.missing.contains(code)));
        assert_eq!(
            completeness.present.len() + completeness.missing.len(),
            completeness.expected
        );
        assert!(result.warnings.contains(&format!("Y1S1 missing {dropped}")));
        assert_eq!(report.correct, completeness.expected - 1);
    }

    #[test]
    fn no_represented_slots_means_zero_accuracy() {
        let curriculum = bsit();
        let (result, report) = Reconciler::new(&curriculum).reconcile(vec![subject(
            "MATH 101",
            "Summer Math",
            (3, 0, 3),
            1,
            Semester::Summer,
        )]);
        assert_eq!(result.subjects.len(), 1);
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);

        let (_, empty) = Reconciler::new(&curriculum).reconcile(Vec::new());
        assert_eq!(empty.accuracy, 0.0);
        assert!(empty.slots.is_empty());
    }
}
