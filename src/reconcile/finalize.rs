use std::collections::{BTreeSet, HashSet};

use crate::core::model::{AccuracyReport, ExtractedSubject, SlotCompleteness, Slot};
use crate::curriculum::ReferenceCurriculum;

/// Add every critical subject whose slot is represented but which is absent.
pub fn inject_critical(
    curriculum: &ReferenceCurriculum,
    subjects: &mut Vec<ExtractedSubject>,
    represented: &BTreeSet<Slot>,
) -> Vec<String> {
    let mut fixes = Vec::new();
    for code in &curriculum.rules.critical {
        if subjects.iter().any(|subject| &subject.subject_code == code) {
            continue;
        }
        let Some((slot, reference)) = curriculum.find(code) else {
            continue;
        };
        if !represented.contains(&slot) {
            continue;
        }
        subjects.push(ExtractedSubject::from_reference(reference, slot));
        fixes.push(format!(
            "{} injected critical subject {} ({})",
            slot.label(),
            reference.code,
            reference.name
        ));
    }
    fixes
}

/// Per-slot completeness plus the share of subjects that exactly match
/// their slot's reference entry.
pub fn accuracy_report(
    curriculum: &ReferenceCurriculum,
    subjects: &[ExtractedSubject],
    represented: &BTreeSet<Slot>,
) -> AccuracyReport {
    let codes: HashSet<&str> = subjects
        .iter()
        .map(|subject| subject.subject_code.as_str())
        .collect();

    let slots: Vec<SlotCompleteness> = represented
        .iter()
        .map(|&slot| {
            let references = curriculum.subjects_for(slot);
            let (present, missing): (Vec<_>, Vec<_>) = references
                .iter()
                .map(|reference| reference.code.clone())
                .partition(|code| codes.contains(code.as_str()));
            SlotCompleteness {
                slot,
                expected: references.len(),
                present,
                missing,
            }
        })
        .collect();

    let total: usize = slots.iter().map(|slot| slot.expected).sum();
    let correct = subjects
        .iter()
        .filter(|subject| {
            curriculum
                .subjects_for(subject.slot())
                .iter()
                .any(|reference| subject.matches_reference(reference))
        })
        .count();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    AccuracyReport {
        accuracy,
        correct,
        total,
        slots,
    }
}
