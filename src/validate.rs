//! Review-step validation of user-edited subject entries.

use strsim::normalized_levenshtein;
use thiserror::Error;

use crate::core::model::{ExtractedSubject, Slot, Units};
use crate::curriculum::ReferenceCurriculum;
use crate::reconcile::compare::normalize_code;

pub const MAX_COMPONENT_UNITS: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationRejection {
    #[error("{code} is not offered in {slot}{}", suggestion_hint(.suggestion))]
    CodeNotInSlot {
        code: String,
        slot: Slot,
        suggestion: Option<String>,
    },

    #[error("{component} units {value} exceed the maximum of {max}", max = MAX_COMPONENT_UNITS)]
    UnitsTooHigh { component: &'static str, value: u8 },

    #[error("total {total} does not equal lec {lec} + lab {lab}")]
    TotalMismatch { lec: u8, lab: u8, total: u8 },

    #[error("{code} carries {actual} units but the curriculum lists {expected}")]
    UnitsDisagree {
        code: String,
        expected: Units,
        actual: Units,
    },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|code| format!(" (did you mean {code}?)"))
        .unwrap_or_default()
}

/// Check one entry against the rules applied before saving.
pub fn validate_entry(
    curriculum: &ReferenceCurriculum,
    entry: &ExtractedSubject,
) -> Result<(), ValidationRejection> {
    for (component, value) in [("lec", entry.lec_units), ("lab", entry.lab_units)] {
        if value > MAX_COMPONENT_UNITS {
            return Err(ValidationRejection::UnitsTooHigh { component, value });
        }
    }
    if !entry.units().is_consistent() {
        return Err(ValidationRejection::TotalMismatch {
            lec: entry.lec_units,
            lab: entry.lab_units,
            total: entry.total_units,
        });
    }

    let slot = entry.slot();
    let references = curriculum.subjects_for(slot);
    let Some(reference) = references
        .iter()
        .find(|reference| reference.code == entry.subject_code)
    else {
        return Err(ValidationRejection::CodeNotInSlot {
            code: entry.subject_code.clone(),
            slot,
            suggestion: nearest_code(&entry.subject_code, references.iter().map(|r| r.code.as_str())),
        });
    };

    if reference.units() != entry.units() {
        return Err(ValidationRejection::UnitsDisagree {
            code: reference.code.clone(),
            expected: reference.units(),
            actual: entry.units(),
        });
    }
    Ok(())
}

/// Every rejection in `entries`, tagged with the entry's index.
pub fn validate_all(
    curriculum: &ReferenceCurriculum,
    entries: &[ExtractedSubject],
) -> Vec<(usize, ValidationRejection)> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| validate_entry(curriculum, entry).err().map(|err| (idx, err)))
        .collect()
}

fn nearest_code<'c>(code: &str, candidates: impl Iterator<Item = &'c str>) -> Option<String> {
    let wanted = normalize_code(code);
    candidates
        .map(|candidate| (normalized_levenshtein(&wanted, &normalize_code(candidate)), candidate))
        .filter(|(score, _)| *score > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}
