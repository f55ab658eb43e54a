use crate::core::model::{ExtractedSubject, ReferenceSubject};
use crate::reconcile::compare::code_similarity;

#[derive(Debug, Clone, Copy)]
pub struct ReferenceMatch<'r> {
    pub reference: &'r ReferenceSubject,
    pub score: u8,
}

/// Best-scoring reference at or above `threshold`; earlier references win ties.
pub fn best_match<'r>(
    code: &str,
    candidates: &'r [ReferenceSubject],
    threshold: u8,
) -> Option<ReferenceMatch<'r>> {
    let mut best: Option<ReferenceMatch<'r>> = None;
    for reference in candidates {
        let score = code_similarity(code, &reference.code);
        if score < threshold {
            continue;
        }
        if best.map_or(true, |current| score > current.score) {
            best = Some(ReferenceMatch { reference, score });
        }
    }
    best
}

/// Overwrite code, name and units from the reference; returns one entry per
/// changed field.
pub fn apply_reference(subject: &mut ExtractedSubject, reference: &ReferenceSubject) -> Vec<String> {
    let prefix = format!("{} {}", subject.slot().label(), subject.subject_code);
    let mut changes = Vec::new();

    if subject.subject_code != reference.code {
        changes.push(format!(
            "{prefix}: code '{}' → '{}'",
            subject.subject_code, reference.code
        ));
        subject.subject_code = reference.code.clone();
    }
    if subject.subject_name != reference.name {
        changes.push(format!(
            "{prefix}: name '{}' → '{}'",
            subject.subject_name, reference.name
        ));
        subject.subject_name = reference.name.clone();
    }
    for (field, current, canonical) in [
        ("lec", &mut subject.lec_units, reference.lec),
        ("lab", &mut subject.lab_units, reference.lab),
        ("total", &mut subject.total_units, reference.total),
    ] {
        if *current != canonical {
            changes.push(format!("{prefix}: {field} {current} → {canonical}"));
            *current = canonical;
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Semester, Slot, Units};
    use pretty_assertions::assert_eq;

    fn references() -> Vec<ReferenceSubject> {
        vec![
            ReferenceSubject::new("IT 201", "Networking 1", 2, 1, 3),
            ReferenceSubject::new("IT 202", "Object-Oriented Programming", 2, 1, 3),
            ReferenceSubject::new("CC 104", "Data Structures and Algorithms", 2, 1, 3),
        ]
    }

    #[test]
    fn picks_highest_score() {
        let refs = references();
        let found = best_match("C 104", &refs, 80).unwrap();
        assert_eq!(found.reference.code, "CC 104");
        assert_eq!(found.score, 90);
    }

    #[test]
    fn earlier_reference_wins_ties() {
        let refs = references();
        let found = best_match("IT 203", &refs, 80).unwrap();
        assert_eq!(found.reference.code, "IT 201");
    }

    #[test]
    fn below_threshold_is_unmatched() {
        assert!(best_match("GEC 7", &references(), 80).is_none());
    }

    #[test]
    fn logs_each_changed_field() {
        let refs = references();
        let mut subject = ExtractedSubject::new(
            "C 104",
            "Data Structures",
            Units::new(3, 0, 3),
            Slot::new(2, Semester::First),
        );
        let changes = apply_reference(&mut subject, &refs[2]);
        assert_eq!(
            changes,
            vec![
                "Y2S1 C 104: code 'C 104' → 'CC 104'",
                "Y2S1 C 104: name 'Data Structures' → 'Data Structures and Algorithms'",
                "Y2S1 C 104: lec 3 → 2",
                "Y2S1 C 104: lab 0 → 1",
            ]
        );
        assert!(subject.matches_reference(&refs[2]));
        assert!(apply_reference(&mut subject, &refs[2]).is_empty());
    }
}
