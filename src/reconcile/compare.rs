/// Uppercase alphanumerics only, so `cc-104`, `CC 104` and `CC104` compare equal.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Similarity of two subject codes in `0..=100`.
///
/// Identical after normalization scores 100 and containment in either
/// direction scores 90. Anything else is the share of positions holding the
/// same character, measured against the longer code.
pub fn code_similarity(a: &str, b: &str) -> u8 {
    let a = normalize_code(a);
    let b = normalize_code(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }
    if a.contains(&b) || b.contains(&a) {
        return 90;
    }

    let same = a
        .chars()
        .zip(b.chars())
        .filter(|(left, right)| left == right)
        .count();
    let longer = a.chars().count().max(b.chars().count());
    // same <= longer, so the ratio stays within 0..=100.
    (same * 100 / longer) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_codes_score_full() {
        assert_eq!(code_similarity("CC 104", "cc-104"), 100);
        assert_eq!(code_similarity("IT Elec 1", "IT Elec 1"), 100);
    }

    #[test]
    fn containment_scores_ninety() {
        assert_eq!(code_similarity("C 104", "CC 104"), 90);
        assert_eq!(code_similarity("CC 104", "C 104"), 90);
    }

    #[test]
    fn positional_overlap_for_the_rest() {
        assert_eq!(code_similarity("IT 201", "IT 202"), 80);
        assert_eq!(code_similarity("IT 201", "CC 105"), 20);
        assert_eq!(code_similarity("IT 2O1", "IT 201"), 80);
    }

    #[test]
    fn empty_codes_never_match() {
        assert_eq!(code_similarity("", "CC 104"), 0);
        assert_eq!(code_similarity("--", ""), 0);
    }
}
