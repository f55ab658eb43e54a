use crate::core::model::ExtractedSubject;
use crate::extract::patterns::is_header_token;

/// Why a code cannot be a real subject, if it cannot.
pub fn garbage_reason(code: &str) -> Option<&'static str> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Some("empty code");
    }
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.chars().count() == 1 && compact.chars().all(char::is_alphabetic) {
        return Some("single letter");
    }
    if compact.chars().all(|c| c.is_ascii_digit()) {
        return Some("bare number");
    }
    if trimmed.split_whitespace().next().is_some_and(is_header_token) {
        return Some("section header");
    }
    None
}

/// Drop garbage entries, returning the survivors and one warning per removal.
pub fn remove_garbage(subjects: Vec<ExtractedSubject>) -> (Vec<ExtractedSubject>, Vec<String>) {
    let mut warnings = Vec::new();
    let kept = subjects
        .into_iter()
        .filter(|subject| match garbage_reason(&subject.subject_code) {
            Some(reason) => {
                warnings.push(format!(
                    "{} removed '{}' ({reason})",
                    subject.slot().label(),
                    subject.subject_code
                ));
                false
            }
            None => true,
        })
        .collect();
    (kept, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_garbage_codes() {
        assert_eq!(garbage_reason(""), Some("empty code"));
        assert_eq!(garbage_reason(" C "), Some("single letter"));
        assert_eq!(garbage_reason("104"), Some("bare number"));
        assert_eq!(garbage_reason("YEAR 2"), Some("section header"));
        assert_eq!(garbage_reason("C 104"), None);
        assert_eq!(garbage_reason("GEC Elec 21"), None);
    }
}
