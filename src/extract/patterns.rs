//! Token shapes shared by the strict extractor and the rescue pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading words of header, footer and section rows.
const HEADER_WORDS: &[&str] = &[
    "YEAR", "SEMESTER", "SEM", "COURSE", "COURSES", "CODE", "DESCRIPTIVE", "DESCRIPTION",
    "TITLE", "SUBJECT", "SUBJECTS", "UNITS", "UNIT", "LEC", "LAB", "TOTAL", "PREREQUISITE",
    "PREREQUISITES", "PRE-REQUISITE", "PRE-REQUISITES", "PREREQ", "GRADE", "GRADES",
    "REMARKS", "CURRICULUM", "SUMMER", "FIRST", "SECOND", "THIRD", "FOURTH", "1ST", "2ND",
    "3RD", "4TH", "NOTE", "PROGRAM", "PAGE", "CHECKLIST", "BACHELOR", "HRS", "NO",
];

/// Column labels and separators that never belong to a title.
const FILLER_WORDS: &[&str] = &[
    "LEC", "LAB", "UNITS", "UNIT", "HRS", "NONE", "N/A", "PREREQ", "PRE-REQ", "PREREQUISITE",
    "|", "-", "—", "_",
];

pub static JOINED_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z])(\d{3})$").expect("valid regex"));
pub static SINGLE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]$").expect("valid regex"));
pub static THREE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}$").expect("valid regex"));
pub static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,10}$").expect("valid regex"));
pub static CODE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}[A-Z]?$").expect("valid regex"));
pub static JOINED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2,10})[-.]?(\d{1,3}[A-Z]?)$").expect("valid regex"));
/// `ELEC`, `ELEC.`, `ELECTIVE`, optionally with the number glued on.
pub static ELECTIVE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ELEC(?:TIVE)?\.?(\d{1,2})?$").expect("valid regex"));

/// Uppercase and drop surrounding punctuation, keeping inner hyphens and dots.
pub fn clean_token(token: &str) -> String {
    token
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '|' | '(' | ')' | '[' | ']' | '*'))
        .to_uppercase()
}

pub fn is_header_token(token: &str) -> bool {
    let cleaned = clean_token(token);
    let cleaned = cleaned.trim_end_matches('.');
    HEADER_WORDS.contains(&cleaned)
}

/// A row is a header when its leading token is on the deny-list.
pub fn is_header_row(tokens: &[String]) -> bool {
    tokens.first().is_some_and(|token| is_header_token(token))
}

pub fn is_filler(token: &str) -> bool {
    FILLER_WORDS.contains(&clean_token(token).as_str())
}

/// Integer in `0..=5`, the only values a unit column holds.
pub fn small_int(token: &str) -> Option<u8> {
    let token = token.trim_end_matches('.');
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<u8>().ok().filter(|n| *n <= 5)
}

/// `Elec`, `Elec.`, `Elective` or `Elec21`, but not words like `Electronics`.
pub fn is_elective_keyword(token: &str) -> bool {
    ELECTIVE_WORD.is_match(&clean_token(token))
}

/// Fold characters OCR commonly swaps inside all-letter codes.
pub fn fold_confusables(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| match c.to_ascii_uppercase() {
            '1' | 'L' | '!' | '|' => 'I',
            '0' => 'O',
            '5' => 'S',
            other => other,
        })
        .collect()
}

/// Split a token into its letter and digit runs, dropping punctuation.
pub fn split_alnum(token: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;
    for c in token.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            parts.push(std::mem::take(&mut current));
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Split `PATHFIT2` into `("PATHFIT", 2)`.
pub fn split_trailing_number(token: &str) -> Option<(&str, u32)> {
    let digits_at = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    if digits_at == 0 {
        return None;
    }
    let number = token[digits_at..].parse().ok()?;
    Some((&token[..digits_at], number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_header_rows() {
        let row = |tokens: &[&str]| tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert!(is_header_row(&row(&["Course", "Code"])));
        assert!(is_header_row(&row(&["TOTAL", "23"])));
        assert!(is_header_row(&row(&["First", "Year"])));
        assert!(is_header_row(&row(&["Pre-requisite"])));
        assert!(!is_header_row(&row(&["CC", "101"])));
        assert!(!is_header_row(&[]));
    }

    #[test]
    fn elective_keyword_is_a_whole_word() {
        assert!(is_elective_keyword("Elec"));
        assert!(is_elective_keyword("Elec."));
        assert!(is_elective_keyword("ELECTIVE"));
        assert!(is_elective_keyword("Elec21"));
        assert!(!is_elective_keyword("Electronics"));
        assert!(!is_elective_keyword("Electricity,"));
    }

    #[test]
    fn small_ints_are_unit_values() {
        assert_eq!(small_int("3"), Some(3));
        assert_eq!(small_int("0"), Some(0));
        assert_eq!(small_int("3."), Some(3));
        assert_eq!(small_int("6"), None);
        assert_eq!(small_int("101"), None);
        assert_eq!(small_int("a"), None);
    }

    #[test]
    fn folds_ocr_confusables() {
        assert_eq!(fold_confusables("PATHF1T"), "PATHFIT");
        assert_eq!(fold_confusables("P.A.T.H.FIT"), "PATHFIT");
        assert_eq!(fold_confusables("pathflt"), "PATHFIT");
    }

    #[test]
    fn splits_letter_digit_runs() {
        assert_eq!(split_alnum("Elec21"), vec!["Elec", "21"]);
        assert_eq!(split_alnum("IT-Elec.3"), vec!["IT", "Elec", "3"]);
        assert_eq!(split_trailing_number("PATHFIT2"), Some(("PATHFIT", 2)));
        assert_eq!(split_trailing_number("PATHF1T"), None);
        assert_eq!(split_trailing_number("12"), None);
    }
}
