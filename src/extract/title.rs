//! Lexical cleanup of recognized subject titles.
//!
//! Pure and curriculum-agnostic. Every step is idempotent and no step can
//! re-trigger an earlier one, so applying [`correct_title`] twice gives the
//! same result as applying it once.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Known misreadings, applied in order. Most are `m` read as `rn`.
const CONFUSIONS: &[(&str, &str)] = &[
    ("prograrnrning", "Programming"),
    ("prograrnming", "Programming"),
    ("programrning", "Programming"),
    ("cornputer", "Computer"),
    ("cornputing", "Computing"),
    ("cornmunication", "Communication"),
    ("inforrnation", "Information"),
    ("systerns", "Systems"),
    ("systern", "System"),
    ("mathernatics", "Mathematics"),
    ("managernent", "Management"),
    ("environrnent", "Environment"),
    ("multirnedia", "Multimedia"),
    ("algorithrns", "Algorithms"),
    ("rnodern", "Modern"),
    ("rnobile", "Mobile"),
    ("rnovement", "Movement"),
    ("netvvorking", "Networking"),
    ("vveb", "Web"),
];

static CONFUSION_PATTERNS: Lazy<Vec<(Regex, &'static str, &'static str)>> = Lazy::new(|| {
    CONFUSIONS
        .iter()
        .map(|(wrong, right)| {
            let pattern = format!(r"(?i)\b{wrong}\b");
            (Regex::new(&pattern).expect("valid confusion pattern"), *wrong, *right)
        })
        .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const NOISE_TOKENS: &[&str] = &[
    "|", "-", "_", "~", ".", ",", ":", ";", "*", "•", "—", "–", "none", "n/a",
];

const NOISE_CHARS: &[char] = &['|', '_', '~', '-', '.', ',', ':', ';', '*', '•', '—', '–'];

/// Uppercase words longer than two letters that stay uppercase.
const ACRONYMS: &[&str] = &[
    "ICT", "NSTP", "ROTC", "CWTS", "LTS", "GEC", "PATHFIT", "HCI", "OOP", "SQL", "IOT",
];

const LOWERCASE_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "of", "on", "or", "the",
    "to", "with", "vs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCorrection {
    pub title: String,
    pub changes: Vec<String>,
}

pub fn correct_title(title: &str) -> TitleCorrection {
    let mut changes = Vec::new();

    let mut text: String = title.nfkc().collect();
    if text != title {
        changes.push("unicode normalized".to_string());
    }

    let balanced = remove_unmatched_parens(&text);
    if balanced != text {
        changes.push("removed unmatched parentheses".to_string());
        text = balanced;
    }

    let trimmed = strip_noise(&text);
    if trimmed != text {
        changes.push("stripped noise tokens".to_string());
        text = trimmed;
    }

    let repaired = repair_digits_in_words(&text);
    if repaired != text {
        changes.push(format!("digit-letter repair: {text} → {repaired}"));
        text = repaired;
    }

    for (pattern, wrong, right) in CONFUSION_PATTERNS.iter() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, *right).into_owned();
            changes.push(format!("{wrong} → {right}"));
        }
    }

    let collapsed = WHITESPACE.replace_all(text.trim(), " ").into_owned();
    if collapsed != text {
        changes.push("normalized whitespace".to_string());
        text = collapsed;
    }

    let capitalized = recapitalize(&text);
    if capitalized != text {
        changes.push("re-capitalized".to_string());
        text = capitalized;
    }

    TitleCorrection {
        title: text,
        changes,
    }
}

fn remove_unmatched_parens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut keep = vec![true; chars.len()];
    let mut open = Vec::new();
    for (idx, c) in chars.iter().enumerate() {
        match c {
            '(' => open.push(idx),
            ')' => {
                if open.pop().is_none() {
                    keep[idx] = false;
                }
            }
            _ => {}
        }
    }
    for idx in open {
        keep[idx] = false;
    }
    chars
        .into_iter()
        .zip(keep)
        .filter_map(|(c, keep)| keep.then_some(c))
        .collect()
}

fn is_noise_token(token: &str) -> bool {
    NOISE_TOKENS
        .iter()
        .any(|noise| token.eq_ignore_ascii_case(noise))
}

fn strip_noise(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    loop {
        let before = tokens.len();
        while tokens.last().is_some_and(|t| is_noise_token(t)) {
            tokens.pop();
        }
        while tokens.first().is_some_and(|t| is_noise_token(t)) {
            tokens.remove(0);
        }
        if let Some(last) = tokens.last_mut() {
            let current: &str = *last;
            *last = current.trim_end_matches(NOISE_CHARS);
        }
        if let Some(first) = tokens.first_mut() {
            let current: &str = *first;
            *first = current.trim_start_matches(NOISE_CHARS);
        }
        tokens.retain(|t| !t.is_empty());
        if tokens.len() == before
            && !tokens.last().is_some_and(|t| t.ends_with(NOISE_CHARS))
            && !tokens.first().is_some_and(|t| t.starts_with(NOISE_CHARS))
        {
            break;
        }
    }
    tokens.join(" ")
}

/// `0`, `1` and `5` wedged between letters are read back as `o`, `l`, `s`.
fn repair_digits_in_words(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(idx, &c)| {
            let between_letters = idx > 0
                && idx + 1 < chars.len()
                && chars[idx - 1].is_alphabetic()
                && chars[idx + 1].is_alphabetic();
            match (c, between_letters) {
                ('0', true) => 'o',
                ('1', true) => 'l',
                ('5', true) => 's',
                _ => c,
            }
        })
        .collect()
}

fn is_roman_numeral(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| matches!(c, 'I' | 'V' | 'X'))
}

fn keeps_case(word: &str) -> bool {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 || word.chars().any(char::is_lowercase) {
        return false;
    }
    let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
    letters <= 2
        || word.chars().any(|c| c.is_ascii_digit())
        || is_roman_numeral(bare)
        || ACRONYMS.contains(&bare)
}

fn capitalize_parts(word: &str) -> String {
    word.split('-')
        .map(|part| {
            let mut seen_letter = false;
            part.chars()
                .map(|c| {
                    if !c.is_alphabetic() {
                        c.to_string()
                    } else if seen_letter {
                        c.to_lowercase().collect()
                    } else {
                        seen_letter = true;
                        c.to_uppercase().collect()
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn recapitalize(text: &str) -> String {
    text.split(' ')
        .enumerate()
        .map(|(idx, word)| {
            let lowered = word.to_lowercase();
            if idx > 0 && LOWERCASE_WORDS.contains(&lowered.as_str()) {
                lowered
            } else if keeps_case(word) {
                word.to_string()
            } else {
                capitalize_parts(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixes_rn_confusion() {
        let corrected = correct_title("Cornputer Prograrnming 1");
        assert_eq!(corrected.title, "Computer Programming 1");
        assert!(corrected.changes.iter().any(|c| c.contains("Programming")));
    }

    #[test]
    fn strips_trailing_noise_and_stray_parens() {
        assert_eq!(
            correct_title("Practicum (486 Hours) | -").title,
            "Practicum (486 Hours)"
        );
        assert_eq!(correct_title("Ethics )").title, "Ethics");
        assert_eq!(correct_title("(Art Appreciation").title, "Art Appreciation");
    }

    #[test]
    fn recapitalizes_with_lowercase_prepositions() {
        assert_eq!(
            correct_title("DATA STRUCTURES AND ALGORITHMS").title,
            "Data Structures and Algorithms"
        );
        assert_eq!(
            correct_title("the contemporary   world").title,
            "The Contemporary World"
        );
        assert_eq!(
            correct_title("object-oriented programming").title,
            "Object-Oriented Programming"
        );
    }

    #[test]
    fn keeps_acronyms_and_numerals() {
        assert_eq!(
            correct_title("Living in the IT Era").title,
            "Living in the IT Era"
        );
        assert_eq!(
            correct_title("NATIONAL SERVICE TRAINING PROGRAM II").title,
            "National Service Training Program II"
        );
    }

    #[test]
    fn repairs_digits_inside_words() {
        assert_eq!(correct_title("C0mputer Prob1em Solving").title, "Computer Problem Solving");
    }

    #[test]
    fn normalizes_compatibility_characters() {
        assert_eq!(correct_title("Scientiﬁc Computing").title, "Scientific Computing");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "Cornputer Prograrnming 1",
            "DATA STRUCTURES AND ALGORITHMS",
            "  (Intro to c0mputing ) -- |",
            "THE IT ERA",
            "a0b1c Web 2.0 Netvvorking",
            "Practicum (486 Hours).",
            "",
            "| - _",
            "e-COMMERCE and SOCIETY",
            "x DATA",
            "a IT",
        ];
        for sample in samples {
            let once = correct_title(sample).title;
            let twice = correct_title(&once);
            assert_eq!(twice.title, once, "not stable for {sample:?}");
            assert!(twice.changes.is_empty(), "changes on second pass for {sample:?}");
        }
    }
}
