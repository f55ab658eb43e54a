//! Strict row-level subject extraction.
//!
//! Each row is tested against the code shapes in priority order (fixed-unit
//! families, electives, single-letter artifacts, generic codes). Units come
//! from the rightmost run of small integers and the title from what sits
//! between the code and that run.

use std::collections::HashSet;

use tracing::debug;

use crate::core::config::ExtractionSettings;
use crate::core::model::{ExtractedSubject, Row, Slot, Units};
use crate::curriculum::CurriculumRules;
use crate::extract::patterns::{
    clean_token, fold_confusables, is_elective_keyword, is_filler, is_header_row, small_int,
    split_trailing_number, CODE_NUMBER, CODE_PREFIX, ELECTIVE_WORD, JOINED_ARTIFACT,
    JOINED_CODE, SINGLE_LETTER, THREE_DIGITS,
};
use crate::extract::title::correct_title;

const MIN_TITLE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeFamily {
    /// Index into `CurriculumRules::fixed_units`.
    FixedUnits { family: usize, number: u32 },
    /// Index into `CurriculumRules::electives`.
    Elective { family: usize, number: u32 },
    Artifact,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeMatch {
    pub code: String,
    pub family: CodeFamily,
    /// Leading tokens that make up the code.
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnitSplit {
    pub title: Vec<String>,
    pub units: Option<Units>,
}

pub struct SubjectExtractor<'a> {
    rules: &'a CurriculumRules,
    settings: &'a ExtractionSettings,
}

impl<'a> SubjectExtractor<'a> {
    pub fn new(rules: &'a CurriculumRules, settings: &'a ExtractionSettings) -> Self {
        Self { rules, settings }
    }

    pub fn extract(&self, rows: &[Row], slot: Slot) -> Vec<ExtractedSubject> {
        let mut subjects = Vec::new();
        let mut seen = HashSet::new();
        let mut idx = 0;

        while idx < rows.len() {
            let tokens = rows[idx].tokens();
            idx += 1;
            if tokens.is_empty() || is_header_row(&tokens) {
                continue;
            }
            let Some(code_match) = self.classify(&tokens) else {
                continue;
            };

            let mut split = split_units(&tokens[code_match.consumed..]);
            if !matches!(code_match.family, CodeFamily::Elective { .. }) {
                if let Some(next) = rows.get(idx).map(Row::tokens) {
                    if self.is_continuation(&next) {
                        idx += 1;
                        let tail = split_units(&next);
                        split.title.extend(tail.title);
                        split.units = split.units.or(tail.units);
                    }
                }
            }

            let (subject, title_changes) = self.build(&code_match, split, slot);
            if seen.insert(subject.subject_code.clone()) {
                debug!(
                    slot = %slot.label(),
                    code = %subject.subject_code,
                    units = %subject.units(),
                    "extracted subject"
                );
                for change in &title_changes {
                    debug!(code = %subject.subject_code, %change, "title corrected");
                }
                subjects.push(subject);
            } else {
                debug!(code = %subject.subject_code, "duplicate code in quadrant ignored");
            }
        }
        subjects
    }

    pub(crate) fn classify(&self, tokens: &[String]) -> Option<CodeMatch> {
        self.classify_fixed(tokens)
            .or_else(|| self.classify_elective(tokens))
            .or_else(|| classify_artifact(tokens))
            .or_else(|| classify_generic(tokens))
    }

    fn classify_fixed(&self, tokens: &[String]) -> Option<CodeMatch> {
        for (family_idx, family) in self.rules.fixed_units.iter().enumerate() {
            let prefix = fold_confusables(&family.prefix);
            for span in 1..=2.min(tokens.len()) {
                let joined: String = tokens[..span].iter().map(|t| clean_token(t)).collect();
                let found = match split_trailing_number(&joined) {
                    Some((head, number)) if fold_confusables(head) == prefix => {
                        Some((number, span))
                    }
                    _ if fold_confusables(&joined) == prefix => tokens
                        .get(span)
                        .and_then(|t| t.trim_end_matches('.').parse::<u32>().ok())
                        .map(|number| (number, span + 1)),
                    _ => None,
                };
                if let Some((number, consumed)) = found {
                    if (1..=family.max_number).contains(&number) {
                        return Some(CodeMatch {
                            code: family.code(number),
                            family: CodeFamily::FixedUnits {
                                family: family_idx,
                                number,
                            },
                            consumed,
                        });
                    }
                }
            }
        }
        None
    }

    fn classify_elective(&self, tokens: &[String]) -> Option<CodeMatch> {
        let [first, second, rest @ ..] = tokens else {
            return None;
        };
        let keyword = clean_token(second);
        let caps = ELECTIVE_WORD.captures(&keyword)?;
        let (number, consumed) = match caps.get(1) {
            Some(glued) => (glued.as_str().parse::<u32>().ok()?, 2),
            None => (
                rest.first()?.trim_end_matches('.').parse::<u32>().ok()?,
                3,
            ),
        };
        let (family_idx, family) = self
            .rules
            .electives
            .iter()
            .enumerate()
            .find(|(_, family)| family.matches_prefix(&clean_token(first)))?;
        if !family.in_range(number) {
            return None;
        }
        Some(CodeMatch {
            code: family.code(number),
            family: CodeFamily::Elective {
                family: family_idx,
                number,
            },
            consumed,
        })
    }

    /// Not denied, not a subject start and not an elective row.
    fn is_continuation(&self, tokens: &[String]) -> bool {
        !tokens.is_empty()
            && !is_header_row(tokens)
            && self.classify(tokens).is_none()
            && !tokens.iter().any(|t| is_elective_keyword(t))
    }

    /// The subject plus the title corrections applied to it.
    pub(crate) fn build(
        &self,
        code_match: &CodeMatch,
        split: UnitSplit,
        slot: Slot,
    ) -> (ExtractedSubject, Vec<String>) {
        let units = match code_match.family {
            CodeFamily::FixedUnits { family, .. } => self.rules.fixed_units[family].units,
            _ => split.units.unwrap_or(self.settings.default_units),
        };

        let raw: Vec<&str> = split
            .title
            .iter()
            .map(String::as_str)
            .filter(|t| !is_filler(t))
            .collect();
        let corrected = correct_title(&raw.join(" "));
        let mut title = cap_title(corrected.title, self.settings.max_title_len);
        if title.chars().count() < MIN_TITLE_LEN {
            title = self.fallback_title(code_match);
        }

        (
            ExtractedSubject::new(code_match.code.clone(), title, units, slot),
            corrected.changes,
        )
    }

    fn fallback_title(&self, code_match: &CodeMatch) -> String {
        match code_match.family {
            CodeFamily::FixedUnits { family, number } => {
                self.rules.fixed_units[family].fallback_title(number)
            }
            CodeFamily::Elective { family, number } => {
                self.rules.electives[family].fallback_title(number)
            }
            CodeFamily::Artifact | CodeFamily::Generic => format!("Course {}", code_match.code),
        }
    }
}

/// `C104` or `C 104`, where OCR dropped one letter of a two-letter prefix.
fn classify_artifact(tokens: &[String]) -> Option<CodeMatch> {
    let first = clean_token(tokens.first()?);
    if let Some(caps) = JOINED_ARTIFACT.captures(&first) {
        return Some(CodeMatch {
            code: format!("{} {}", &caps[1], &caps[2]),
            family: CodeFamily::Artifact,
            consumed: 1,
        });
    }
    let second = clean_token(tokens.get(1)?);
    if SINGLE_LETTER.is_match(&first) && THREE_DIGITS.is_match(&second) {
        return Some(CodeMatch {
            code: format!("{first} {second}"),
            family: CodeFamily::Artifact,
            consumed: 2,
        });
    }
    None
}

fn classify_generic(tokens: &[String]) -> Option<CodeMatch> {
    let raw = tokens.first()?;
    // Printed codes are uppercase; a mixed-case word is wrapped title text.
    if raw.chars().any(char::is_lowercase) {
        return None;
    }
    let first = clean_token(raw);
    if let Some(caps) = JOINED_CODE.captures(&first) {
        return Some(CodeMatch {
            code: format!("{} {}", &caps[1], &caps[2]),
            family: CodeFamily::Generic,
            consumed: 1,
        });
    }
    // Bracketed numbers like `(486` belong to titles, so only a hyphen is stripped here.
    let second = tokens.get(1)?.trim_start_matches('-').to_uppercase();
    if CODE_PREFIX.is_match(&first) && CODE_NUMBER.is_match(&second) {
        return Some(CodeMatch {
            code: format!("{first} {second}"),
            family: CodeFamily::Generic,
            consumed: 2,
        });
    }
    None
}

/// Split the tokens after a code into title words and a unit triple.
pub(crate) fn split_units(tokens: &[String]) -> UnitSplit {
    let values: Vec<Option<u8>> = tokens.iter().map(|t| small_int(t)).collect();

    let mut run = None;
    let mut idx = values.len();
    while idx > 0 {
        if values[idx - 1].is_none() {
            idx -= 1;
            continue;
        }
        let end = idx;
        while idx > 0 && values[idx - 1].is_some() {
            idx -= 1;
        }
        if end - idx >= 2 {
            run = Some((idx, end));
            break;
        }
    }

    let Some((start, end)) = run else {
        let mut title = tokens.to_vec();
        while title
            .last()
            .is_some_and(|t| small_int(t).is_some() || is_filler(t))
        {
            title.pop();
        }
        return UnitSplit { title, units: None };
    };

    let numbers: Vec<u8> = values[start..end].iter().flatten().copied().collect();
    if numbers.len() == 2 {
        return UnitSplit {
            title: tokens[..start].to_vec(),
            units: Some(Units::new(numbers[0], 0, numbers[1])),
        };
    }

    // Longer runs usually carry a stray digit from the title; prefer the
    // window whose parts add up.
    let offset = (0..=numbers.len() - 3)
        .find(|&w| u16::from(numbers[w]) + u16::from(numbers[w + 1]) == u16::from(numbers[w + 2]))
        .unwrap_or(0);
    UnitSplit {
        title: tokens[..start + offset].to_vec(),
        units: Some(Units::new(
            numbers[offset],
            numbers[offset + 1],
            numbers[offset + 2],
        )),
    }
}

fn cap_title(title: String, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title;
    }
    let mut capped: String = title.chars().take(max_len).collect();
    capped.push_str("...");
    capped
}
