//! Second, looser pass that recovers subjects the strict extractor missed.
//!
//! Elective codes are often split or glued by OCR (`GEC`, `Elec21`,
//! `1T Elec 2`), and some courses are only recognizable by their title
//! keywords. Everything this pass knows comes from the curriculum rules.

use std::collections::HashSet;

use tracing::debug;

use crate::core::config::ExtractionSettings;
use crate::core::model::{ExtractedSubject, Row, Slot};
use crate::curriculum::{ElectiveFamily, ReferenceCurriculum};
use crate::extract::patterns::{clean_token, is_header_row, split_alnum, ELECTIVE_WORD};

struct Piece<'t> {
    text: String,
    /// Whitespace token the piece was split from.
    token: &'t str,
}

pub struct RescuePass<'a> {
    curriculum: &'a ReferenceCurriculum,
    settings: &'a ExtractionSettings,
}

impl<'a> RescuePass<'a> {
    pub fn new(curriculum: &'a ReferenceCurriculum, settings: &'a ExtractionSettings) -> Self {
        Self {
            curriculum,
            settings,
        }
    }

    /// Subjects found in `rows` whose codes are not in `present`.
    pub fn recover(
        &self,
        rows: &[Row],
        slot: Slot,
        present: &HashSet<String>,
    ) -> Vec<ExtractedSubject> {
        let mut recovered: Vec<ExtractedSubject> = Vec::new();
        let mut seen: HashSet<String> = present.clone();

        for row in rows {
            let tokens = row.tokens();
            if tokens.is_empty() || is_header_row(&tokens) {
                continue;
            }
            for subject in self.electives_in(&tokens, slot) {
                if self.accepts(&subject, slot, &mut seen) {
                    recovered.push(subject);
                }
            }
            let text = row.text();
            for rule in &self.curriculum.rules.keyword_rules {
                if rule.matches(&text, &tokens) {
                    let subject =
                        ExtractedSubject::new(rule.code.clone(), rule.title.clone(), rule.units, slot);
                    if self.accepts(&subject, slot, &mut seen) {
                        recovered.push(subject);
                    }
                }
            }
        }
        recovered
    }

    fn electives_in(&self, tokens: &[String], slot: Slot) -> Vec<ExtractedSubject> {
        let pieces: Vec<Piece<'_>> = tokens
            .iter()
            .flat_map(|token| {
                split_alnum(token).into_iter().map(move |text| Piece {
                    text,
                    token: token.as_str(),
                })
            })
            .collect();

        let mut found = Vec::new();
        for (idx, piece) in pieces.iter().enumerate() {
            if !ELECTIVE_WORD.is_match(&piece.text.to_uppercase()) {
                continue;
            }
            let Some(family) = pieces[..idx]
                .iter()
                .rev()
                .find_map(|earlier| self.family_of(earlier))
            else {
                continue;
            };
            let number = pieces[idx + 1..]
                .iter()
                .take(self.settings.rescue_lookahead)
                .find_map(|later| {
                    later
                        .text
                        .parse::<u32>()
                        .ok()
                        .filter(|n| family.in_range(*n))
                });
            if let Some(number) = number {
                found.push(ExtractedSubject::new(
                    family.code(number),
                    family.fallback_title(number),
                    self.settings.default_units,
                    slot,
                ));
            }
        }
        found
    }

    fn family_of(&self, piece: &Piece<'_>) -> Option<&'a ElectiveFamily> {
        let whole = clean_token(piece.token);
        self.curriculum
            .rules
            .electives
            .iter()
            .find(|family| family.matches_prefix(&piece.text) || family.matches_prefix(&whole))
    }

    /// New code, and either unknown to the curriculum or listed under this slot.
    fn accepts(&self, subject: &ExtractedSubject, slot: Slot, seen: &mut HashSet<String>) -> bool {
        let code = &subject.subject_code;
        if seen.contains(code) {
            return false;
        }
        if let Some(expected) = self.curriculum.slot_of(code) {
            if expected != slot {
                debug!(%code, slot = %slot.label(), "rescued code belongs to another slot");
                return false;
            }
        }
        debug!(%code, slot = %slot.label(), "rescued subject");
        seen.insert(code.clone());
        true
    }
}
