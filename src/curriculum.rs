//! Reference curricula: the ground-truth subject tables plus the
//! curriculum-specific recovery rules used by extraction and reconciliation.
//!
//! A curriculum is a JSON document keyed by a program id. The `bsit`
//! curriculum ships embedded in the binary; others are loaded from disk.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::ConfigError;
use crate::core::model::{ReferenceSubject, Semester, Slot, Units};

const BUILTIN_BSIT: &str = include_str!("../curricula/bsit.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSubjects {
    pub year: u8,
    pub semester: Semester,
    pub subjects: Vec<ReferenceSubject>,
}

/// Department elective family such as `GEC Elec 21..=29`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectiveFamily {
    pub prefix: String,
    /// OCR misreadings of the prefix that should be accepted too.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub min: u32,
    pub max: u32,
    /// Generic title stem; the elective number is appended.
    pub title: String,
}

impl ElectiveFamily {
    pub fn matches_prefix(&self, token: &str) -> bool {
        let token = token.trim_end_matches('.');
        token.eq_ignore_ascii_case(&self.prefix)
            || self
                .aliases
                .iter()
                .any(|alias| token.eq_ignore_ascii_case(alias.trim_end_matches('.')))
    }

    pub fn in_range(&self, number: u32) -> bool {
        (self.min..=self.max).contains(&number)
    }

    pub fn code(&self, number: u32) -> String {
        format!("{} Elec {}", self.prefix, number)
    }

    pub fn fallback_title(&self, number: u32) -> String {
        format!("{} {}", self.title, number)
    }
}

/// Course family whose units never vary (e.g. `PATHFIT 1..=4` at 2/0/2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedUnitFamily {
    pub prefix: String,
    pub max_number: u32,
    pub units: Units,
    pub title: String,
}

impl FixedUnitFamily {
    pub fn code(&self, number: u32) -> String {
        format!("{} {}", self.prefix, number)
    }

    pub fn fallback_title(&self, number: u32) -> String {
        format!("{} {}", self.title, number)
    }
}

/// Recovers one specific course from co-occurring keywords in a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Every keyword must appear (case-insensitive substring of the row text).
    pub all_of: Vec<String>,
    /// At least one must appear as a whole token, when non-empty.
    #[serde(default)]
    pub any_of: Vec<String>,
    pub code: String,
    pub title: String,
    pub units: Units,
}

impl KeywordRule {
    pub fn matches(&self, row_text: &str, tokens: &[String]) -> bool {
        let lowered = row_text.to_lowercase();
        let all = self
            .all_of
            .iter()
            .all(|keyword| lowered.contains(&keyword.to_lowercase()));
        let any = self.any_of.is_empty()
            || self.any_of.iter().any(|keyword| {
                tokens
                    .iter()
                    .any(|token| token.eq_ignore_ascii_case(keyword))
            });
        all && any
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumRules {
    #[serde(default)]
    pub electives: Vec<ElectiveFamily>,
    #[serde(default)]
    pub fixed_units: Vec<FixedUnitFamily>,
    #[serde(default)]
    pub keyword_rules: Vec<KeywordRule>,
    /// Codes injected by the reconciler when their slot is otherwise present.
    #[serde(default)]
    pub critical: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceCurriculum {
    pub program: String,
    pub name: String,
    pub slots: Vec<SlotSubjects>,
    #[serde(default)]
    pub rules: CurriculumRules,
}

impl ReferenceCurriculum {
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let curriculum: ReferenceCurriculum = serde_json::from_str(data)?;
        curriculum.check()?;
        Ok(curriculum)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn builtin(program: &str) -> Result<Self, ConfigError> {
        match program {
            "bsit" => Self::from_json_str(BUILTIN_BSIT),
            other => Err(ConfigError::UnknownProgram(other.to_string())),
        }
    }

    /// Reference subjects for a slot; empty when the slot is not part of the program.
    pub fn subjects_for(&self, slot: Slot) -> &[ReferenceSubject] {
        self.slots
            .iter()
            .find(|entry| entry.year == slot.year && entry.semester == slot.semester)
            .map(|entry| entry.subjects.as_slice())
            .unwrap_or(&[])
    }

    /// Locate a reference subject by exact code.
    pub fn find(&self, code: &str) -> Option<(Slot, &ReferenceSubject)> {
        self.slots.iter().find_map(|entry| {
            entry
                .subjects
                .iter()
                .find(|subject| subject.code == code)
                .map(|subject| (Slot::new(entry.year, entry.semester), subject))
        })
    }

    pub fn slot_of(&self, code: &str) -> Option<Slot> {
        self.find(code).map(|(slot, _)| slot)
    }

    pub fn subject_count(&self) -> usize {
        self.slots.iter().map(|entry| entry.subjects.len()).sum()
    }

    fn check(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            program: self.program.clone(),
            reason,
        };

        let mut seen_slots = HashSet::new();
        for entry in &self.slots {
            let slot = Slot::new(entry.year, entry.semester);
            if !seen_slots.insert(slot) {
                return Err(invalid(format!("slot {slot} listed twice")));
            }
            let mut codes = HashSet::new();
            for subject in &entry.subjects {
                if !subject.units().is_consistent() {
                    return Err(invalid(format!(
                        "{} units {} do not add up",
                        subject.code,
                        subject.units()
                    )));
                }
                if !codes.insert(subject.code.as_str()) {
                    return Err(invalid(format!("{} duplicated in {slot}", subject.code)));
                }
            }
        }

        for code in &self.rules.critical {
            if self.find(code).is_none() {
                return Err(invalid(format!("critical subject {code} is not in the curriculum")));
            }
        }
        for family in &self.rules.electives {
            if family.min > family.max {
                return Err(invalid(format!(
                    "elective family {} has an empty range",
                    family.prefix
                )));
            }
        }
        Ok(())
    }
}

/// Curricula addressable by program id.
#[derive(Debug, Clone, Default)]
pub struct CurriculumRegistry {
    programs: BTreeMap<String, ReferenceCurriculum>,
}

impl CurriculumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.insert(ReferenceCurriculum::builtin("bsit")?);
        Ok(registry)
    }

    pub fn insert(&mut self, curriculum: ReferenceCurriculum) {
        debug!(program = %curriculum.program, "registered curriculum");
        self.programs.insert(curriculum.program.clone(), curriculum);
    }

    /// Load a curriculum file, replacing any program with the same id.
    pub fn load_file(&mut self, path: &Path) -> Result<&ReferenceCurriculum, ConfigError> {
        let curriculum = ReferenceCurriculum::from_path(path)?;
        let program = curriculum.program.clone();
        self.insert(curriculum);
        self.get(&program)
    }

    pub fn get(&self, program: &str) -> Result<&ReferenceCurriculum, ConfigError> {
        self.programs
            .get(program)
            .ok_or_else(|| ConfigError::UnknownProgram(program.to_string()))
    }

    pub fn programs(&self) -> impl Iterator<Item = &ReferenceCurriculum> {
        self.programs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_curriculum_is_consistent() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        assert_eq!(curriculum.slots.len(), 8);
        assert!(curriculum.subject_count() > 40);
        for code in &curriculum.rules.critical {
            assert!(curriculum.find(code).is_some(), "{code} missing");
        }
    }

    #[test]
    fn finds_slot_of_code() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        assert_eq!(
            curriculum.slot_of("GEC Elec 21"),
            Some(Slot::new(2, Semester::First))
        );
        assert_eq!(curriculum.slot_of("XYZ 999"), None);
    }

    #[test]
    fn rejects_inconsistent_units() {
        let data = r#"{
            "program": "broken",
            "name": "Broken",
            "slots": [{"year": 1, "semester": "first", "subjects": [
                {"code": "AB 101", "name": "Bad", "lec": 2, "lab": 1, "total": 4}
            ]}]
        }"#;
        let err = ReferenceCurriculum::from_json_str(data).unwrap_err();
        assert!(err.to_string().contains("do not add up"));
    }

    #[test]
    fn rejects_unknown_critical_code() {
        let data = r#"{
            "program": "broken",
            "name": "Broken",
            "slots": [],
            "rules": {"critical": ["AB 101"]}
        }"#;
        assert!(matches!(
            ReferenceCurriculum::from_json_str(data),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn registry_resolves_by_program_id() {
        let registry = CurriculumRegistry::with_builtins().unwrap();
        assert_eq!(registry.get("bsit").unwrap().program, "bsit");
        assert!(matches!(
            registry.get("bscs"),
            Err(ConfigError::UnknownProgram(_))
        ));
    }

    #[test]
    fn keyword_rule_requires_whole_token_for_any_of() {
        let rule = KeywordRule {
            all_of: vec!["capstone".to_string()],
            any_of: vec!["2".to_string()],
            code: "IT 403".to_string(),
            title: "Capstone Project and Research 2".to_string(),
            units: Units::new(3, 0, 3),
        };
        let tokens = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        let hit = "Capstone Project 2 3 0 3";
        let miss = "IT 308 Capstone Project 1 3 0 3";
        assert!(rule.matches(hit, &tokens(hit)));
        assert!(!rule.matches(miss, &tokens(miss)));
    }
}
