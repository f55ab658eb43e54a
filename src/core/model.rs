use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    File,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Camera => write!(f, "camera"),
            CaptureSource::File => write!(f, "file"),
        }
    }
}

/// Raw upload as received from the user.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub source: CaptureSource,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, source: CaptureSource) -> Self {
        Self { bytes, source }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    First,
    Second,
    Summer,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semester::First => write!(f, "1st Semester"),
            Semester::Second => write!(f, "2nd Semester"),
            Semester::Summer => write!(f, "Summer"),
        }
    }
}

impl FromStr for Semester {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "1st" | "first" => Ok(Semester::First),
            "2" | "2nd" | "second" => Ok(Semester::Second),
            "3" | "summer" | "midyear" => Ok(Semester::Summer),
            other => Err(format!("unknown semester: {other}")),
        }
    }
}

/// One `(yearLevel, semester)` cell of a curriculum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub year: u8,
    pub semester: Semester,
}

impl Slot {
    pub fn new(year: u8, semester: Semester) -> Self {
        Self { year, semester }
    }

    /// Compact label used in logs and fix entries, e.g. `Y2S1`.
    pub fn label(&self) -> String {
        let sem = match self.semester {
            Semester::First => "S1",
            Semester::Second => "S2",
            Semester::Summer => "SU",
        };
        format!("Y{}{}", self.year, sem)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Year {}, {}", self.year, self.semester)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Units {
    pub lec: u8,
    pub lab: u8,
    pub total: u8,
}

impl Units {
    pub const fn new(lec: u8, lab: u8, total: u8) -> Self {
        Self { lec, lab, total }
    }

    pub fn is_consistent(&self) -> bool {
        u16::from(self.lec) + u16::from(self.lab) == u16::from(self.total)
    }
}

impl Default for Units {
    fn default() -> Self {
        Self::new(3, 0, 3)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.lec, self.lab, self.total)
    }
}

/// A piece of recognized text with its position on the quadrant image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionedTextElement {
    pub text: String,
    pub bbox: BBox,
}

impl PositionedTextElement {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Elements that share a vertical band, ordered left to right.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub elements: Vec<PositionedTextElement>,
}

impl Row {
    pub fn new(elements: Vec<PositionedTextElement>) -> Self {
        Self { elements }
    }

    /// Anchor y used for row clustering (the first member's y).
    pub fn anchor_y(&self) -> f32 {
        self.elements.first().map(|e| e.bbox.y()).unwrap_or(0.0)
    }

    /// Whitespace tokens of all elements in reading order.
    pub fn tokens(&self) -> Vec<String> {
        self.elements
            .iter()
            .flat_map(|element| element.text.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    pub fn text(&self) -> String {
        self.tokens().join(" ")
    }
}

/// Progress of a subject. Extraction always starts at `Upcoming`; the other
/// states arrive through reviewed subject files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

/// Draft subject record produced by extraction and corrected by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSubject {
    pub subject_code: String,
    pub subject_name: String,
    pub lec_units: u8,
    pub lab_units: u8,
    pub total_units: u8,
    pub year_level: u8,
    pub semester: Semester,
    #[serde(default)]
    pub status: SubjectStatus,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
}

impl ExtractedSubject {
    pub fn new(code: impl Into<String>, name: impl Into<String>, units: Units, slot: Slot) -> Self {
        Self {
            subject_code: code.into(),
            subject_name: name.into(),
            lec_units: units.lec,
            lab_units: units.lab,
            total_units: units.total,
            year_level: slot.year,
            semester: slot.semester,
            status: SubjectStatus::Upcoming,
            grade: None,
            instructor: None,
        }
    }

    pub fn from_reference(reference: &ReferenceSubject, slot: Slot) -> Self {
        Self::new(
            reference.code.clone(),
            reference.name.clone(),
            reference.units(),
            slot,
        )
    }

    pub fn slot(&self) -> Slot {
        Slot::new(self.year_level, self.semester)
    }

    pub fn units(&self) -> Units {
        Units::new(self.lec_units, self.lab_units, self.total_units)
    }

    /// Exact equality of code, name and all three unit counts.
    pub fn matches_reference(&self, reference: &ReferenceSubject) -> bool {
        self.subject_code == reference.code
            && self.subject_name == reference.name
            && self.units() == reference.units()
    }
}

/// Canonical ground-truth entry of a reference curriculum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceSubject {
    pub code: String,
    pub name: String,
    pub lec: u8,
    pub lab: u8,
    pub total: u8,
}

impl ReferenceSubject {
    pub fn new(code: &str, name: &str, lec: u8, lab: u8, total: u8) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            lec,
            lab,
            total,
        }
    }

    pub fn units(&self) -> Units {
        Units::new(self.lec, self.lab, self.total)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub subjects: Vec<ExtractedSubject>,
    pub fixes: Vec<String>,
    pub warnings: Vec<String>,
}

/// Per-slot completeness against the reference curriculum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotCompleteness {
    pub slot: Slot,
    pub expected: usize,
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccuracyReport {
    /// Percentage in `0.0..=100.0`.
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
    pub slots: Vec<SlotCompleteness>,
}

impl AccuracyReport {
    pub fn missing_codes(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .flat_map(|slot| slot.missing.iter().map(String::as_str))
    }
}
