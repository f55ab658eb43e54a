use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::config::PipelineSettings;
use crate::core::errors::{PersistenceError, PipelineError, ProcessingStage};
use crate::core::model::{
    AccuracyReport, CaptureSource, ExtractedSubject, ReconciliationResult, Slot, SourceImage,
};
use crate::curriculum::ReferenceCurriculum;
use crate::export::json_export::JsonExporter;
use crate::export::text_export::TextExporter;
use crate::export::Exporter;
use crate::extract::{reconstruct_rows, RescuePass, SubjectExtractor};
use crate::imaging::{detect_year_range, preprocess, split_quadrants, QuadrantPosition, YearRange};
use crate::ocr::{Recognition, TextRecognizer};
use crate::reconcile::Reconciler;
use crate::store::SubjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    Idle,
    SelectingFile,
    Preprocessing,
    DetectingYear,
    Splitting,
    Recognizing,
    Extracting,
    Reconciling,
    Review,
    NoSubjectsFound,
    ProcessingError,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Review | PipelineState::NoSubjectsFound | PipelineState::ProcessingError
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::SelectingFile => "selecting-file",
            PipelineState::Preprocessing => "preprocessing",
            PipelineState::DetectingYear => "detecting-year",
            PipelineState::Splitting => "splitting",
            PipelineState::Recognizing => "recognizing",
            PipelineState::Extracting => "extracting",
            PipelineState::Reconciling => "reconciling",
            PipelineState::Review => "review",
            PipelineState::NoSubjectsFound => "no-subjects-found",
            PipelineState::ProcessingError => "processing-error",
        };
        f.write_str(name)
    }
}

/// Per-quadrant extraction counts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuadrantSummary {
    pub position: QuadrantPosition,
    pub slot: Slot,
    pub rows: usize,
    pub extracted: usize,
    pub rescued: usize,
}

/// Everything a run produced. Borrowed by [`persist`] and the exporters so a
/// failed save can be retried without re-running recognition.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quadrants: Vec<QuadrantSummary>,
    pub result: ReconciliationResult,
    pub report: AccuracyReport,
}

impl ExtractionOutcome {
    /// Outcome of reconciling already-extracted subjects, with no image run behind it.
    pub fn from_reconciliation(
        program: &str,
        result: ReconciliationResult,
        report: AccuracyReport,
    ) -> Self {
        Self {
            program: program.to_string(),
            capture: None,
            year_range: None,
            quadrants: Vec::new(),
            result,
            report,
        }
    }

    pub fn subjects(&self) -> &[ExtractedSubject] {
        &self.result.subjects
    }
}

pub struct Pipeline<'a> {
    curriculum: &'a ReferenceCurriculum,
    recognizer: &'a dyn TextRecognizer,
    settings: PipelineSettings,
    history: Vec<PipelineState>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        curriculum: &'a ReferenceCurriculum,
        recognizer: &'a dyn TextRecognizer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            curriculum,
            recognizer,
            settings,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Back to idle from a terminal state. Returns false while a run is in flight.
    pub fn reset(&mut self) -> bool {
        match self.state() {
            PipelineState::Idle => true,
            state if state.is_terminal() => {
                self.transition(PipelineState::Idle);
                true
            }
            state => {
                warn!(%state, "reset ignored outside a terminal state");
                false
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = %self.state(), to = %next, "pipeline transition");
        self.history.push(next);
    }

    pub fn run(&mut self, image: &SourceImage) -> Result<ExtractionOutcome, PipelineError> {
        self.reset();
        self.transition(PipelineState::SelectingFile);
        let outcome = self.run_stages(image);
        match &outcome {
            Ok(_) => self.transition(PipelineState::Review),
            Err(PipelineError::EmptyResult { .. }) => {
                self.transition(PipelineState::NoSubjectsFound)
            }
            Err(_) => self.transition(PipelineState::ProcessingError),
        }
        outcome
    }

    fn run_stages(&mut self, image: &SourceImage) -> Result<ExtractionOutcome, PipelineError> {
        self.transition(PipelineState::Preprocessing);
        let prepared = preprocess(image, &self.settings.image);
        let decoded = prepared
            .decode()
            .map_err(|err| PipelineError::processing(ProcessingStage::Preprocessing, err))?;

        self.transition(PipelineState::DetectingYear);
        let year_range =
            detect_year_range(&decoded, self.recognizer, self.settings.image.detect_width)
                .map_err(|err| PipelineError::processing(ProcessingStage::DetectingYear, err))?;

        self.transition(PipelineState::Splitting);
        let quadrants = split_quadrants(&decoded, year_range)
            .map_err(|err| PipelineError::processing(ProcessingStage::Splitting, err))?;

        self.transition(PipelineState::Recognizing);
        let recognizer = self.recognizer;
        let recognized: Result<Vec<Recognition>> = if self.settings.parallel {
            quadrants
                .par_iter()
                .map(|quadrant| recognizer.recognize(&quadrant.image))
                .collect()
        } else {
            quadrants
                .iter()
                .map(|quadrant| recognizer.recognize(&quadrant.image))
                .collect()
        };
        let recognitions = recognized
            .map_err(|err| PipelineError::processing(ProcessingStage::Recognizing, err))?;

        self.transition(PipelineState::Extracting);
        let extraction = &self.settings.extraction;
        let extractor = SubjectExtractor::new(&self.curriculum.rules, extraction);
        let rescue = RescuePass::new(self.curriculum, extraction);
        let mut subjects = Vec::new();
        let mut summaries = Vec::with_capacity(quadrants.len());
        for (quadrant, recognition) in quadrants.iter().zip(&recognitions) {
            let rows = reconstruct_rows(recognition, extraction.row_tolerance);
            let extracted = extractor.extract(&rows, quadrant.slot);
            let present: HashSet<String> = extracted
                .iter()
                .map(|subject| subject.subject_code.clone())
                .collect();
            let rescued = rescue.recover(&rows, quadrant.slot, &present);
            info!(
                quadrant = ?quadrant.position,
                slot = %quadrant.slot.label(),
                rows = rows.len(),
                extracted = extracted.len(),
                rescued = rescued.len(),
                "quadrant processed"
            );
            summaries.push(QuadrantSummary {
                position: quadrant.position,
                slot: quadrant.slot,
                rows: rows.len(),
                extracted: extracted.len(),
                rescued: rescued.len(),
            });
            subjects.extend(extracted);
            subjects.extend(rescued);
        }

        self.transition(PipelineState::Reconciling);
        let (result, report) = Reconciler::new(self.curriculum)
            .with_threshold(self.settings.match_threshold)
            .reconcile(subjects);
        if result.subjects.is_empty() {
            return Err(PipelineError::EmptyResult {
                capture: image.source,
            });
        }

        Ok(ExtractionOutcome {
            program: self.curriculum.program.clone(),
            capture: Some(image.source),
            year_range: Some(year_range),
            quadrants: summaries,
            result,
            report,
        })
    }
}

/// Save the reviewed subjects. The outcome is only borrowed, so a failed
/// save can simply be retried.
pub fn persist(
    outcome: &ExtractionOutcome,
    store: &dyn SubjectStore,
) -> Result<(), PersistenceError> {
    if outcome.subjects().is_empty() {
        return Err(PersistenceError::Empty);
    }
    store.save(outcome.subjects())
}

pub fn export_report(outcome: &ExtractionOutcome, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(outcome)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(outcome)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    use image::DynamicImage;

    use crate::core::geometry::Frame;
    use crate::core::model::Semester;
    use crate::imaging::preprocess::encode_png;
    use crate::ocr::TextElement;
    use crate::store::JsonStore;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    /// Answers every call with the same recognition.
    struct FixedRecognizer(Recognition);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Recognition> {
            Ok(self.0.clone())
        }
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Recognition> {
            anyhow::bail!("engine unavailable")
        }
    }

    struct FlakyStore {
        fail_first: Mutex<bool>,
        saved: Mutex<Vec<ExtractedSubject>>,
    }

    impl SubjectStore for FlakyStore {
        fn save(&self, subjects: &[ExtractedSubject]) -> Result<(), PersistenceError> {
            let mut fail = self.fail_first.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(PersistenceError::Io {
                    path: PathBuf::from("subjects.json"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.saved.lock().unwrap().extend_from_slice(subjects);
            Ok(())
        }
    }

    fn page() -> SourceImage {
        let bytes = encode_png(&DynamicImage::new_rgb8(80, 60)).unwrap();
        SourceImage::new(bytes, CaptureSource::File)
    }

    fn recognition(lines: &[&str]) -> Recognition {
        let elements = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| TextElement::new(*line, Frame::new(0.0, idx as f32 * 40.0, 200.0, 12.0)))
            .collect();
        Recognition::from_elements(elements)
    }

    fn outcome() -> ExtractionOutcome {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        let slot = Slot::new(1, Semester::First);
        let subjects = curriculum
            .subjects_for(slot)
            .iter()
            .map(|reference| ExtractedSubject::from_reference(reference, slot))
            .collect();
        let (result, report) = Reconciler::new(&curriculum).reconcile(subjects);
        ExtractionOutcome::from_reconciliation("bsit", result, report)
    }

    #[test]
    fn records_transitions_through_review() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        let recognizer = FixedRecognizer(recognition(&["CC 101 Introduction to Computing 2 1 3"]));
        let mut pipeline = Pipeline::new(&curriculum, &recognizer, PipelineSettings::default());

        let outcome = pipeline.run(&page()).unwrap();

        assert_eq!(
            pipeline.history(),
            &[
                PipelineState::Idle,
                PipelineState::SelectingFile,
                PipelineState::Preprocessing,
                PipelineState::DetectingYear,
                PipelineState::Splitting,
                PipelineState::Recognizing,
                PipelineState::Extracting,
                PipelineState::Reconciling,
                PipelineState::Review,
            ]
        );
        assert_eq!(outcome.year_range, Some(YearRange::Early));
        assert_eq!(outcome.quadrants.len(), 4);
        assert!(pipeline.reset());
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn empty_recognition_ends_in_no_subjects_found() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        let recognizer = FixedRecognizer(recognition(&["Course Code Descriptive Title"]));
        let mut pipeline = Pipeline::new(
            &curriculum,
            &recognizer,
            PipelineSettings::default().with_parallel(false),
        );

        let err = pipeline.run(&page()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::EmptyResult {
                capture: CaptureSource::File
            }
        ));
        assert_eq!(pipeline.state(), PipelineState::NoSubjectsFound);
    }

    #[test]
    fn recognizer_failure_aborts_the_run() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        let mut pipeline =
            Pipeline::new(&curriculum, &FailingRecognizer, PipelineSettings::default());

        let err = pipeline.run(&page()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Processing {
                stage: ProcessingStage::DetectingYear,
                ..
            }
        ));
        assert!(err.to_string().contains("engine unavailable"));
        assert_eq!(pipeline.state(), PipelineState::ProcessingError);
    }

    #[test]
    fn undecodable_upload_is_a_preprocessing_error() {
        let curriculum = ReferenceCurriculum::builtin("bsit").unwrap();
        let recognizer = FixedRecognizer(Recognition::default());
        let mut pipeline = Pipeline::new(&curriculum, &recognizer, PipelineSettings::default());

        let err = pipeline
            .run(&SourceImage::new(b"not an image".to_vec(), CaptureSource::Camera))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Processing {
                stage: ProcessingStage::Preprocessing,
                ..
            }
        ));
    }

    #[test]
    fn failed_save_can_be_retried() {
        let outcome = outcome();
        let store = FlakyStore {
            fail_first: Mutex::new(true),
            saved: Mutex::new(Vec::new()),
        };

        assert!(matches!(
            persist(&outcome, &store),
            Err(PersistenceError::Io { .. })
        ));
        persist(&outcome, &store).unwrap();

        assert_eq!(store.saved.lock().unwrap().as_slice(), outcome.subjects());
    }

    #[test]
    fn empty_outcome_is_not_saved() {
        let empty = ExtractionOutcome::from_reconciliation(
            "bsit",
            ReconciliationResult::default(),
            AccuracyReport::default(),
        );
        let store = JsonStore::new(temp_output_dir("curriscan-empty-store"));
        assert!(matches!(persist(&empty, &store), Err(PersistenceError::Empty)));
    }

    #[test]
    fn export_report_writes_outputs() -> Result<()> {
        let output = temp_output_dir("curriscan-pipeline");
        fs::create_dir_all(&output)?;

        let outcome = outcome();
        export_report(&outcome, &output)?;

        assert!(output.join("report.json").exists());
        let text = fs::read_to_string(output.join("report.txt"))?;
        assert!(text.contains("Accuracy: 100.0%"));
        assert!(text.contains("CC 101"));

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
