use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use curriscan::core::config::PipelineSettings;
use curriscan::core::model::{CaptureSource, SourceImage};
use curriscan::curriculum::{CurriculumRegistry, ReferenceCurriculum};
use curriscan::ocr::OcrBridge;
use curriscan::pipeline::{export_report, persist, ExtractionOutcome, Pipeline};
use curriscan::reconcile::Reconciler;
use curriscan::store::{JsonStore, SubjectStore};
use curriscan::validate::validate_all;

#[derive(Parser, Debug)]
#[command(name = "curriscan")]
#[command(version, about = "Curriculum checklist extraction with reference reconciliation", long_about = None)]
struct Cli {
    /// Log pipeline stages and every reconciler fix
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct CurriculumArgs {
    /// Program id of the reference curriculum
    #[arg(short, long, default_value = "bsit")]
    program: String,

    /// Additional curriculum JSON file; its program id becomes selectable
    #[arg(long)]
    curriculum: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct OcrArgs {
    /// Recognizer script printing recognition JSON
    #[arg(long, default_value = "ocr/bridge/ocr_bridge.py")]
    ocr_script: PathBuf,

    /// Interpreter used to run the recognizer script
    #[arg(long, default_value = "python3")]
    interpreter: PathBuf,

    /// Recognition language passed to the script
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Pipeline settings JSON (image widths, row tolerance, thresholds)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Process the four quadrants one after another
    #[arg(long)]
    sequential: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract subjects from a checklist photo or scan
    Extract {
        /// Checklist image
        image: PathBuf,

        /// Treat the image as a camera capture instead of an uploaded file
        #[arg(long)]
        camera: bool,

        /// Output directory (default: ./<image_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write the report, not subjects.json
        #[arg(long)]
        no_save: bool,

        #[command(flatten)]
        curriculum: CurriculumArgs,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Extract several checklist images
    Batch {
        /// Checklist images
        images: Vec<PathBuf>,

        /// Output directory for all results
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        camera: bool,

        #[command(flatten)]
        curriculum: CurriculumArgs,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Reconcile a subjects JSON file against a curriculum
    Reconcile {
        /// subjects.json written by `extract` or edited by hand
        subjects: PathBuf,

        /// Output directory for the report and corrected subjects
        #[arg(short, long, default_value = "reconcile_output")]
        output: PathBuf,

        #[command(flatten)]
        curriculum: CurriculumArgs,
    },

    /// Check reviewed subjects before saving
    Validate {
        subjects: PathBuf,

        #[command(flatten)]
        curriculum: CurriculumArgs,
    },

    /// List available curricula
    Curricula {
        /// Additional curriculum JSON files
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            image,
            camera,
            output,
            no_save,
            curriculum,
            ocr,
        } => extract_single(&image, camera, output, !no_save, &curriculum, &ocr, false),
        Commands::Batch {
            images,
            output,
            camera,
            curriculum,
            ocr,
        } => extract_batch(images, output, camera, &curriculum, &ocr),
        Commands::Reconcile {
            subjects,
            output,
            curriculum,
        } => reconcile_file(&subjects, &output, &curriculum),
        Commands::Validate {
            subjects,
            curriculum,
        } => validate_file(&subjects, &curriculum),
        Commands::Curricula { files } => list_curricula(&files),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(args: &CurriculumArgs) -> Result<(CurriculumRegistry, String)> {
    let mut registry = CurriculumRegistry::with_builtins()?;
    let program = match &args.curriculum {
        Some(path) => registry
            .load_file(path)
            .with_context(|| format!("Failed to load curriculum: {}", path.display()))?
            .program
            .clone(),
        None => args.program.clone(),
    };
    Ok((registry, program))
}

fn load_settings(ocr: &OcrArgs) -> Result<PipelineSettings> {
    let settings = match &ocr.settings {
        Some(path) => PipelineSettings::from_path(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => PipelineSettings::default(),
    };
    Ok(if ocr.sequential {
        settings.with_parallel(false)
    } else {
        settings
    })
}

fn extract_single(
    image: &Path,
    camera: bool,
    output: Option<PathBuf>,
    save: bool,
    curriculum_args: &CurriculumArgs,
    ocr: &OcrArgs,
    quiet: bool,
) -> Result<()> {
    if !image.is_file() {
        anyhow::bail!("Input image does not exist: {}", image.display());
    }

    let output_dir = output.unwrap_or_else(|| {
        let stem = image
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checklist".to_string());
        PathBuf::from(format!("{stem}_output"))
    });

    let (registry, program) = load_registry(curriculum_args)?;
    let curriculum = registry.get(&program)?;
    let settings = load_settings(ocr)?;
    let bridge = OcrBridge::new(output_dir.join("ocr"))
        .with_script(ocr.ocr_script.clone())
        .with_interpreter(ocr.interpreter.clone())
        .with_lang(ocr.lang.clone());

    let capture = if camera {
        CaptureSource::Camera
    } else {
        CaptureSource::File
    };
    let bytes =
        fs::read(image).with_context(|| format!("Failed to read image: {}", image.display()))?;

    if !quiet {
        println!("[*] Processing: {}", image.display());
        println!("[*] Curriculum: {} ({})", curriculum.name, curriculum.program);
        println!("[*] Output: {}", output_dir.display());
    }

    let mut pipeline = Pipeline::new(curriculum, &bridge, settings);
    let outcome = pipeline
        .run(&SourceImage::new(bytes, capture))
        .with_context(|| format!("Failed to process checklist: {}", image.display()))?;

    export_report(&outcome, &output_dir)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;
    if save {
        persist(&outcome, &JsonStore::new(output_dir.clone()))?;
    }

    if !quiet {
        print_summary(&outcome);
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }
    Ok(())
}

fn extract_batch(
    images: Vec<PathBuf>,
    output: Option<PathBuf>,
    camera: bool,
    curriculum: &CurriculumArgs,
    ocr: &OcrArgs,
) -> Result<()> {
    if images.is_empty() {
        anyhow::bail!("No input images specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_output"));
    println!("[*] Batch processing {} image(s)", images.len());

    let mut success = 0;
    let mut failed = 0;
    for (i, image) in images.iter().enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, images.len(), image.display());
        let stem = image
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image_{i}"));
        match extract_single(
            image,
            camera,
            Some(base_output.join(stem)),
            true,
            curriculum,
            ocr,
            true,
        ) {
            Ok(()) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {e:#}");
                failed += 1;
            }
        }
    }

    println!("\n[*] Summary: {success} succeeded, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} image(s) failed to process");
    }
    Ok(())
}

fn reconcile_file(subjects: &Path, output: &Path, curriculum_args: &CurriculumArgs) -> Result<()> {
    let (registry, program) = load_registry(curriculum_args)?;
    let curriculum = registry.get(&program)?;
    let extracted = JsonStore::load(subjects)?;

    let (result, report) = Reconciler::new(curriculum).reconcile(extracted);
    let outcome = ExtractionOutcome::from_reconciliation(&curriculum.program, result, report);

    export_report(&outcome, output)
        .with_context(|| format!("Failed to export to: {}", output.display()))?;
    JsonStore::new(output.to_path_buf()).save(outcome.subjects())?;
    print_summary(&outcome);
    Ok(())
}

fn validate_file(subjects: &Path, curriculum_args: &CurriculumArgs) -> Result<()> {
    let (registry, program) = load_registry(curriculum_args)?;
    let curriculum: &ReferenceCurriculum = registry.get(&program)?;
    let entries = JsonStore::load(subjects)?;

    let rejections = validate_all(curriculum, &entries);
    for (idx, rejection) in &rejections {
        let entry = &entries[*idx];
        eprintln!(
            "  [✗] #{idx} {} ({}): {rejection}",
            entry.subject_code,
            entry.slot().label()
        );
    }
    if !rejections.is_empty() {
        anyhow::bail!("{} of {} entries rejected", rejections.len(), entries.len());
    }
    println!("[✓] {} entries valid", entries.len());
    Ok(())
}

fn list_curricula(files: &[PathBuf]) -> Result<()> {
    let mut registry = CurriculumRegistry::with_builtins()?;
    for path in files {
        registry
            .load_file(path)
            .with_context(|| format!("Failed to load curriculum: {}", path.display()))?;
    }

    println!("Curricula");
    println!("=========");
    for curriculum in registry.programs() {
        println!(
            "{:<8} {} ({} slots, {} subjects, {} critical)",
            curriculum.program,
            curriculum.name,
            curriculum.slots.len(),
            curriculum.subject_count(),
            curriculum.rules.critical.len()
        );
    }
    Ok(())
}

fn print_summary(outcome: &ExtractionOutcome) {
    let report = &outcome.report;
    println!(
        "\n[+] {} subjects, accuracy {:.1}% ({}/{})",
        outcome.subjects().len(),
        report.accuracy,
        report.correct,
        report.total
    );
    println!(
        "[+] {} fixes, {} warnings",
        outcome.result.fixes.len(),
        outcome.result.warnings.len()
    );
    let missing: Vec<&str> = report.missing_codes().collect();
    if !missing.is_empty() {
        println!("[!] Missing: {}", missing.join(", "));
    }
}
