//! # Sectional CLI
//!
//! Command-line front end for `section_core`:
//!
//! - `compute` - analyze a section document, print the result table, optionally export or save
//! - `watch` - track a section document on disk and republish on every edit
//! - `materials` - list the material catalog
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for pipeline detail.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info};

use section_core::document::SectionDocument;
use section_core::errors::{CalcResult, SectionError};
use section_core::file_io::{export_csv, load_document, save_document, FileLock};
use section_core::geometry::Curve;
use section_core::materials::MaterialCatalog;
use section_core::section::BoundaryId;
use section_core::session::SectionSession;
use section_core::settings::AccuracyMode;
use section_core::tracking::{ChangeTracker, GeometrySource, Publication, RecomputeMode, ResultSink, TickOutcome};
use section_core::units::LengthUnit;

/// How often the watch loop drives the tracker
const TICK_PERIOD: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "section_cli", version, about = "Cross-section properties and utilization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a section document once
    Compute {
        /// Section document (JSON)
        document: PathBuf,
        /// Display unit for the result table
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
        /// Accuracy tier
        #[arg(long, value_enum)]
        accuracy: Option<AccuracyArg>,
        /// Write the result table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Save the document, with the unit and accuracy overrides applied
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Watch a section document and recompute when its curves change
    Watch {
        document: PathBuf,
        /// Run recomputes on a worker thread
        #[arg(long)]
        offload: bool,
        /// Stop after this many polls
        #[arg(long)]
        max_polls: Option<u64>,
    },
    /// List the material catalog
    Materials,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Mm,
    Cm,
    M,
}

impl From<UnitArg> for LengthUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Mm => LengthUnit::Millimeter,
            UnitArg::Cm => LengthUnit::Centimeter,
            UnitArg::M => LengthUnit::Meter,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AccuracyArg {
    Fast,
    High,
}

impl From<AccuracyArg> for AccuracyMode {
    fn from(a: AccuracyArg) -> Self {
        match a {
            AccuracyArg::Fast => AccuracyMode::Fast,
            AccuracyArg::High => AccuracyMode::High,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Compute {
            document,
            unit,
            accuracy,
            csv,
            json,
            save,
        } => compute(&document, unit, accuracy, csv.as_deref(), json, save.as_deref()),
        Command::Watch {
            document,
            offload,
            max_polls,
        } => watch(&document, offload, max_polls),
        Command::Materials => {
            print_materials(MaterialCatalog::standard());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error [{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

fn compute(
    path: &Path,
    unit: Option<UnitArg>,
    accuracy: Option<AccuracyArg>,
    csv: Option<&Path>,
    json: bool,
    save: Option<&Path>,
) -> CalcResult<()> {
    let mut doc = load_document(path)?;
    if let Some(unit) = unit {
        doc.settings.display_unit = unit.into();
    }
    if let Some(accuracy) = accuracy {
        doc.settings.accuracy = accuracy.into();
    }

    let mut session = SectionSession::from_document(&doc, MaterialCatalog::standard().clone())?;
    let report = session.recompute()?.clone();
    let table = session.table().ok_or_else(|| SectionError::missing_field("outline"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_banner(&format!("SECTION: {}", doc.meta.name));
        println!("  Material: {}", doc.material.display_name());
        println!("  Accuracy: {}", doc.settings.accuracy.display_name());
        println!("  Strategy: {:?}", report.strategy);
        println!();
        print!("{}", table);
        if let Some(u) = &report.utilization {
            println!();
            println!("  Status:   {} ({:.1}% of fy/γ = {:.2} MPa)", u.status(), u.utilization_pct, u.allowable.0);
        }
        for warning in &report.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    if let Some(csv_path) = csv {
        let _lock = FileLock::acquire(csv_path, "section_cli")?;
        export_csv(&table, csv_path)?;
        info!("Wrote {} rows to {}", table.len(), csv_path.display());
    }
    if let Some(doc_path) = save {
        let _lock = FileLock::acquire(doc_path, "section_cli")?;
        doc.touch();
        save_document(&doc, doc_path)?;
        info!("Saved '{}' to {}", doc.meta.name, doc_path.display());
    }
    Ok(())
}

/// Geometry source backed by a section document on disk
struct DocumentSource {
    path: PathBuf,
    document: SectionDocument,
}

impl DocumentSource {
    fn open(path: &Path) -> CalcResult<Self> {
        Ok(DocumentSource {
            path: path.to_path_buf(),
            document: load_document(path)?,
        })
    }
}

impl GeometrySource for DocumentSource {
    fn refresh(&mut self) -> CalcResult<()> {
        self.document = load_document(&self.path)?;
        Ok(())
    }

    fn fetch(&self, id: BoundaryId) -> Option<Curve> {
        self.document.curve(id).cloned()
    }
}

/// Prints publications and errors to the terminal
struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn publish(&mut self, publication: &Publication) {
        print_banner(&format!(
            "UPDATE #{} at {}",
            publication.sequence,
            publication.published_at.format("%H:%M:%S%.3f")
        ));
        print!("{}", publication.table);
        if let Some(u) = &publication.report.utilization {
            println!("  Status: {}", u.status());
        }
        for warning in &publication.report.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    fn report(&mut self, error: &SectionError) {
        eprintln!("error [{}]: {}", error.error_code(), error);
    }
}

fn watch(path: &Path, offload: bool, max_polls: Option<u64>) -> CalcResult<()> {
    if let Some(holder) = FileLock::check(path) {
        println!(
            "{} is locked by {} since {}",
            path.display(),
            holder.holder,
            holder.locked_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    let source = DocumentSource::open(path)?;
    let session = SectionSession::from_document(&source.document, MaterialCatalog::standard().clone())?;
    let mode = if offload {
        RecomputeMode::Offload
    } else {
        RecomputeMode::Inline
    };

    let mut tracker = ChangeTracker::new(session, source, ConsoleSink, mode);
    tracker.enable(Instant::now())?;
    println!("Watching {} (Ctrl+C to stop)", path.display());

    let mut polls = 0u64;
    loop {
        tracker.collect();
        let outcome = tracker.tick(Instant::now());
        debug!("tick: {:?}", outcome);
        match outcome {
            TickOutcome::NotDue | TickOutcome::Dropped => {}
            TickOutcome::Inactive | TickOutcome::OutlineRemoved | TickOutcome::Failed => break,
            _ => polls += 1,
        }
        if max_polls.is_some_and(|max| polls >= max) {
            tracker.wait(Duration::from_secs(60));
            break;
        }
        thread::sleep(TICK_PERIOD);
    }

    if tracker.dropped_ticks() > 0 {
        info!("{} ticks dropped while recomputing", tracker.dropped_ticks());
    }
    tracker.disable();
    Ok(())
}

fn print_materials(catalog: &MaterialCatalog) {
    print_banner("MATERIAL CATALOG");
    println!("  {:<10} {:>14} {:>16}", "Material", "Density g/cm³", "Yield MPa");
    for (key, material) in catalog.iter() {
        println!(
            "  {:<10} {:>14.2} {:>16.1}",
            key.display_name(),
            material.density_g_cm3,
            material.yield_strength_mpa
        );
    }
}

fn print_banner(title: &str) {
    println!("═══════════════════════════════════════");
    println!("  {}", title);
    println!("═══════════════════════════════════════");
}
