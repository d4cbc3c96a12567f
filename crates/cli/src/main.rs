//! CLI tool for rendering résumé records into a paginated PowerPoint deck.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use deck_core::{Subject, TemplateLayout};
use deck_pptx::TemplateRenderer;
use std::fs;
use std::path::{Path, PathBuf};

/// Render talent-introduction résumés into one presentation deck.
#[derive(Parser, Debug)]
#[command(name = "resume-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding a list of résumé records
    input: PathBuf,

    /// Template presentation (.pptx)
    #[arg(short, long)]
    template: PathBuf,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file overriding the template layout
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let subjects = load_subjects(&args.input)?;
    if args.verbose {
        eprintln!("Loaded {} résumé(s) from {}", subjects.len(), args.input.display());
    }

    let mut renderer = TemplateRenderer::open(&args.template)
        .with_context(|| format!("Failed to load template {}", args.template.display()))?;
    if let Some(layout_path) = &args.layout {
        renderer = renderer.with_layout(load_layout(layout_path)?);
    }

    let deck = renderer
        .render_all(&subjects)
        .context("Failed to render résumés")?;

    let output_path =
        get_output_path(&args.input, args.output.as_ref(), subjects.len(), Local::now())?;
    deck.save(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("{}", output_path.display());
    if args.verbose {
        eprintln!("Written {} slide(s) to: {}", deck.slide_count(), output_path.display());
    }

    Ok(())
}

/// Read the résumé list.
fn load_subjects(path: &Path) -> Result<Vec<Subject>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Subject::list_from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read and validate a layout override.
fn load_layout(path: &Path) -> Result<TemplateLayout> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    TemplateLayout::from_json(&json)
        .with_context(|| format!("Invalid layout in {}", path.display()))
}

/// File name of the merged deck, stamped with the render time.
fn output_filename(count: usize, now: DateTime<Local>) -> String {
    format!("人才引进简历汇总_{}人_{}.pptx", count, now.format("%Y%m%d_%H%M%S"))
}

/// Determine the output path for the merged deck.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    count: usize,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let output_filename = output_filename(count, now);

    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}
