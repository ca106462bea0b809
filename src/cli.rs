use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::data::FigureData;
use crate::manifest::{
    export_manifest_md, filter_figures, load_data_file, load_manifest, resolve_output_path,
    validate, FigureSpec, Topic,
};
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "figgen", version, about = "Manifest-driven figure renderer")]
pub struct Args {
    /// Render figures for one topic (a number, or TG for tool guides)
    #[arg(long = "topic")]
    pub topic: Option<Topic>,

    /// Render a single figure by id
    #[arg(long = "id")]
    pub id: Option<String>,

    /// Check that every expected output exists and is non-empty
    #[arg(long)]
    pub verify: bool,

    /// List the registry without rendering
    #[arg(long)]
    pub list: bool,

    /// Report registry diagnostics without rendering
    #[arg(long)]
    pub validate: bool,

    /// Regenerate the human-readable manifest summary
    #[arg(long = "manifest-md")]
    pub manifest_md: bool,

    /// Registry file
    #[arg(long, default_value = "data/manifest.json5")]
    pub manifest: PathBuf,

    /// Directory holding the per-topic data files
    #[arg(long = "data-dir", default_value = "data")]
    pub data_dir: PathBuf,

    /// Root directory for rendered figures
    #[arg(long = "output-dir", default_value = "output/graphics")]
    pub output_dir: PathBuf,
}

pub fn run() -> Result<()> {
    execute(Args::parse())
}

pub fn execute(args: Args) -> Result<()> {
    let figures = load_manifest(&args.manifest)
        .with_context(|| format!("could not load manifest {}", args.manifest.display()))?;
    println!(
        "Loaded {} figures from {}",
        figures.len(),
        args.manifest.display()
    );

    if args.validate {
        let warnings = validate(&figures);
        if warnings.is_empty() {
            println!("Manifest is valid. No issues found.");
        } else {
            println!("Manifest warnings:");
            for warning in &warnings {
                println!("  - {warning}");
            }
        }
        return Ok(());
    }

    if args.list {
        list_figures(&figures);
        return Ok(());
    }

    if args.manifest_md {
        let count = export_manifest_md(&figures, &args.output_dir.join("MANIFEST.md"))?;
        println!("MANIFEST.md regenerated ({count} figures documented)");
        return Ok(());
    }

    // Surface registry problems inline, but keep going: validation is
    // advisory.
    for warning in validate(&figures) {
        println!("warning: {warning}");
    }

    let targeted = filter_figures(&figures, args.topic, args.id.as_deref());
    if targeted.is_empty() {
        if let Some(id) = &args.id {
            bail!("no figure found with id '{id}'");
        }
        if let Some(topic) = args.topic {
            bail!("no figures found for topic '{topic}'");
        }
        bail!("the manifest contains no figures");
    }

    if args.verify {
        return verify_outputs(&targeted, &args);
    }

    let failed = generate_all(&targeted, &args);

    // A fully successful unfiltered run refreshes the summary document.
    if failed.is_empty() && args.topic.is_none() && args.id.is_none() {
        let count = export_manifest_md(&figures, &args.output_dir.join("MANIFEST.md"))?;
        println!("MANIFEST.md refreshed ({count} figures documented)");
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} figures failed: {}",
            failed.len(),
            targeted.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

/// Render every targeted figure in registry order, isolating per-figure
/// failures so one bad record never aborts the batch. Returns the failed
/// ids.
fn generate_all(figures: &[FigureSpec], args: &Args) -> Vec<String> {
    let total = figures.len();
    println!("\nGenerating {total} figures...\n");

    let theme = Theme::default_tokens();
    let started = Instant::now();
    let mut failed = Vec::new();

    for (i, spec) in figures.iter().enumerate() {
        print!(
            "  [{:>2}/{total}]  Fig {:<6}  {:<30}  ",
            i + 1,
            spec.figure_number,
            spec.id
        );
        match generate_figure(spec, &theme, args) {
            Ok(()) => println!("OK"),
            Err(err) => {
                println!("FAILED");
                // The full error chain identifies which stage broke.
                println!("          error: {err:#}");
                failed.push(spec.id.clone());
            }
        }
    }

    let elapsed = started.elapsed().as_secs_f32();
    println!(
        "\nResults: {}/{total} generated successfully ({elapsed:.1}s)",
        total - failed.len()
    );
    if !failed.is_empty() {
        println!("Failed ({}): {}", failed.len(), failed.join(", "));
    }
    failed
}

fn generate_figure(spec: &FigureSpec, theme: &Theme, args: &Args) -> Result<()> {
    let data_path = args.data_dir.join(&spec.data_file);
    let records = load_data_file(&data_path)
        .with_context(|| format!("could not load data file {}", data_path.display()))?;
    let raw = records
        .get(&spec.id)
        .cloned()
        .ok_or_else(|| crate::manifest::ManifestError::MissingRecord {
            id: spec.id.clone(),
            data_file: spec.data_file.clone(),
        })?;
    let data = FigureData::from_value(spec.renderer, raw)?;

    let output_path = resolve_output_path(spec, &args.output_dir);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    spec.renderer
        .render(spec, &data, theme, &output_path)
        .with_context(|| format!("rendering '{}'", spec.id))?;
    Ok(())
}

/// Check that each expected output file exists and is non-empty. Reports
/// missing and empty files separately; never re-renders.
fn verify_outputs(figures: &[FigureSpec], args: &Args) -> Result<()> {
    println!("\nVerifying {} figures...\n", figures.len());

    let mut missing = Vec::new();
    let mut empty = Vec::new();
    let mut ok = 0;

    for spec in figures {
        let path = resolve_output_path(spec, &args.output_dir);
        match fs::metadata(&path) {
            Err(_) => {
                println!("  MISSING: {}  {}", spec.figure_number, path.display());
                missing.push(spec.id.clone());
            }
            Ok(meta) if meta.len() == 0 => {
                println!("  EMPTY:   {}  {}", spec.figure_number, path.display());
                empty.push(spec.id.clone());
            }
            Ok(meta) => {
                println!(
                    "  OK:      {:<6}  {:<30}  {:>6.1} KB",
                    spec.figure_number,
                    spec.id,
                    meta.len() as f64 / 1024.0
                );
                ok += 1;
            }
        }
    }

    println!("\nVerification: {ok} ok, {} missing, {} empty", missing.len(), empty.len());
    if !missing.is_empty() {
        println!("Missing ids: {}", missing.join(", "));
    }
    if !empty.is_empty() {
        println!("Empty ids:   {}", empty.join(", "));
    }

    if !missing.is_empty() || !empty.is_empty() {
        bail!(
            "verification failed: {} missing, {} empty",
            missing.len(),
            empty.len()
        );
    }
    Ok(())
}

fn list_figures(figures: &[FigureSpec]) {
    println!("\nRegistered figures: {}\n", figures.len());
    println!("  {:<6}  {:<30}  {:<14}  Topic", "#", "ID", "Renderer");
    println!("  {:-<6}  {:-<30}  {:-<14}  {:-<6}", "", "", "", "");
    for spec in figures {
        println!(
            "  {:<6}  {:<30}  {:<14}  {}",
            spec.figure_number,
            spec.id,
            spec.renderer.name(),
            spec.topic
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_topic_and_mode_flags() {
        let args = Args::try_parse_from(["figgen", "--topic", "TG", "--verify"]).unwrap();
        assert_eq!(args.topic, Some(Topic::ToolGuides));
        assert!(args.verify);
        assert!(!args.list);

        let args = Args::try_parse_from(["figgen", "--topic", "3"]).unwrap();
        assert_eq!(args.topic, Some(Topic::Numbered(3)));
    }

    #[test]
    fn rejects_garbage_topics() {
        assert!(Args::try_parse_from(["figgen", "--topic", "three"]).is_err());
    }
}
