//! Update command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use sigoff_core::{
    AnnotationPipeline, Config, Outcome, ResolverRegistry, ScanReport, TABLE_TAG,
    load_address_table,
};
use tracing::{info, warn};

use super::image::load_section;
use crate::cli::UpdateArgs;

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        Err(e) if e.is_not_found() => {
            warn!("Config {} not found, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config {}", path.display())),
    }
}

/// Merge command line overrides into the file configuration.
pub fn resolve_config(args: &UpdateArgs, base: Config) -> Config {
    let mut builder = Config::builder();
    if let Some(input) = &args.input {
        builder = builder.input(input);
    }
    if let Some(output) = &args.output {
        builder = builder.output(output);
    }
    if let Some(tag) = &args.version_tag {
        builder = builder.version_tag(tag);
    }
    if let Some(section) = &args.image.section {
        builder = builder.section(section);
    }
    if let Some(table) = &args.address_table {
        builder = builder.address_table(table);
    }
    builder.build_on(base)
}

/// Run the update command
pub fn run(args: UpdateArgs, config_path: &Path) -> Result<()> {
    let config = resolve_config(&args, load_config(config_path)?);
    let version = config.version()?;

    let section = load_section(&args.image, &config.section)?;

    let mut registry = ResolverRegistry::new(&section);
    if let Some(path) = &config.address_table {
        let table = load_address_table(path)
            .with_context(|| format!("Failed to load address table {}", path.display()))?;
        info!("Loaded {} address table entries", table.len());
        registry.register(TABLE_TAG, table)?;
    }

    let pipeline = AnnotationPipeline::new(&registry, &version);
    let report = pipeline.run_files(&config.input, &config.output)?;

    print_summary(&report, &config.output);

    if let Some(path) = &args.report {
        report
            .save(path)
            .with_context(|| format!("Failed to save report {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    if args.strict && !report.is_clean() {
        bail!("{} annotation(s) failed", report.failed());
    }

    Ok(())
}

fn print_summary(report: &ScanReport, output: &Path) {
    for annotation in &report.annotations {
        let location = format!("line {:>5}", annotation.line);
        match &annotation.outcome {
            Outcome::Rewritten { offset } => {
                println!("  {} {} {} {}", "OK".green(), location, annotation.tag, offset);
            }
            Outcome::ResolveFailed { error } => {
                println!("  {} {} {}", "FAIL".red(), location, error);
            }
            Outcome::RewriteFailed { offset, error } => {
                println!("  {} {} {} ({})", "BAD LINE".yellow(), location, offset, error);
            }
            Outcome::MissingDataLine { offset } => {
                println!("  {} {} {} (no data line)", "SKIP".yellow(), location, offset);
            }
        }
    }

    println!();
    println!(
        "{} lines, {} annotations, {} rewritten, {} failed -> {}",
        report.lines,
        report.annotations.len(),
        report.rewritten().green(),
        report.failed().red(),
        output.display()
    );
}
