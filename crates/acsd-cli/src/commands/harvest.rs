use crate::cli::HarvestArgs;
use crate::config::{HarvestSettings, PartialHarvestConfig};
use crate::error::{CliError, Result};
use crate::utils::identifiers::{collect_identifiers, mark_excluded, read_exclusions};
use crate::utils::progress::CliProgressHandler;
use acsd::core::io::ledger::NOT_WRITTEN_LEDGER;
use acsd::engine::progress::ProgressReporter;
use acsd::engine::provider::DirectoryEntryProvider;
use acsd::workflows::harvest::{self, RunSummary};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Identifiers to skip: the exclusion file plus, unless the run starts over, every
/// identifier a previous run could not write.
fn exclusions(settings: &HarvestSettings) -> Result<BTreeSet<String>> {
    let mut excluded = BTreeSet::new();
    if let Some(path) = &settings.exclude_file {
        let listed = read_exclusions(path)?;
        info!("{} identifier(s) excluded by {}", listed.len(), path.display());
        excluded.extend(listed);
    }
    let previous = settings.core.output_dir.join(NOT_WRITTEN_LEDGER);
    if !settings.core.overwrite && previous.is_file() {
        let listed = read_exclusions(&previous)?;
        info!(
            "{} identifier(s) were not written by a previous run and will be skipped",
            listed.len()
        );
        excluded.extend(listed);
    }
    Ok(excluded)
}

fn print_summary(summary: &RunSummary) {
    println!("Processed {} identifier(s):", summary.total);
    println!("  written             {}", summary.written);
    println!("    with imputed H    {}", summary.hydrogens_imputed);
    println!("    SMILES mismatches {}", summary.smiles_mismatches);
    println!("  excluded            {}", summary.excluded);
    println!("  already processed   {}", summary.already_processed);
    println!("  not found           {}", summary.not_found);
    println!("  no coordinates      {}", summary.no_coordinates);
    println!("  rejected            {}", summary.rejected);
    println!("  failed              {}", summary.failed);
}

pub fn run(args: HarvestArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialHarvestConfig::from_file(path)?,
        None => PartialHarvestConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    if !settings.entries_dir.is_dir() {
        return Err(CliError::Config(format!(
            "Entries directory '{}' does not exist",
            settings.entries_dir.display()
        )));
    }

    let excluded = exclusions(&settings)?;
    let identifiers = mark_excluded(collect_identifiers(&args.inputs)?, &excluded);
    if identifiers.is_empty() {
        warn!("No identifiers to process.");
        println!("Warning: the input lists contain no identifiers.");
        return Ok(());
    }

    let provider = DirectoryEntryProvider::new(&settings.entries_dir);
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Harvesting {} identifier(s) into {}...",
        identifiers.len(),
        settings.core.output_dir.display()
    );
    let summary = harvest::harvest(&identifiers, &settings.core, &provider, &reporter)?;

    print_summary(&summary);
    if !summary.failed_identifiers.is_empty() {
        warn!(
            "{} identifier(s) failed: {}",
            summary.failed,
            summary.failed_identifiers.join(", ")
        );
        println!(
            "See {} and the logbook for details on failed identifiers.",
            settings.core.output_dir.join(NOT_WRITTEN_LEDGER).display()
        );
    }

    Ok(())
}
