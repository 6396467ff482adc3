use crate::core::io::ledger::{DirectoryLedger, LedgerError, LedgerSink, SkipCategory};
use crate::core::io::logbook::{EntryLog, LogSink, Logbook, LOGBOOK_FILE};
use crate::core::io::traits::CrystalFile;
use crate::core::io::xyz::{ExtendedXyzFile, XyzMetadata};
use crate::core::models::molecule::total_deficit;
use crate::core::models::quality::SmilesComparison;
use crate::engine::assembly::{AssemblyRequest, CrystalAssembler, SymmetryCrystalAssembler};
use crate::engine::config::HarvestConfig;
use crate::engine::error::{EngineError, RunError};
use crate::engine::filters::{RejectionReason, classify, describe};
use crate::engine::graph_builder::build_molecules;
use crate::engine::hydrogens::{GeometricHydrogenImputer, HydrogenImputer, NoHydrogenImputer};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::provider::{EntryProvider, ProviderError};
use crate::engine::quality::{DeclaredMetadata, evaluate};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// Why an identifier produced no structure without anything having gone wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Marked with a leading `#` by the caller.
    Excluded,
    /// A structure file from an earlier run exists and overwriting is off.
    AlreadyProcessed,
    NotFound,
    NoCoordinates,
    Rejected(Vec<RejectionReason>),
}

/// What was produced for an identifier that made it through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub identifier: String,
    pub atom_count: usize,
    pub hydrogens_added: usize,
    pub smiles_match: bool,
    /// `None` when structure writing is disabled.
    pub structure_path: Option<PathBuf>,
}

/// The single result of processing one identifier.
#[derive(Debug)]
pub enum EntryOutcome {
    Written(EntryReport),
    Skipped(SkipReason),
    Failed(EngineError),
}

/// Totals over a run, built by folding entry outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub written: usize,
    pub excluded: usize,
    pub already_processed: usize,
    pub not_found: usize,
    pub no_coordinates: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Entries that had at least one hydrogen imputed.
    pub hydrogens_imputed: usize,
    pub smiles_mismatches: usize,
    pub failed_identifiers: Vec<String>,
}

impl RunSummary {
    /// Adds one outcome to the totals.
    pub fn with(mut self, outcome: &EntryOutcome) -> Self {
        self.total += 1;
        match outcome {
            EntryOutcome::Written(report) => {
                self.written += 1;
                if report.hydrogens_added > 0 {
                    self.hydrogens_imputed += 1;
                }
                if !report.smiles_match {
                    self.smiles_mismatches += 1;
                }
            }
            EntryOutcome::Skipped(reason) => match reason {
                SkipReason::Excluded => self.excluded += 1,
                SkipReason::AlreadyProcessed => self.already_processed += 1,
                SkipReason::NotFound => self.not_found += 1,
                SkipReason::NoCoordinates => self.no_coordinates += 1,
                SkipReason::Rejected(_) => self.rejected += 1,
            },
            EntryOutcome::Failed(e) => {
                self.failed += 1;
                self.failed_identifiers.push(e.identifier().to_string());
            }
        }
        self
    }

    /// Combines the totals of two disjoint sets of outcomes.
    pub fn merge(mut self, other: Self) -> Self {
        self.total += other.total;
        self.written += other.written;
        self.excluded += other.excluded;
        self.already_processed += other.already_processed;
        self.not_found += other.not_found;
        self.no_coordinates += other.no_coordinates;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.hydrogens_imputed += other.hydrogens_imputed;
        self.smiles_mismatches += other.smiles_mismatches;
        self.failed_identifiers.extend(other.failed_identifiers);
        self
    }
}

impl<'a> FromIterator<&'a EntryOutcome> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a EntryOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

/// The collaborators and sinks shared by every worker of a run.
#[derive(Clone, Copy)]
pub struct HarvestContext<'a> {
    pub config: &'a HarvestConfig,
    pub provider: &'a dyn EntryProvider,
    pub assembler: &'a dyn CrystalAssembler,
    pub imputer: &'a dyn HydrogenImputer,
    pub ledger: &'a dyn LedgerSink,
    pub logbook: &'a dyn LogSink,
}

/// Location of the structure file written for `identifier`.
pub fn structure_path(output_dir: &Path, identifier: &str) -> PathBuf {
    output_dir.join(format!("{}.xyz", identifier))
}

/// Creates the output directory, first removing it entirely when `overwrite` is set.
pub fn prepare_output_directory(path: &Path, overwrite: bool) -> Result<(), RunError> {
    let io_err = |source| RunError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    };
    if overwrite && path.exists() {
        info!("Removing existing output directory {}", path.display());
        fs::remove_dir_all(path).map_err(io_err)?;
    }
    fs::create_dir_all(path).map_err(io_err)
}

/// Runs the standard pipeline: prepares the output directory, opens the logbook and
/// ledgers there, and processes every identifier.
pub fn harvest(
    identifiers: &[String],
    config: &HarvestConfig,
    provider: &dyn EntryProvider,
    reporter: &ProgressReporter,
) -> Result<RunSummary, RunError> {
    prepare_output_directory(&config.output_dir, config.overwrite)?;
    let logbook = Logbook::open_in(&config.output_dir).map_err(|source| RunError::Logbook {
        path: config.output_dir.join(LOGBOOK_FILE),
        source,
    })?;
    let ledger = DirectoryLedger::new(&config.output_dir);
    let assembler = SymmetryCrystalAssembler::new();
    let imputer: &dyn HydrogenImputer = if config.impute_hydrogens {
        &GeometricHydrogenImputer
    } else {
        &NoHydrogenImputer
    };

    let context = HarvestContext {
        config,
        provider,
        assembler: &assembler,
        imputer,
        ledger: &ledger,
        logbook: &logbook,
    };
    Ok(run(identifiers, &context, reporter))
}

/// Processes every identifier in parallel and folds the outcomes into a summary.
#[instrument(skip_all, name = "harvest_workflow")]
pub fn run(
    identifiers: &[String],
    context: &HarvestContext<'_>,
    reporter: &ProgressReporter,
) -> RunSummary {
    reporter.report(Progress::RunStart {
        total: identifiers.len() as u64,
    });
    info!(
        "Harvesting {} identifier(s) into {}",
        identifiers.len(),
        context.config.output_dir.display()
    );

    let mut summary = identifiers
        .par_iter()
        .map(|identifier| {
            let outcome = process_entry(identifier, context);
            if let EntryOutcome::Failed(e) = &outcome {
                reporter.report(Progress::Message(e.to_string()));
            }
            reporter.report(Progress::EntryFinish {
                identifier: identifier.clone(),
            });
            outcome
        })
        .fold(RunSummary::default, |summary, outcome| summary.with(&outcome))
        .reduce(RunSummary::default, RunSummary::merge);
    summary.failed_identifiers.sort();

    reporter.report(Progress::RunFinish);
    info!(
        "Harvest complete: {} written, {} skipped, {} failed.",
        summary.written,
        summary.total - summary.written - summary.failed,
        summary.failed
    );
    summary
}

/// Runs the pipeline for one identifier. Never panics on bad data: fatal problems are
/// logged, recorded in the catch-all ledger and returned as [`EntryOutcome::Failed`].
#[instrument(skip_all, name = "harvest_entry", fields(identifier = %identifier))]
pub fn process_entry(identifier: &str, context: &HarvestContext<'_>) -> EntryOutcome {
    if identifier.starts_with('#') {
        debug!("Skipping excluded identifier");
        return EntryOutcome::Skipped(SkipReason::Excluded);
    }
    let config = context.config;
    if config.write_structures
        && !config.overwrite
        && structure_path(&config.output_dir, identifier).exists()
    {
        debug!("Structure file already present");
        return EntryOutcome::Skipped(SkipReason::AlreadyProcessed);
    }

    let mut log = EntryLog::new(context.logbook, config.flush_policy);
    match harvest_entry(identifier, context, &mut log) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            log.warning(format!("{} was not written: {}", identifier, e));
            if let Err(ledger_error) =
                context
                    .ledger
                    .record_skip(SkipCategory::Failed, identifier, &e.to_string())
            {
                error!("Could not record failure of {}: {}", identifier, ledger_error);
            }
            EntryOutcome::Failed(e)
        }
    }
}

fn harvest_entry(
    identifier: &str,
    context: &HarvestContext<'_>,
    log: &mut EntryLog<'_>,
) -> Result<EntryOutcome, EngineError> {
    let ledger_err = |source: LedgerError| EngineError::Ledger {
        identifier: identifier.to_string(),
        source,
    };
    let structure_err = |source| EngineError::Structure {
        identifier: identifier.to_string(),
        source,
    };
    let assembly_err = |source| EngineError::Assembly {
        identifier: identifier.to_string(),
        source,
    };
    let skip = |category: SkipCategory, reason: &str, outcome: SkipReason| {
        context
            .ledger
            .record_skip(category, identifier, reason)
            .map(|()| EntryOutcome::Skipped(outcome))
            .map_err(ledger_err)
    };

    // === Phase 1: Fetch and screen ===
    let entry = match context.provider.fetch(identifier) {
        Ok(entry) => entry,
        Err(ProviderError::NotFound { .. }) => {
            log.warning(format!("{} could not be found", identifier));
            return skip(SkipCategory::NotFound, "", SkipReason::NotFound);
        }
        Err(source) => {
            return Err(EngineError::Provider {
                identifier: identifier.to_string(),
                source,
            });
        }
    };

    let reasons = classify(&entry);
    if !reasons.is_empty() {
        let description = describe(&reasons);
        log.info(format!("{} rejected: {}", identifier, description));
        return skip(
            SkipCategory::Rejected,
            &description,
            SkipReason::Rejected(reasons),
        );
    }
    if !entry.has_coordinates() {
        log.warning(format!("{} has no atom coordinates", identifier));
        return skip(
            SkipCategory::NoCoordinates,
            "no coordinates given",
            SkipReason::NoCoordinates,
        );
    }

    // === Phase 2: Molecule graphs ===
    let built = build_molecules(&entry.components).map_err(structure_err)?;
    if built.contains_deuterium {
        log.info("This molecule contains Deuterium");
    }
    if built.contains_tritium {
        log.info("This molecule contains Tritium");
    }

    // === Phase 3: Crystal assembly ===
    let mut crystal = context
        .assembler
        .assemble(&AssemblyRequest {
            molecules: &built.molecules,
            deficits: Some(&built.deficits),
            cell: &entry.cell,
            symmetry_operators: &entry.symmetry_operators,
        })
        .map_err(assembly_err)?;

    // === Phase 4: Hydrogen imputation ===
    let mut hydrogens_added = 0;
    let molecules = if built.deficits.is_empty() {
        built.molecules
    } else {
        log.info(format!(
            "{} hydrogen(s) listed without coordinates",
            total_deficit(&built.deficits)
        ));
        let imputation = context
            .imputer
            .impute(built.molecules, &built.deficits)
            .map_err(|source| EngineError::Imputation {
                identifier: identifier.to_string(),
                source,
            })?;
        for site in &imputation.unresolved {
            log.warning(format!(
                "Could not place {} hydrogen(s) on atom {} ({}) of molecule {} with {} neighbour(s)",
                site.missing, site.atom, site.element, site.molecule, site.neighbours
            ));
        }
        if imputation.added > 0 {
            hydrogens_added = imputation.added;
            log.info(format!(
                "Added {} hydrogen(s); reassembling the crystal",
                imputation.added
            ));
            crystal = context
                .assembler
                .assemble(&AssemblyRequest {
                    molecules: &imputation.molecules,
                    deficits: None,
                    cell: &entry.cell,
                    symmetry_operators: &entry.symmetry_operators,
                })
                .map_err(assembly_err)?;
        }
        imputation.molecules
    };
    let stripped = crystal.strip_hydrogen_deficits();
    if stripped > 0 {
        debug!("Removed hydrogen-deficit counters from {} atom(s)", stripped);
    }

    // === Phase 5: Quality evaluation ===
    let smiles = entry.declared_smiles();
    let flags = evaluate(&crystal, &molecules, &DeclaredMetadata::new(&entry, &smiles))
        .map_err(structure_err)?;
    if let Some(e) = &flags.formula_error {
        log.warning(format!("Could not read formula '{}': {}", entry.formula, e));
    }
    match &flags.smiles {
        SmilesComparison::Unavailable { missing_components } => log.info(format!(
            "SMILES comparison skipped; no SMILES for component(s) {:?}",
            missing_components
        )),
        SmilesComparison::Unparseable { component, reason } => log.warning(format!(
            "SMILES of component {} could not be read: {}",
            component, reason
        )),
        SmilesComparison::Compared { .. } if !flags.smiles_match() => {
            log.warning(format!("{} differs from its declared SMILES", identifier))
        }
        SmilesComparison::Compared { .. } => {}
    }
    context.ledger.record_quality(&flags).map_err(ledger_err)?;
    if !flags.smiles_match() {
        context
            .ledger
            .record_smiles_mismatch(identifier, &flags.smiles)
            .map_err(ledger_err)?;
    }

    // === Phase 6: Structure file ===
    let structure_path = if context.config.write_structures {
        let path = structure_path(&context.config.output_dir, identifier);
        ExtendedXyzFile::write_to_path(&crystal, &XyzMetadata::new(identifier), &path).map_err(
            |source| EngineError::Serialization {
                identifier: identifier.to_string(),
                source,
            },
        )?;
        Some(path)
    } else {
        None
    };
    log.info(format!(
        "{} finished with {} atoms in the unit cell",
        identifier,
        crystal.len()
    ));

    Ok(EntryOutcome::Written(EntryReport {
        identifier: identifier.to_string(),
        atom_count: crystal.len(),
        hydrogens_added,
        smiles_match: flags.smiles_match(),
        structure_path,
    }))
}
