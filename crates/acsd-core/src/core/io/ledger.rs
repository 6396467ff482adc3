//! Append-only ledgers kept in the output directory.
//!
//! Each file has its own lock, so appending one record is atomic with respect to other
//! workers. Files are created on first use; the quality CSV gets its header only when it
//! is created, which lets repeated runs accumulate rows in the same ledger.

use crate::core::models::quality::{QualityFlags, SmilesComparison};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const QUALITY_LEDGER: &str = "crystal_quality_information.csv";
pub const SMILES_MISMATCH_LIST: &str = "different_to_smiles.gcd";
pub const SMILES_MISMATCH_DETAILS: &str = "different_to_smiles.txt";
pub const NOT_FOUND_LEDGER: &str = "could_not_find_identifiers.txt";
pub const NO_COORDINATES_LEDGER: &str = "no_coordinates_given.txt";
pub const REJECTED_LEDGER: &str = "rejected_crystals.txt";
pub const NOT_WRITTEN_LEDGER: &str = "crystals_not_written.txt";

pub const QUALITY_HEADER: [&str; 6] = [
    "Identifier",
    "Has Disorder",
    "Crystal different to Crystallographer Drawing (including Hydrogens)",
    "Crystal different to Crystallographer Drawing (excluding Hydrogens)",
    "Is Total Charge 0",
    "Is Total Multiplicity 1",
];

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to write ledger {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to write CSV ledger {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Failed to encode SMILES difference for {identifier}: {source}")]
    Encode {
        identifier: String,
        source: serde_json::Error,
    },
    #[error("Ledger lock for {0} was poisoned by a panicking worker")]
    Poisoned(PathBuf),
}

/// Why an identifier produced no structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipCategory {
    NotFound,
    NoCoordinates,
    Rejected,
    /// A fatal error; recorded only in the catch-all ledger.
    Failed,
}

impl SkipCategory {
    /// The category-specific ledger, if the category has one.
    pub fn ledger_file(&self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some(NOT_FOUND_LEDGER),
            Self::NoCoordinates => Some(NO_COORDINATES_LEDGER),
            Self::Rejected => Some(REJECTED_LEDGER),
            Self::Failed => None,
        }
    }
}

impl fmt::Display for SkipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::NotFound => "not found",
                Self::NoCoordinates => "no coordinates",
                Self::Rejected => "rejected",
                Self::Failed => "failed",
            }
        )
    }
}

/// Destination for the per-identifier records of a harvest run.
pub trait LedgerSink: Send + Sync {
    fn record_quality(&self, flags: &QualityFlags) -> Result<(), LedgerError>;

    /// Records an identifier whose reconstructed molecules did not match its SMILES.
    fn record_smiles_mismatch(
        &self,
        identifier: &str,
        comparison: &SmilesComparison,
    ) -> Result<(), LedgerError>;

    /// Records a skipped identifier in its category ledger and in the catch-all
    /// `crystals_not_written.txt`.
    fn record_skip(
        &self,
        category: SkipCategory,
        identifier: &str,
        reason: &str,
    ) -> Result<(), LedgerError>;
}

/// A lazily opened text file appended to one line at a time.
#[derive(Debug)]
struct AppendFile {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl AppendFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            handle: Mutex::new(None),
        }
    }

    fn append_line(&self, line: &str) -> Result<(), LedgerError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| LedgerError::Poisoned(self.path.clone()))?;
        let io_err = |source: io::Error| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(io_err)?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", line).map_err(io_err)?;
            file.flush().map_err(io_err)?;
        }
        Ok(())
    }
}

/// The standard ledger set, written as plain files under one directory.
#[derive(Debug)]
pub struct DirectoryLedger {
    root: PathBuf,
    quality: Mutex<Option<csv::Writer<File>>>,
    smiles_list: AppendFile,
    smiles_details: AppendFile,
    not_found: AppendFile,
    no_coordinates: AppendFile,
    rejected: AppendFile,
    not_written: AppendFile,
}

impl DirectoryLedger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let file = |name: &str| AppendFile::new(root.join(name));
        Self {
            quality: Mutex::new(None),
            smiles_list: file(SMILES_MISMATCH_LIST),
            smiles_details: file(SMILES_MISMATCH_DETAILS),
            not_found: file(NOT_FOUND_LEDGER),
            no_coordinates: file(NO_COORDINATES_LEDGER),
            rejected: file(REJECTED_LEDGER),
            not_written: file(NOT_WRITTEN_LEDGER),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn quality_path(&self) -> PathBuf {
        self.root.join(QUALITY_LEDGER)
    }

    fn open_quality_writer(&self) -> Result<csv::Writer<File>, LedgerError> {
        let path = self.quality_path();
        let io_err = |source: io::Error| LedgerError::Io {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_new = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(QUALITY_HEADER)
                .map_err(|source| LedgerError::Csv {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(writer)
    }
}

impl LedgerSink for DirectoryLedger {
    fn record_quality(&self, flags: &QualityFlags) -> Result<(), LedgerError> {
        let mut guard = self
            .quality
            .lock()
            .map_err(|_| LedgerError::Poisoned(self.quality_path()))?;
        if guard.is_none() {
            *guard = Some(self.open_quality_writer()?);
        }
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        let record = [
            flags.identifier.clone(),
            py_bool(flags.has_disorder),
            py_bool(flags.differs_with_hydrogens),
            py_bool(flags.differs_without_hydrogens),
            py_bool(flags.is_charge_zero),
            py_bool(flags.is_multiplicity_one),
        ];
        writer
            .write_record(&record)
            .map_err(|source| LedgerError::Csv {
                path: self.quality_path(),
                source,
            })?;
        writer.flush().map_err(|source| LedgerError::Io {
            path: self.quality_path(),
            source,
        })
    }

    fn record_smiles_mismatch(
        &self,
        identifier: &str,
        comparison: &SmilesComparison,
    ) -> Result<(), LedgerError> {
        let payload = match comparison {
            SmilesComparison::Compared { .. } => serde_json::to_string(comparison),
            _ => Ok("null".to_string()),
        }
        .map_err(|source| LedgerError::Encode {
            identifier: identifier.to_string(),
            source,
        })?;

        self.smiles_list.append_line(identifier)?;
        self.smiles_details
            .append_line(&format!("{}\t{}", identifier, payload))
    }

    fn record_skip(
        &self,
        category: SkipCategory,
        identifier: &str,
        reason: &str,
    ) -> Result<(), LedgerError> {
        let line = if reason.is_empty() {
            identifier.to_string()
        } else {
            format!("{}: {}", identifier, reason)
        };
        let category_file = match category {
            SkipCategory::NotFound => Some(&self.not_found),
            SkipCategory::NoCoordinates => Some(&self.no_coordinates),
            SkipCategory::Rejected => Some(&self.rejected),
            SkipCategory::Failed => None,
        };
        if let Some(file) = category_file {
            file.append_line(&line)?;
        }
        self.not_written.append_line(&line)
    }
}

// Capitalized booleans, as downstream spreadsheets already expect them.
fn py_bool(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}
