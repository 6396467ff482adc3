use super::assembly::AssemblyError;
use super::hydrogens::ImputationError;
use super::provider::ProviderError;
use crate::core::io::ledger::LedgerError;
use crate::core::io::xyz::XyzError;
use crate::core::models::molecule::StructureError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A fatal failure while processing one identifier. Other identifiers are unaffected.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("[{identifier}] Malformed structure: {source}")]
    Structure {
        identifier: String,
        source: StructureError,
    },

    #[error("[{identifier}] Failed to load entry: {source}")]
    Provider {
        identifier: String,
        source: ProviderError,
    },

    #[error("[{identifier}] Crystal assembly failed: {source}")]
    Assembly {
        identifier: String,
        source: AssemblyError,
    },

    #[error("[{identifier}] Hydrogen imputation failed: {source}")]
    Imputation {
        identifier: String,
        source: ImputationError,
    },

    #[error("[{identifier}] Failed to update ledger: {source}")]
    Ledger {
        identifier: String,
        source: LedgerError,
    },

    #[error("[{identifier}] Failed to write structure file: {source}")]
    Serialization { identifier: String, source: XyzError },
}

impl EngineError {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Structure { identifier, .. }
            | Self::Provider { identifier, .. }
            | Self::Assembly { identifier, .. }
            | Self::Imputation { identifier, .. }
            | Self::Ledger { identifier, .. }
            | Self::Serialization { identifier, .. } => identifier,
        }
    }
}

/// Failures that stop a whole run before any identifier is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDirectory { path: PathBuf, source: io::Error },

    #[error("Failed to open logbook {path}: {source}")]
    Logbook { path: PathBuf, source: io::Error },
}
