//! # Engine Module
//!
//! The pipeline stages that turn one database entry into a validated crystal, together
//! with the collaborator traits that let callers swap the data source, the crystal
//! assembler and the hydrogen imputer.
//!
//! ## Architecture
//!
//! - **Screening** ([`filters`]) - Classification-based rejection before any graph work
//! - **Graph Construction** ([`graph_builder`]) - Raw components into dense molecule
//!   graphs plus the hydrogen-deficit map
//! - **Assembly** ([`assembly`]) - Symmetry expansion of the molecules into a periodic
//!   crystal and its merged graph
//! - **Hydrogen Imputation** ([`hydrogens`]) - Ideal-geometry placement of hydrogens that
//!   the entry lists without coordinates
//! - **Validation** ([`quality`], [`smiles_compare`]) - Formula, charge, spin and SMILES
//!   checks folded into one quality record
//! - **Data Source** ([`provider`]) - The entry provider trait and a JSON directory
//!   implementation
//! - **Configuration** ([`config`]), **Progress Monitoring** ([`progress`]) and
//!   **Error Handling** ([`error`])
//!
//! Every stage is a pure function of its inputs or a `Send + Sync` trait object, so a
//! stage can be driven from any number of worker threads at once.

pub mod assembly;
pub mod config;
pub mod error;
pub mod filters;
pub mod graph_builder;
pub mod hydrogens;
pub mod progress;
pub mod provider;
pub mod quality;
pub mod smiles_compare;
