//! # ACSD Core Library
//!
//! Turns crystallographic database entries into validated, serialized periodic crystal
//! structures with an auditable trail of quality flags and skip ledgers.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that data, algorithms and orchestration
//! stay independently testable.
//!
//! - **[`core`]: The Foundation.** Stateless data models (molecules, attributed graphs,
//!   crystals, entries), chemistry helpers (element tables, formula and SMILES readers),
//!   and file I/O (extended XYZ, append-only ledgers, the run logbook).
//!
//! - **[`engine`]: The Pipeline Stages.** Graph construction from raw entry components,
//!   classification filtering, symmetry-driven crystal assembly, hydrogen imputation,
//!   quality evaluation and SMILES comparison. Collaborators with replaceable
//!   implementations (entry provider, assembler, imputer) sit behind traits.
//!
//! - **[`workflows`]: The Public API.** Ties the stages together into the per-identifier
//!   pipeline and the parallel harvest run that folds per-entry outcomes into a summary.

pub mod core;
pub mod engine;
pub mod workflows;
