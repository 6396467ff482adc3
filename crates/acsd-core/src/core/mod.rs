//! # Core Module
//!
//! Fundamental data structures and helpers shared by every pipeline stage.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Atoms, bonds, attributed graphs, molecule sets,
//!   crystals, unit cells, symmetry operators and the raw database entry records
//! - **Chemistry** ([`chem`]) - Static element tables, the declared-formula parser and a
//!   SMILES reader producing connectivity graphs
//! - **File I/O** ([`io`]) - Extended XYZ serialization, append-only quality and skip
//!   ledgers, and the timestamped run logbook
//! - **Utilities** ([`utils`]) - Geometric helpers for placing hydrogen atoms
//!
//! Nothing in this module holds mutable state shared between entries except the file
//! sinks in [`io`], which serialize their appends behind a lock.

pub mod chem;
pub mod io;
pub mod models;
pub mod utils;
