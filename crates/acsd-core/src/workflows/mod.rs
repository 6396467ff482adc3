//! # Workflows Module
//!
//! High-level entry points that run the whole pipeline for lists of identifiers.
//!
//! ## Architecture
//!
//! - **Harvest Workflow** ([`harvest`]) - Fetches, screens, assembles, completes and
//!   validates each entry, writes its structure file and ledger records, and folds the
//!   per-identifier outcomes into a run summary.
//!
//! Identifiers are processed in parallel on the global `rayon` pool. The only state the
//! workers share is the set of append-only ledgers and the logbook.

pub mod harvest;
