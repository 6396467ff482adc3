//! File output for the crystal database: structure files, append-only ledgers and the
//! run logbook. Every sink here is safe to share between worker threads.

pub mod ledger;
pub mod logbook;
pub mod traits;
pub mod xyz;
