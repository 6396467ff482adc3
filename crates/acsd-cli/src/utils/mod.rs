pub mod identifiers;
pub mod progress;
