pub mod formula;
pub mod harvest;
