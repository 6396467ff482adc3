pub mod atom;
pub mod crystal;
pub mod entry;
pub mod graph;
pub mod molecule;
pub mod quality;
pub mod symmetry;
pub mod topology;
