// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod category;
pub mod partition;

pub use category::{Category, CategoryMap};
pub use partition::Partition;
