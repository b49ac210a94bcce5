pub mod classifier;
pub mod config;
pub mod dialect;
pub mod dom;
pub mod engine;
pub mod model;
pub mod panel;
pub mod registry;
pub mod selector;
pub mod storage;
pub mod visibility;
pub mod watcher;

#[cfg(feature = "tui")]
pub mod tui;

pub use engine::{Engine, EngineOptions};
pub use model::{Category, CategoryMap, Partition};
