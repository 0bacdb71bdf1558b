pub mod build;
pub mod cli;
pub mod config;
pub mod dart;
pub mod deps;
pub mod emit;
pub mod error;
pub mod model;
pub mod package;
pub mod resolve;
pub mod tree;

pub use build::{BuildRecord, BuildState, BuildTracker, HttpBuildClient, RetryPolicy};
pub use config::Config;
pub use emit::FileMap;
pub use error::{BuildError, GenerateError};
pub use model::Snapshot;
pub use resolve::{ResolvedValue, Resolver};
pub use tree::{resolve_tree, WidgetForest};
