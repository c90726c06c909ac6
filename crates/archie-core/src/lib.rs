pub mod aggregate;
pub mod clone;
pub mod config;
pub mod detail;
pub mod error;
pub mod export;
pub mod fuzzy;
pub mod graph;
pub mod io;
pub mod markdown;
pub mod parser;
pub mod paths;
pub mod project;
pub mod status;

pub use aggregate::Summary;
pub use detail::{normalize_feature_key, FeatureDetail};
pub use error::{ArchieError, Result};
pub use graph::DependencyGraph;
pub use parser::{parse_features_dir, Feature};
pub use status::FeatureStatus;
