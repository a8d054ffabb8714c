/// Gas product catalog loading from config.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

/// Runtime settings loaded from environment variables
pub mod settings;

pub use catalog::{Catalog, ProductConfig, load_catalog};
pub use settings::AppConfig;
