//! Configuration and dependency wiring for the ingester.

pub mod dependencies;
pub mod settings;

pub use dependencies::{CatalogBackend, Dependencies};
pub use settings::IngestSettings;
