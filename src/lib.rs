pub mod config;
pub mod connectors;
pub mod error;
pub mod models;

pub use config::Config;
pub use connectors::{LoadConnector, LoadSummary, LocalFileConnector};
pub use error::{IngestError, Result};
pub use models::{Document, DocumentSource, Section};
