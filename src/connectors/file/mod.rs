pub mod container;
pub mod document;
pub mod utils;

use std::ops::ControlFlow;
use std::path::PathBuf;

use super::{BatchSink, Credentials, LoadConnector, LoadSummary};
use crate::config::ConnectorConfig;
use crate::error::{IngestError, Result};
use crate::models::Document;

pub use container::{open_files_at_location, ContainerKind};
pub use document::{parse_metadata_line, process_file, SidecarMetadata, METADATA_FLAG};
pub use utils::{get_file_ext, is_tar_archive, ExtensionFilter, TAR_MATCH_PATTERN};

/// Default number of documents per batch
pub const INDEX_BATCH_SIZE: usize = 16;

/// Connector over local text files and zip/tar archives.
///
/// Locations are read in order, one member at a time, and documents are handed to the
/// caller in batches of at most `batch_size`. Nothing is cached between loads; every call
/// to [`LoadConnector::load_from_state`] starts again from the first location.
#[derive(Debug, Clone)]
pub struct LocalFileConnector {
    file_locations: Vec<PathBuf>,
    batch_size: usize,
    extension_filter: ExtensionFilter,
}

impl LocalFileConnector {
    /// Create a connector with the default accepted extensions
    pub fn new<I, P>(file_locations: I, batch_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        if batch_size == 0 {
            return Err(IngestError::InvalidInput(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            file_locations: file_locations.into_iter().map(Into::into).collect(),
            batch_size,
            extension_filter: ExtensionFilter::default(),
        })
    }

    /// Create a connector from the `[connector]` configuration section
    pub fn from_config<I, P>(file_locations: I, config: &ConnectorConfig) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let filter = config.extension_filter();
        if filter.is_empty() {
            return Err(IngestError::Config(
                "connector.accepted_extensions must not be empty".to_string(),
            ));
        }
        Ok(Self::new(file_locations, config.batch_size)?.with_extension_filter(filter))
    }

    pub fn with_extension_filter(mut self, extension_filter: ExtensionFilter) -> Self {
        self.extension_filter = extension_filter;
        self
    }

    pub fn file_locations(&self) -> &[PathBuf] {
        &self.file_locations
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn extension_filter(&self) -> &ExtensionFilter {
        &self.extension_filter
    }
}

impl LoadConnector for LocalFileConnector {
    /// Local files need no credentials
    fn load_credentials(&mut self, _credentials: &Credentials) -> Option<Credentials> {
        None
    }

    fn load_from_state(&self, on_batch: &mut BatchSink<'_>) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        let mut documents: Vec<Document> = Vec::with_capacity(self.batch_size);

        for location in &self.file_locations {
            log::info!("Reading location '{}'", location.display());

            let flow = open_files_at_location(location, |file_name, file| {
                if let Some(document) = process_file(file_name, file, &self.extension_filter)? {
                    log::debug!("Built document '{}'", document.id);
                    documents.push(document);
                }

                if documents.len() >= self.batch_size {
                    let batch =
                        std::mem::replace(&mut documents, Vec::with_capacity(self.batch_size));
                    return Ok(summary.deliver(batch, &mut *on_batch));
                }
                Ok(ControlFlow::Continue(()))
            })?;

            if flow.is_break() {
                log::info!(
                    "Load stopped by consumer after {} batch(es), {} document(s)",
                    summary.batches,
                    summary.documents
                );
                return Ok(summary);
            }
        }

        if !documents.is_empty() {
            // Nothing is left to read, so a break here changes nothing
            let _ = summary.deliver(documents, on_batch);
        }

        summary.completed = true;
        log::info!(
            "Loaded {} document(s) in {} batch(es) from {} location(s)",
            summary.documents,
            summary.batches,
            self.file_locations.len()
        );
        Ok(summary)
    }
}
