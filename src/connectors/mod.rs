pub mod file;

use std::ops::ControlFlow;

use crate::error::Result;
use crate::models::Document;

pub use file::LocalFileConnector;

/// Arbitrary key-value credentials handed to a connector
pub type Credentials = serde_json::Map<String, serde_json::Value>;

/// Receives each finished batch; `ControlFlow::Break` stops the load
pub type BatchSink<'a> = dyn FnMut(Vec<Document>) -> ControlFlow<()> + 'a;

/// What a load delivered before it returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub batches: usize,
    pub documents: usize,
    /// False when the consumer stopped the load before every location was read
    pub completed: bool,
}

impl LoadSummary {
    pub(crate) fn deliver(&mut self, batch: Vec<Document>, sink: &mut BatchSink<'_>) -> ControlFlow<()> {
        self.batches += 1;
        self.documents += batch.len();
        sink(batch)
    }
}

/// Interface shared by connectors that load a full snapshot of their source
pub trait LoadConnector {
    /// Accept credentials, returning any updated credentials that should be persisted
    fn load_credentials(&mut self, credentials: &Credentials) -> Option<Credentials>;

    /// Stream every document from the source to `on_batch`, in batches.
    ///
    /// Each call starts from scratch. Batches already handed to `on_batch` stay delivered
    /// when a later error aborts the load; documents not yet batched are dropped.
    fn load_from_state(&self, on_batch: &mut BatchSink<'_>) -> Result<LoadSummary>;
}
