use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    File,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::File => "file",
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section within a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Source link, empty when the file carried none
    pub link: String,
    pub text: String,
}

/// A normalized document ready for indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub sections: Vec<Section>,
    pub source: DocumentSource,
    pub semantic_identifier: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Build the single-section document produced for one ingested file.
    ///
    /// `id` and `semantic_identifier` are both the file's base name. Document-level
    /// metadata stays empty: a file's sidecar only ever contributes the section link.
    pub fn from_file(file_name: &str, link: String, text: String) -> Self {
        Self {
            id: file_name.to_string(),
            sections: vec![Section { link, text }],
            source: DocumentSource::File,
            semantic_identifier: file_name.to_string(),
            metadata: BTreeMap::new(),
        }
    }
}
