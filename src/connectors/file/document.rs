use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::io::{BufRead, BufReader, Read};

use super::utils::{get_file_ext, ExtensionFilter};
use crate::error::{IngestError, Result};
use crate::models::Document;

/// Marker that turns a file's first line into a JSON metadata sidecar
pub const METADATA_FLAG: &str = "#DANSWER_METADATA=";

/// Metadata carried on the first line of a file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SidecarMetadata {
    #[serde(default)]
    pub link: Option<String>,
    /// Keys with no meaning to the connector; never attached to the document
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Parse a sidecar line of the form `#DANSWER_METADATA={...}`.
///
/// The flag is stripped once and the remainder must be a JSON object.
pub fn parse_metadata_line(line: &str) -> std::result::Result<SidecarMetadata, serde_json::Error> {
    let payload = line.strip_prefix(METADATA_FLAG).unwrap_or(line);
    serde_json::from_str(payload.trim())
}

/// Build a document from one named member stream.
///
/// Returns `Ok(None)` without reading the stream when the extension is not accepted.
/// Content is read line by line with terminators kept, so the section text is the
/// original bytes minus a leading sidecar line. Invalid UTF-8 and a malformed sidecar
/// both fail the whole file.
pub fn process_file<R: Read>(
    file_name: &str,
    file: R,
    filter: &ExtensionFilter,
) -> Result<Option<Document>> {
    if !filter.check_file_ext_is_valid(file_name) {
        log::warn!(
            "Skipping file '{}' with extension '{}'",
            file_name,
            get_file_ext(file_name)
        );
        return Ok(None);
    }

    let mut reader = BufReader::new(file);
    let mut metadata = SidecarMetadata::default();
    let mut content = String::new();
    let mut raw_line = Vec::new();
    let mut first_line = true;

    loop {
        raw_line.clear();
        if reader.read_until(b'\n', &mut raw_line)? == 0 {
            break;
        }

        let line = std::str::from_utf8(&raw_line).map_err(|e| {
            IngestError::Decode(format!("{} is not valid UTF-8: {}", file_name, e))
        })?;

        if first_line && line.starts_with(METADATA_FLAG) {
            metadata = parse_metadata_line(line).map_err(|e| {
                IngestError::Metadata(format!("Invalid metadata line in {}: {}", file_name, e))
            })?;
        } else {
            content.push_str(line);
        }
        first_line = false;
    }

    if !metadata.extra.is_empty() {
        log::debug!(
            "Ignoring {} extra metadata key(s) in {}",
            metadata.extra.len(),
            file_name
        );
    }

    Ok(Some(Document::from_file(
        file_name,
        metadata.link.unwrap_or_default(),
        content,
    )))
}
