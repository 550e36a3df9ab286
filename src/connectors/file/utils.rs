//! Extension helpers shared by the container reader and document builder.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Plain and compressed tar suffixes, matched against the final path component.
pub const TAR_MATCH_PATTERN: &str = r"(?i)\.(tar|tar\.gz|tgz|tar\.bz2|tbz|tbz2|tar\.xz|txz)$";

/// Extensions indexed when no explicit list is configured
pub const DEFAULT_ACCEPTED_EXTENSIONS: &[&str] = &[".txt", ".md", ".mdx", ".conf", ".log"];

fn tar_regex() -> &'static Regex {
    static TAR_RE: OnceLock<Regex> = OnceLock::new();
    TAR_RE.get_or_init(|| Regex::new(TAR_MATCH_PATTERN).expect("Invalid tar pattern"))
}

/// Extension of a file name or path, lowercased, including the leading dot.
///
/// Returns an empty string when there is none. Dot-files such as `.bashrc` have no
/// extension, and only the last suffix counts (`a.tar.gz` → `.gz`).
pub fn get_file_ext(file_path_or_name: impl AsRef<Path>) -> String {
    file_path_or_name
        .as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Whether the final component of `path` names a tar-family archive
pub fn is_tar_archive(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .file_name()
        .map(|name| tar_regex().is_match(&name.to_string_lossy()))
        .unwrap_or(false)
}

/// Base name of an archive-internal member path.
///
/// Archive names always use `/`. A trailing slash (a directory entry) yields an empty name.
pub fn member_base_name(member_path: &str) -> &str {
    member_path.rsplit('/').next().unwrap_or(member_path)
}

/// Predicate deciding which member extensions get indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Build a filter from extensions given with or without the leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .filter(|ext| ext.len() > 1)
            .collect();
        Self { extensions }
    }

    pub fn accepts_ext(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Check whether a file name carries an accepted extension
    pub fn check_file_ext_is_valid(&self, file_name: &str) -> bool {
        self.accepts_ext(&get_file_ext(file_name))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_EXTENSIONS)
    }
}
