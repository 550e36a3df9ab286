//! Container reader: turns one location into a sequence of (base name, stream) members.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::ControlFlow;
use std::path::Path;

use super::utils::{get_file_ext, is_tar_archive, member_base_name};
use crate::error::{IngestError, Result};

/// Kind of container a location refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Zip,
    Tar,
    /// A lone text file, read as a one-member container
    Text,
}

impl ContainerKind {
    /// Classify a location by its file name; `None` for unsupported locations
    pub fn classify(path: &Path) -> Option<Self> {
        match get_file_ext(path).as_str() {
            ".zip" => Some(Self::Zip),
            ".txt" => Some(Self::Text),
            _ if is_tar_archive(path) => Some(Self::Tar),
            _ => None,
        }
    }
}

/// Compression wrapped around a tar stream, sniffed from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if magic.starts_with(b"BZh") {
            Self::Bzip2
        } else if magic.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else {
            Self::None
        }
    }
}

/// Visit every member of the container at `path`, in container order.
///
/// `visit` receives the member's base name and a reader positioned at the start of its
/// content. Each member is opened once; returning `ControlFlow::Break` stops traversal
/// before the next member is opened. The archive handle is dropped when this returns,
/// whether traversal finished, was stopped, or failed.
///
/// Unsupported locations are logged and yield no members.
pub fn open_files_at_location<F>(path: &Path, mut visit: F) -> Result<ControlFlow<()>>
where
    F: FnMut(&str, &mut dyn Read) -> Result<ControlFlow<()>>,
{
    match ContainerKind::classify(path) {
        Some(ContainerKind::Zip) => read_zip(path, &mut visit),
        Some(ContainerKind::Tar) => read_tar(path, &mut visit),
        Some(ContainerKind::Text) => read_text(path, &mut visit),
        None => {
            log::warn!(
                "Skipping file '{}' with extension '{}'",
                path.display(),
                get_file_ext(path)
            );
            Ok(ControlFlow::Continue(()))
        }
    }
}

fn archive_error(path: &Path, err: impl std::fmt::Display) -> IngestError {
    IngestError::Archive(format!("{}: {}", path.display(), err))
}

fn read_zip<F>(path: &Path, visit: &mut F) -> Result<ControlFlow<()>>
where
    F: FnMut(&str, &mut dyn Read) -> Result<ControlFlow<()>>,
{
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| archive_error(path, e))?;
    log::debug!("Opened zip '{}' ({} entries)", path.display(), archive.len());

    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(|e| archive_error(path, e))?;
        let name = member_base_name(member.name()).to_string();

        if visit(&name, &mut member)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }

    Ok(ControlFlow::Continue(()))
}

fn open_tar_stream(path: &Path) -> Result<Box<dyn Read>> {
    let mut reader = BufReader::new(File::open(path)?);
    let compression = TarCompression::sniff(reader.fill_buf()?);
    log::debug!("Opened tar '{}' ({:?} compression)", path.display(), compression);

    Ok(match compression {
        TarCompression::None => Box::new(reader),
        TarCompression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
        TarCompression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
        TarCompression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
    })
}

fn read_tar<F>(path: &Path, visit: &mut F) -> Result<ControlFlow<()>>
where
    F: FnMut(&str, &mut dyn Read) -> Result<ControlFlow<()>>,
{
    let mut archive = tar::Archive::new(open_tar_stream(path)?);
    let entries = archive.entries().map_err(|e| archive_error(path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| archive_error(path, e))?;

        // Directories, links and special files carry no content
        let entry_type = entry.header().entry_type();
        if !(entry_type.is_file() || entry_type == tar::EntryType::Continuous) {
            continue;
        }

        let name = match entry.path() {
            Ok(member_path) => member_base_name(&member_path.to_string_lossy()).to_string(),
            Err(e) => {
                log::debug!("Skipping unreadable member in '{}': {}", path.display(), e);
                continue;
            }
        };

        if visit(&name, &mut entry)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }

    Ok(ControlFlow::Continue(()))
}

fn read_text<F>(path: &Path, visit: &mut F) -> Result<ControlFlow<()>>
where
    F: FnMut(&str, &mut dyn Read) -> Result<ControlFlow<()>>,
{
    let mut file = File::open(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    visit(&name, &mut file)
}
