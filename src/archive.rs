//! Unpacking of downloaded source bundles.

use std::{
    fs,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, warn};

use crate::error::{FigcapError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
    /// A single gzip-compressed file.
    Gzip,
}

impl ArchiveKind {
    /// Pick the format from the response content type, letting the payload's
    /// magic bytes win when the two disagree.
    pub fn detect(content_type: Option<&str>, data: &[u8]) -> Option<Self> {
        if data.starts_with(b"PK") {
            return Some(Self::Zip);
        }
        if data.starts_with(&GZIP_MAGIC) {
            return Some(if is_tar_stream(data) { Self::TarGz } else { Self::Gzip });
        }
        match content_type.map(|c| c.split(';').next().unwrap_or("").trim()) {
            Some("application/x-eprint-tar") => Some(Self::TarGz),
            Some("application/x-eprint") => Some(Self::Zip),
            _ => None,
        }
    }
}

fn is_tar_stream(gz: &[u8]) -> bool {
    let mut header = [0u8; 512];
    let mut decoder = GzDecoder::new(gz);
    if decoder.read_exact(&mut header).is_err() {
        return false;
    }
    &header[257..262] == b"ustar"
}

/// Unpack `data` into `dest`, returning the files written.
///
/// `single_name` names the output when the payload is one gzipped file.
/// Entries that would land outside `dest` are skipped.
///
/// A `dest` created here is removed again if unpacking fails, so a corrupt
/// payload does not leave a partial directory behind.
pub fn unpack(kind: ArchiveKind, data: &[u8], dest: &Path, single_name: &str) -> Result<Vec<PathBuf>> {
    let existed = dest.exists();
    fs::create_dir_all(dest).map_err(|e| FigcapError::io(dest, e))?;

    let result = unpack_into(kind, data, dest, single_name);
    if result.is_err() && !existed {
        if let Err(e) = fs::remove_dir_all(dest) {
            warn!("could not remove partial {}: {}", dest.display(), e);
        }
    }
    result
}

fn unpack_into(kind: ArchiveKind, data: &[u8], dest: &Path, single_name: &str) -> Result<Vec<PathBuf>> {
    match kind {
        ArchiveKind::TarGz => unpack_tar_gz(data, dest),
        ArchiveKind::Zip => unpack_zip(data, dest),
        ArchiveKind::Gzip => {
            let mut buf = Vec::new();
            GzDecoder::new(data)
                .read_to_end(&mut buf)
                .map_err(|e| FigcapError::Archive(format!("Failed to decompress gzip: {}", e)))?;
            let out = dest.join(single_name);
            fs::write(&out, &buf).map_err(|e| FigcapError::io(&out, e))?;
            Ok(vec![out])
        }
    }
}

fn unpack_tar_gz(data: &[u8], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = Archive::new(GzDecoder::new(data));
    let entries = archive
        .entries()
        .map_err(|e| FigcapError::Archive(format!("Failed to read tar.gz: {}", e)))?;

    let mut written = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| FigcapError::Archive(format!("Failed to read tar entry: {}", e)))?;
        let path = entry
            .path()
            .map_err(|e| FigcapError::Archive(format!("Failed to read entry path: {}", e)))?
            .to_path_buf();

        let is_file = entry.header().entry_type().is_file();
        // unpack_in refuses paths that escape `dest` and reports false.
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| FigcapError::Archive(format!("Failed to extract {}: {}", path.display(), e)))?;
        if !unpacked {
            debug!("skipping tar entry outside destination: {}", path.display());
            continue;
        }
        if is_file {
            written.push(dest.join(&path));
        }
    }
    Ok(written)
}

fn unpack_zip(data: &[u8], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| FigcapError::Archive(format!("Failed to open ZIP: {}", e)))?;

    let mut written = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| FigcapError::Archive(format!("Failed to read ZIP entry: {}", e)))?;

        let Some(name) = file.enclosed_name() else {
            debug!("skipping zip entry outside destination: {}", file.name());
            continue;
        };
        let out = dest.join(name);

        if file.is_dir() {
            fs::create_dir_all(&out).map_err(|e| FigcapError::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| FigcapError::io(parent, e))?;
        }

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| FigcapError::Archive(format!("Failed to extract {}: {}", out.display(), e)))?;
        fs::write(&out, &buf).map_err(|e| FigcapError::io(&out, e))?;
        written.push(out);
    }
    Ok(written)
}
