//! Figure/caption mining from LaTeX source trees.
//!
//! Parsing is loose: a figure block that does not match, a
//! caption that still contains braces, or an image that cannot be found is
//! skipped without error.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    error::{FigcapError, Result},
    record::FigureRecord,
};

const DOCUMENT_EXTENSIONS: &[&str] = &["tex"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const VECTOR_EXTENSIONS: &[&str] = &["pdf", "eps", "ps", "svg"];

static FIGURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{figure\*?\}(.*?)\\end\{figure\*?\}").unwrap());
static GRAPHICS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\includegraphics\s*(?:\[[^\]]*\])?\s*\{([^}]*)\}.*?\\caption\s*(?:\[[^\]]*\])?\{([^}]*)\}")
        .unwrap()
});

/// A figure block found in a document, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureMatch {
    pub reference: String,
    pub caption: String,
}

/// Remove `%` line comments. An escaped `\%` is kept as text.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&line[..comment_start(line).unwrap_or(line.len())]);
    }
    out
}

fn comment_start(line: &str) -> Option<usize> {
    let mut backslashes = 0usize;
    for (idx, ch) in line.char_indices() {
        match ch {
            '\\' => backslashes += 1,
            '%' if backslashes % 2 == 0 => return Some(idx),
            _ => backslashes = 0,
        }
    }
    None
}

/// Find every figure environment in already comment-stripped text.
///
/// The image and caption must both sit inside the same environment; one
/// missing either is skipped.
pub fn find_figures(text: &str) -> Vec<FigureMatch> {
    FIGURE_RE
        .captures_iter(text)
        .filter_map(|env| {
            let body = env.get(1)?.as_str();
            let caps = GRAPHICS_RE.captures(body)?;
            Some(FigureMatch {
                reference: caps[1].trim().to_string(),
                caption: caps[2].to_string(),
            })
        })
        .collect()
}

/// Collapse whitespace and reject captions that still carry braces.
pub fn normalize_caption(raw: &str) -> Option<String> {
    let caption = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if caption.contains('{') || caption.contains('}') {
        return None;
    }
    Some(caption)
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn has_image_extension(path: &Path) -> bool {
    has_extension_in(path, IMAGE_EXTENSIONS)
}

/// Resolve an `\includegraphics` argument against the document's directory.
///
/// Only existing raster files are accepted. LaTeX lets authors omit the
/// extension, so any reference without a known graphics extension (`plot`,
/// `plot.v2`) is tried with each raster extension appended.
pub fn resolve_image(base_dir: &Path, reference: &str) -> Option<PathBuf> {
    let reference = reference.replace('\\', "/");
    let candidate = base_dir.join(&reference);

    if has_image_extension(&candidate) {
        return candidate.is_file().then_some(candidate);
    }
    if has_extension_in(&candidate, VECTOR_EXTENSIONS) {
        return None;
    }

    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| base_dir.join(format!("{reference}.{ext}")))
        .find(|p| p.is_file())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Mine one collection directory, copying accepted images into `dest`.
pub fn extract_collection(src: &Path, dest: &Path, collection_id: &str) -> Result<Vec<FigureRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(src).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_document(path) {
            continue;
        }

        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!("skipping unreadable document {}: {}", path.display(), e);
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let cleaned = strip_comments(&content);
        let base_dir = path.parent().unwrap_or(src);

        for fig in find_figures(&cleaned) {
            let Some(caption) = normalize_caption(&fig.caption) else {
                debug!("rejecting caption with unbalanced braces in {}", path.display());
                continue;
            };
            let Some(image) = resolve_image(base_dir, &fig.reference) else {
                debug!("no raster image for {} in {}", fig.reference, path.display());
                continue;
            };
            let Some(file_name) = image.file_name() else {
                continue;
            };

            fs::create_dir_all(dest).map_err(|e| FigcapError::io(dest, e))?;
            let target = dest.join(file_name);
            fs::copy(&image, &target).map_err(|e| FigcapError::io(&target, e))?;

            records.push(FigureRecord {
                figure_path: slash_path(&target),
                caption,
                source: slash_path(path),
                collection_id: collection_id.to_string(),
            });
        }
    }

    Ok(records)
}

/// Mine every collection directly under `top`; the directory name is the
/// collection id and images land in `figures_root/<id>/`.
pub fn extract_tree(top: &Path, figures_root: &Path) -> Result<Vec<FigureRecord>> {
    let mut collections: Vec<PathBuf> = fs::read_dir(top)
        .map_err(|e| FigcapError::io(top, e))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    collections.sort();

    let bar = ProgressBar::new(collections.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let mut records = Vec::new();
    for dir in collections {
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(id.clone());
        info!("Processing {}", id);

        let found = extract_collection(&dir, &figures_root.join(&id), &id)?;
        debug!("{} figures accepted from {}", found.len(), id);
        records.extend(found);
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(records)
}
