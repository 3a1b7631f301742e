//! Output-path rewriting and save/show call substitution for generated code.
//!
//! The code transform is plain text substitution; snippets that would not
//! parse are still rewritten.

use std::{fs, path::Path};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{FigcapError, Result};

static SAVEFIG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_.]*)\.savefig\([^)]*\)").unwrap());
static SHOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bplt\.show\([^)]*\)").unwrap());

/// Build `<root>/<collection_id>/<stem>_<suffix>.png`, creating the
/// collection directory if needed.
pub fn output_figure_path(root: &Path, figure_path: &str, collection_id: &str, suffix: &str) -> Result<String> {
    let normalized = figure_path.replace('\\', "/");
    let file_name = normalized.rsplit('/').next().unwrap_or_default();
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dir = root.join(collection_id);
    fs::create_dir_all(&dir).map_err(|e| FigcapError::io(&dir, e))?;

    let path = dir.join(format!("{stem}_{suffix}.png"));
    Ok(path.to_string_lossy().replace('\\', "/"))
}

/// Point every `savefig` call at `target` and drop `plt.show()` calls.
pub fn prepare_code(code: &str, target: &str) -> String {
    let literal = target.replace('\\', "/").replace('\'', "\\'");
    let saved = SAVEFIG_RE.replace_all(code, |caps: &Captures| {
        format!("{}.savefig('{}')", &caps[1], literal)
    });
    SHOW_RE.replace_all(&saved, "").into_owned()
}
