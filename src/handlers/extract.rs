use std::path::Path;

use anyhow::{Context, Result};

use crate::{extract::extract_tree, printer, record::FigureRecord, store::JsonStore};

pub fn run(sources: &Path, figures: &Path, output: &Path) -> Result<()> {
    let store = JsonStore::new(output);
    let mut records: Vec<FigureRecord> = store.load()?;

    let found = extract_tree(sources, figures)
        .with_context(|| format!("extracting figures from {}", sources.display()))?;
    let added = found.len();
    records.extend(found);

    store.write(&records)?;
    printer::stage_done("extract", added, records.len(), output);
    Ok(())
}
