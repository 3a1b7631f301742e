//! Run handler: execute generated snippets and persist execution records.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};

use crate::{
    execution::{run_batch, BatchOptions, BatchSummary},
    printer,
    process::python::PythonSandbox,
    record::{ExecutionRecord, GeneratedRecord},
    store::JsonStore,
};

pub async fn run(input: &Path, output: &Path, opts: &BatchOptions, python: &str, timeout: Duration) -> Result<()> {
    let items: Vec<GeneratedRecord> = JsonStore::new(input)
        .read()
        .with_context(|| format!("reading generated records from {}", input.display()))?;

    let store = JsonStore::new(output);
    let mut records: Vec<ExecutionRecord> = store.load()?;

    let sandbox = PythonSandbox::new(python, timeout);
    let executed = run_batch(&sandbox, &items, opts).await?;
    let summary = BatchSummary::of(&executed);
    let added = executed.len();
    records.extend(executed);

    store.write(&records)?;
    printer::stage_done("run", added, records.len(), output);
    printer::batch_summary(summary);
    Ok(())
}
