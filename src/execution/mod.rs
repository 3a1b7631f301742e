//! Batch validation of generated plotting code.

use std::path::PathBuf;

use indicatif::ProgressBar;
use tracing::warn;

use crate::{
    error::Result,
    process::CodeRunner,
    record::{ExecutionRecord, GeneratedRecord},
    transform::{output_figure_path, prepare_code},
};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root of the per-collection output tree.
    pub root: PathBuf,
    /// Appended to each output file stem, e.g. `direct`.
    pub suffix: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("llava"),
            suffix: "direct".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub runnable: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(records: &[ExecutionRecord]) -> Self {
        let runnable = records.iter().filter(|r| r.runnable).count();
        Self {
            runnable,
            failed: records.len() - runnable,
        }
    }
}

/// Run every item once, in order. A failing snippet is recorded and logged;
/// only filesystem errors while preparing output paths abort the batch.
pub async fn run_batch<R>(runner: &R, items: &[GeneratedRecord], opts: &BatchOptions) -> Result<Vec<ExecutionRecord>>
where
    R: CodeRunner + ?Sized,
{
    let bar = ProgressBar::new(items.len() as u64);
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let figure = &item.figure;
        let target = output_figure_path(&opts.root, &figure.figure_path, &figure.collection_id, &opts.suffix)?;
        let code = prepare_code(&item.llava_code, &target);

        let outcome = runner.run(&code).await;
        let runnable = outcome.is_runnable();
        let failure = outcome.into_failure();
        if let Some(f) = &failure {
            warn!(
                "An error occurred while executing code for {}: {}",
                figure.collection_id, f.message
            );
        }

        out.push(ExecutionRecord {
            generated: item.clone(),
            output_figure_path: target,
            runnable,
            failure,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        process::Outcome,
        record::{FailureKind, FigureRecord},
    };

    /// Fails any snippet mentioning `1 / 0`, remembers what it was given.
    #[derive(Default)]
    struct ScriptedRunner {
        seen: Mutex<Vec<String>>,
    }

    impl CodeRunner for ScriptedRunner {
        fn run<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Outcome> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(code.to_string());
                if code.contains("1 / 0") {
                    Outcome::Raised("ZeroDivisionError: division by zero".into())
                } else {
                    Outcome::Runnable
                }
            })
        }
    }

    fn item(id: &str, name: &str, code: &str) -> GeneratedRecord {
        GeneratedRecord {
            figure: FigureRecord {
                figure_path: format!("figures/{id}/{name}.png"),
                caption: "c".into(),
                source: format!("sources/{id}/main.tex"),
                collection_id: id.into(),
            },
            llava_code: code.into(),
        }
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let opts = BatchOptions {
            root: root.path().to_path_buf(),
            suffix: "direct".into(),
        };
        let runner = ScriptedRunner::default();
        let items = vec![
            item("a", "one", "x = 1 / 0"),
            item("b", "two", "plt.plot([1])\nplt.savefig('two.png')\nplt.show()"),
        ];

        let records = run_batch(&runner, &items, &opts).await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(!records[0].runnable);
        assert_eq!(records[0].failure.as_ref().unwrap().kind, FailureKind::Raised);
        assert!(records[1].runnable);
        assert!(records[1].failure.is_none());
        assert!(records[1].output_figure_path.ends_with("b/two_direct.png"));
        assert_eq!(BatchSummary::of(&records), BatchSummary { runnable: 1, failed: 1 });

        let seen = runner.seen.lock().unwrap();
        assert!(seen[1].contains(&format!("plt.savefig('{}')", records[1].output_figure_path)));
        assert!(!seen[1].contains("plt.show"));
    }

    #[tokio::test]
    async fn records_keep_input_fields() {
        let root = tempfile::tempdir().unwrap();
        let opts = BatchOptions {
            root: root.path().to_path_buf(),
            ..BatchOptions::default()
        };
        let items = vec![item("c", "three", "pass")];
        let records = run_batch(&ScriptedRunner::default(), &items, &opts).await.unwrap();
        assert_eq!(records[0].generated, items[0]);
        assert_eq!(records[0].collection_id(), "c");
    }
}
