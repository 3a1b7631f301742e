//! Regenerate handler: one vision-model request per figure, code merged into
//! the record.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    config::Config,
    llm::{extract_python_code, regeneration_prompt, ChatMessage, ChatOptions, ContentPart, LlmClient, Role},
    printer,
    record::{FigureRecord, GeneratedRecord},
    store::JsonStore,
};

pub async fn run(
    cfg: &Config,
    input: &Path,
    output: &Path,
    model: &str,
    max_tokens: u32,
    limit: Option<usize>,
) -> Result<()> {
    let client = LlmClient::from_config(cfg)?;
    let figures: Vec<FigureRecord> = JsonStore::new(input)
        .read()
        .with_context(|| format!("reading figure records from {}", input.display()))?;

    let store = JsonStore::new(output);
    let mut records: Vec<GeneratedRecord> = store.load()?;

    let opts = ChatOptions {
        model: model.to_string(),
        max_tokens,
    };

    let pending = pending_figures(figures, &records, limit);

    let mut added = 0;
    for figure in pending {
        let image = match ContentPart::image_file(Path::new(&figure.figure_path)) {
            Ok(part) => part,
            Err(e) => {
                warn!("skipping {}: {}", figure.figure_path, e);
                continue;
            }
        };
        let message = ChatMessage::multimodal(
            Role::User,
            vec![ContentPart::text(regeneration_prompt(&figure.caption)), image],
        );

        info!("requesting code for {} ({})", figure.figure_path, figure.collection_id);
        let reply = client
            .complete(vec![message], &opts)
            .await
            .with_context(|| format!("model request failed for {}", figure.figure_path))?;

        let llava_code = extract_python_code(&reply);
        if llava_code.is_empty() {
            warn!("no python block in reply for {}", figure.figure_path);
        }
        records.push(GeneratedRecord { figure, llava_code });
        added += 1;
    }

    store.write(&records)?;
    printer::stage_done("regenerate", added, records.len(), output);
    Ok(())
}

/// Figures still lacking generated code, at most `limit` of them.
///
/// Matching is on the whole record and counts occurrences, so two inputs
/// sharing a `figure_path` are resumed independently.
pub fn pending_figures(
    figures: Vec<FigureRecord>,
    done: &[GeneratedRecord],
    limit: Option<usize>,
) -> Vec<FigureRecord> {
    let mut seen: HashMap<&FigureRecord, usize> = HashMap::new();
    for record in done {
        *seen.entry(&record.figure).or_default() += 1;
    }

    figures
        .into_iter()
        .filter(|f| match seen.get_mut(f) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure(path: &str, caption: &str) -> FigureRecord {
        FigureRecord {
            figure_path: path.into(),
            caption: caption.into(),
            source: "neurips/2401.00001/main.tex".into(),
            collection_id: "2401.00001".into(),
        }
    }

    fn generated(figure: FigureRecord) -> GeneratedRecord {
        GeneratedRecord {
            figure,
            llava_code: "pass".into(),
        }
    }

    #[test]
    fn shared_figure_path_is_resumed_across_limited_runs() {
        let inputs = vec![figure("figs/plot.png", "x"), figure("figs/plot.png", "y")];

        let first = pending_figures(inputs.clone(), &[], Some(1));
        assert_eq!(first, vec![figure("figs/plot.png", "x")]);

        let done: Vec<_> = first.into_iter().map(generated).collect();
        let second = pending_figures(inputs, &done, Some(1));
        assert_eq!(second, vec![figure("figs/plot.png", "y")]);
    }

    #[test]
    fn identical_duplicates_are_counted() {
        let inputs = vec![figure("a.png", "same"), figure("a.png", "same"), figure("b.png", "other")];
        let done = vec![generated(figure("a.png", "same"))];

        let pending = pending_figures(inputs, &done, None);
        assert_eq!(pending, vec![figure("a.png", "same"), figure("b.png", "other")]);
    }

    #[test]
    fn completed_input_has_nothing_pending() {
        let inputs = vec![figure("a.png", "x")];
        let done = vec![generated(figure("a.png", "x"))];
        assert!(pending_figures(inputs, &done, None).is_empty());
    }
}
