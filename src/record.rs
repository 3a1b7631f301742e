//! Record types shared by the pipeline stages.

use serde::{Deserialize, Serialize};

/// One accepted figure, as emitted by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FigureRecord {
    pub figure_path: String,
    pub caption: String,
    pub source: String,
    #[serde(alias = "arxiv_id")]
    pub collection_id: String,
}

/// A figure record merged with the plotting code the model produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRecord {
    #[serde(flatten)]
    pub figure: FigureRecord,
    #[serde(default)]
    pub llava_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The interpreter exited with an error.
    Raised,
    TimedOut,
    /// The interpreter could not be started at all.
    Spawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of running one generated snippet.
///
/// `runnable` only means the snippet did not fail; nothing checks that an
/// image was actually written to `output_figure_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(flatten)]
    pub generated: GeneratedRecord,
    pub output_figure_path: String,
    pub runnable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionRecord {
    pub fn collection_id(&self) -> &str {
        &self.generated.figure.collection_id
    }
}
