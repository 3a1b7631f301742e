//! Interpreter processes for generated snippets.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::record::{ExecutionFailure, FailureKind};

pub mod python;

/// How a single snippet run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Runnable,
    Raised(String),
    TimedOut(Duration),
    Spawn(String),
}

impl Outcome {
    pub fn is_runnable(&self) -> bool {
        matches!(self, Outcome::Runnable)
    }

    pub fn into_failure(self) -> Option<ExecutionFailure> {
        let (kind, message) = match self {
            Outcome::Runnable => return None,
            Outcome::Raised(msg) => (FailureKind::Raised, msg),
            Outcome::TimedOut(d) => (FailureKind::TimedOut, format!("timed out after {}s", d.as_secs())),
            Outcome::Spawn(msg) => (FailureKind::Spawn, msg),
        };
        Some(ExecutionFailure { kind, message })
    }
}

/// Runs one snippet to completion. Implementations must not share state
/// between calls.
pub trait CodeRunner: Send + Sync {
    fn run<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Outcome>;
}
