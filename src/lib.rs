//! Figure/caption dataset building and validation of model-regenerated plots.

pub mod archive;
pub mod config;
pub mod error;
pub mod execution;
pub mod external;
pub mod extract;
pub mod handlers;
pub mod llm;
pub mod printer;
pub mod process;
pub mod record;
pub mod store;
pub mod transform;
