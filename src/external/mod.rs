//! Remote document sources.

pub mod arxiv;
