//! critfix: batch source rewriting with write-once backups.
//!
//! A [`engine::BatchRunner`] discovers source files in a directory and hands
//! each to a [`engine::FileProcessor`], which backs the file up, runs the
//! enabled [`rules::Rule`]s over its content and writes it back only when
//! something changed. Counts are aggregated into [`engine::Statistics`].

pub mod config;
pub mod core;
pub mod engine;
pub mod rules;

pub use config::Config;
pub use crate::core::{CritFixError, Result};
