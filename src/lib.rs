//! Bazarr Translate - Missing Subtitle Backfill Workflow
//!
//! Walks Bazarr's wanted episodes and movies, downloads an English subtitle
//! from the configured providers when none exists, and asks Bazarr to
//! machine-translate it into the target language.

pub mod cli;
pub mod config;
pub mod bazarr;
pub mod selector;
pub mod pipeline;
pub mod workflow;
pub mod error;
