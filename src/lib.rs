//! subsweep - media library companion file cleaner
//!
//! This library finds subtitle and info files that no longer belong to any
//! video in their directory and removes them, either permanently or into a
//! trash directory, with a dry-run mode that only reports.

pub mod cleaner;
pub mod cli;
pub mod config;
pub mod matcher;
pub mod output;
pub mod remover;

pub use cleaner::{CleanSummary, Cleaner, DirectoryReport, DirectoryStatus, FileAction};
pub use config::{CleanConfig, CleanOptions, ConfigError, FileConfig};
pub use matcher::{Classification, CompanionMatcher};
pub use remover::{RemoveError, RemoveOutcome, Remover, TrashLocation};

pub use cli::{Cli, run_cli};
