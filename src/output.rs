//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, a directory progress bar for multi-directory runs, and the closing
//! summary table. Lines are routed through the progress bar when one is
//! active so they never tear it.

use crate::cleaner::CleanSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A progress bar over the directories being cleaned
/// - The summary table printed at the end of a run
#[derive(Default)]
pub struct OutputFormatter {
    progress: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Creates a formatter that prints plain lines without a progress bar.
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Creates a formatter with a progress bar over `total` directories.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use subsweep::output::OutputFormatter;
    /// let out = OutputFormatter::with_progress(12);
    /// out.info("Working on: /media/movies/Alien");
    /// out.finish();
    /// ```
    pub fn with_progress(total: u64) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        Self { progress: Some(pb) }
    }

    fn emit(&self, line: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }

    fn emit_err(&self, line: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Prints a success message in green with a checkmark.
    pub fn success(&self, message: &str) {
        self.emit(format!("\t{} {}", "✓".green(), message));
    }

    /// Prints an error message in red with an X mark.
    pub fn error(&self, message: &str) {
        self.emit_err(format!("\t{} {}", "✗".red(), message));
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(&self, message: &str) {
        self.emit(format!("\t{} {}", "⚠".yellow(), message));
    }

    /// Prints an info message in cyan.
    pub fn info(&self, message: &str) {
        self.emit(message.cyan().to_string());
    }

    /// Prints an indented message without styling.
    pub fn plain(&self, message: &str) {
        self.emit(format!("\t{}", message));
    }

    /// Prints a section header.
    pub fn header(&self, header: &str) {
        self.emit(format!("\n{}", header.bold()));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(&self, message: &str) {
        self.emit(format!("\t{}", format!("[DRY RUN] {}", message).yellow()));
    }

    /// Advances the progress bar past a finished directory.
    pub fn advance(&self, directory: &Path) {
        if let Some(pb) = &self.progress {
            let name = directory
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            pb.set_message(name);
            pb.inc(1);
        }
    }

    /// Clears the progress bar, if any.
    pub fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }

    /// Prints the end-of-run summary table.
    ///
    /// Rows with a zero count are left out, except the cleaned-directory row.
    pub fn summary_table(&self, summary: &CleanSummary) {
        self.header("SUMMARY");

        let rows = [
            ("Directories cleaned", summary.directories_cleaned),
            ("Without video", summary.directories_without_video),
            ("Directories skipped", summary.directories_skipped),
            ("Files removed", summary.files_removed),
            ("Files trashed", summary.files_trashed),
            ("Would remove", summary.files_would_remove),
            ("Files skipped", summary.files_skipped),
            ("Files failed", summary.files_failed),
        ];

        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        self.emit(format!(
            "{:<width$} | {}",
            "Item".bold(),
            "Count".bold(),
            width = width
        ));
        self.emit("-".repeat(width + 10));

        for (label, count) in rows {
            if count == 0 && label != "Directories cleaned" {
                continue;
            }
            let count = if label == "Files failed" {
                count.to_string().red()
            } else {
                count.to_string().green()
            };
            self.emit(format!("{:<width$} | {}", label, count, width = width));
        }

        self.emit("-".repeat(width + 10));
        self.emit(format!(
            "{:<width$} | {}",
            "Total directories".bold(),
            summary.total_directories().to_string().green().bold(),
            width = width
        ));
    }
}
