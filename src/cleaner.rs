/// Per-directory cleaning.
///
/// Ties the matcher and the remover together: each directory is listed once,
/// classified, and every doomed file is removed, trashed or, in a dry run,
/// only reported.
use crate::config::CleanConfig;
use crate::matcher::{Classification, CompanionMatcher};
use crate::output::OutputFormatter;
use crate::remover::{RemoveOutcome, Remover, SkipReason};
use std::fs;
use std::path::{Path, PathBuf};

/// What was done, or would be done, with one doomed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// The file was deleted permanently.
    Removed { name: String },
    /// The file was moved into the trash.
    Trashed { name: String, destination: PathBuf },
    /// Dry run: the file would have been removed or trashed.
    WouldRemove { name: String, to_trash: bool },
    /// The trash could not be prepared, so the file was left in place.
    Skipped { name: String, reason: SkipReason },
    /// Removing the file failed.
    Failed { name: String, error: String },
}

impl FileAction {
    /// Name of the file this action applies to.
    pub fn name(&self) -> &str {
        match self {
            Self::Removed { name }
            | Self::Trashed { name, .. }
            | Self::WouldRemove { name, .. }
            | Self::Skipped { name, .. }
            | Self::Failed { name, .. } => name,
        }
    }
}

/// How a directory was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryStatus {
    /// The directory was classified and its doomed files handled.
    Cleaned,
    /// No video file was found, so nothing was touched.
    NoVideo,
    /// The path does not exist or is not a directory.
    Missing,
    /// The directory listing could not be read.
    Unreadable(String),
}

/// Outcome of cleaning one directory.
#[derive(Debug, Clone)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub status: DirectoryStatus,
    /// One entry per doomed file, in name order.
    pub actions: Vec<FileAction>,
}

impl DirectoryReport {
    fn new(directory: &Path, status: DirectoryStatus) -> Self {
        Self {
            directory: directory.to_path_buf(),
            status,
            actions: Vec::new(),
        }
    }
}

/// Counters accumulated over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub directories_cleaned: usize,
    pub directories_without_video: usize,
    pub directories_skipped: usize,
    pub files_removed: usize,
    pub files_trashed: usize,
    pub files_would_remove: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

impl CleanSummary {
    /// Folds one directory report into the counters.
    pub fn record(&mut self, report: &DirectoryReport) {
        match report.status {
            DirectoryStatus::Cleaned => self.directories_cleaned += 1,
            DirectoryStatus::NoVideo => self.directories_without_video += 1,
            DirectoryStatus::Missing | DirectoryStatus::Unreadable(_) => {
                self.directories_skipped += 1
            }
        }

        for action in &report.actions {
            match action {
                FileAction::Removed { .. } => self.files_removed += 1,
                FileAction::Trashed { .. } => self.files_trashed += 1,
                FileAction::WouldRemove { .. } => self.files_would_remove += 1,
                FileAction::Skipped { .. } => self.files_skipped += 1,
                FileAction::Failed { .. } => self.files_failed += 1,
            }
        }
    }

    /// Number of directories visited, whatever their outcome.
    pub fn total_directories(&self) -> usize {
        self.directories_cleaned + self.directories_without_video + self.directories_skipped
    }

    /// Returns true if any file could not be removed.
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

/// Cleans directories according to a resolved configuration.
#[derive(Debug)]
pub struct Cleaner<'a> {
    config: &'a CleanConfig,
    matcher: CompanionMatcher,
}

impl<'a> Cleaner<'a> {
    /// Creates a cleaner; the matcher is built once for the whole run.
    pub fn new(config: &'a CleanConfig) -> Self {
        let matcher =
            CompanionMatcher::new(&config.unwanted_extensions, &config.allowed_companions);
        Self { config, matcher }
    }

    /// Cleans every configured directory in order.
    ///
    /// Directory-level problems are reported and skipped; they never stop the run.
    pub fn run(&self, out: &OutputFormatter) -> CleanSummary {
        let mut summary = CleanSummary::default();
        for directory in &self.config.directories {
            let report = self.clean_directory(directory, out);
            summary.record(&report);
            out.advance(directory);
        }
        summary
    }

    /// Cleans a single directory.
    ///
    /// This function:
    /// 1. Checks that the path is a directory
    /// 2. Lists its files, symlinks included, once
    /// 3. Classifies the listing against the video stems
    /// 4. Removes, trashes or reports each doomed file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subsweep::cleaner::Cleaner;
    /// use subsweep::config::CleanConfig;
    /// use subsweep::output::OutputFormatter;
    /// use std::path::{Path, PathBuf};
    ///
    /// let config = CleanConfig::for_directories(vec![PathBuf::from("/media/movies/Alien")]);
    /// let report = Cleaner::new(&config)
    ///     .clean_directory(Path::new("/media/movies/Alien"), &OutputFormatter::new());
    /// println!("{:?}: {} files", report.status, report.actions.len());
    /// ```
    pub fn clean_directory(&self, directory: &Path, out: &OutputFormatter) -> DirectoryReport {
        if !directory.is_dir() {
            out.warning(&format!(
                "Unable to find directory: {}. Skipping",
                directory.display()
            ));
            return DirectoryReport::new(directory, DirectoryStatus::Missing);
        }

        out.info(&format!("Working on: {}", directory.display()));

        let listing = match list_file_names(directory) {
            Ok(listing) => listing,
            Err(e) => {
                out.error(&format!(
                    "Error reading directory {}: {}",
                    directory.display(),
                    e
                ));
                return DirectoryReport::new(directory, DirectoryStatus::Unreadable(e.to_string()));
            }
        };

        let classification = self.matcher.classify(listing.as_slice());
        if classification == Classification::NoVideo {
            out.plain("No video file found, skipping directory.");
            return DirectoryReport::new(directory, DirectoryStatus::NoVideo);
        }

        let mut report = DirectoryReport::new(directory, DirectoryStatus::Cleaned);
        for name in classification.doomed() {
            let action = self.handle_file(directory, name, out);
            report.actions.push(action);
        }
        report
    }

    fn handle_file(&self, directory: &Path, name: &str, out: &OutputFormatter) -> FileAction {
        let name = name.to_string();
        let to_trash = self.config.trash.is_some();

        if self.config.dry_run {
            let verb = if to_trash {
                "Would move to trash"
            } else {
                "Would remove"
            };
            out.dry_run_notice(&format!("{}: \"{}\"", verb, name));
            return FileAction::WouldRemove { name, to_trash };
        }

        let path = directory.join(&name);
        match Remover::remove(&path, self.config.trash.as_ref()) {
            Ok(RemoveOutcome::Removed) => {
                out.success(&format!("Removed file: \"{}\"", name));
                FileAction::Removed { name }
            }
            Ok(RemoveOutcome::Trashed { destination }) => {
                out.success(&format!(
                    "Moved file to trash: \"{}\" -> {}",
                    name,
                    destination.display()
                ));
                FileAction::Trashed { name, destination }
            }
            Ok(RemoveOutcome::Skipped(reason)) => {
                out.warning(&format!("{}. Skipping \"{}\"", reason, name));
                FileAction::Skipped { name, reason }
            }
            Err(e) => {
                out.error(&e.to_string());
                FileAction::Failed {
                    name,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Lists the names of the non-directory entries in a directory.
///
/// Symlinks are listed by their own name unless they point at a directory.
/// Subdirectories, including a per-directory trash folder, are left out, as
/// are names that are not valid UTF-8.
pub fn list_file_names(directory: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory)?.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let is_dir = if file_type.is_symlink() {
            fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir())
        } else {
            file_type.is_dir()
        };
        if !is_dir && let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}
