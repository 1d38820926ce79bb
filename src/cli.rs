//! Command-line interface module for subsweep.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging configuration file defaults
//! - Resolving directories, libraries and the trash location
//! - Running the cleaner and printing the summary

use crate::cleaner::{CleanSummary, Cleaner};
use crate::config::{CleanOptions, FileConfig};
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

/// Remove unmatched subtitles and info companion files.
///
/// Files are removed unless they share their name with a video file in the
/// same directory. Cleaned extensions: .srt, .ass, .ssa, .sub, .idx, .vtt,
/// .info, .nfo, .pgs
#[derive(Debug, Parser)]
#[command(name = "subsweep", version, about, long_about)]
pub struct Cli {
    /// Directories to clean. Defaults to the current working directory
    #[arg(value_name = "DIR")]
    pub directories: Vec<PathBuf>,

    /// Library whose immediate subdirectories are all cleaned
    #[arg(short, long = "library", value_name = "LIB")]
    pub libraries: Vec<PathBuf>,

    /// Keep only these companion extensions for a matching video, e.g. -e .en.srt .nfo
    #[arg(short, long, value_name = "EXT", num_args = 1.., action = ArgAction::Append)]
    pub exclusive: Vec<String>,

    /// Move files into TRASH instead of deleting them. A relative path is taken
    /// relative to each cleaned directory
    #[arg(short, long, value_name = "TRASH")]
    pub trash: Option<PathBuf>,

    /// DANGEROUS: additional extension to remove unless it belongs to a video file
    #[arg(long = "unwanted-extension", value_name = "EXT")]
    pub unwanted_extensions: Vec<String>,

    /// Run without altering any files or directories
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file with default options
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Splits the parsed arguments into cleaning options and the config path.
    pub fn into_options(self) -> (CleanOptions, Option<PathBuf>) {
        let options = CleanOptions {
            directories: self.directories,
            libraries: self.libraries,
            exclusive: self.exclusive,
            unwanted_extensions: self.unwanted_extensions,
            trash: self.trash,
            dry_run: self.dry_run,
        };
        (options, self.config)
    }
}

/// Runs the CLI application with parsed arguments.
///
/// This is the main entry point for CLI operations. Configuration errors are
/// fatal and returned before any directory is touched; problems with single
/// directories or files are reported and the run continues.
///
/// # Arguments
///
/// * `cli` - The parsed command line
/// * `cwd` - The directory relative paths are resolved against
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use subsweep::cli::{run_cli, Cli};
/// use std::path::Path;
///
/// let cli = Cli::parse_from(["subsweep", "--dry-run", "/media/movies/Alien"]);
/// match run_cli(cli, Path::new("/")) {
///     Ok(summary) => println!("Removed {} files", summary.files_removed),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: Cli, cwd: &Path) -> Result<CleanSummary, String> {
    let (options, config_path) = cli.into_options();

    let file_config = FileConfig::load(config_path.as_deref(), cwd)
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    run_with_options(options.with_defaults(file_config.clean), cwd)
}

/// Resolves options and cleans every target directory.
pub fn run_with_options(options: CleanOptions, cwd: &Path) -> Result<CleanSummary, String> {
    let setup = OutputFormatter::new();
    let config = options
        .resolve(cwd, &setup)
        .map_err(|e| format!("{}, exiting", e))?;

    let out = if config.directories.len() > 1 {
        OutputFormatter::with_progress(config.directories.len() as u64)
    } else {
        setup
    };

    if config.dry_run {
        out.dry_run_notice("No files or directories will be altered.");
    }

    let summary = Cleaner::new(&config).run(&out);
    out.finish();
    out.summary_table(&summary);

    if config.dry_run {
        out.info("\nDry run complete. No files were modified.");
    } else if summary.has_failures() {
        out.error("Some files could not be removed. Please review errors above.");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::parse_from([
            "subsweep",
            "-l",
            "/media/movies",
            "--library",
            "/media/shows",
            "-t",
            ".trash",
            "--unwanted-extension",
            "txt",
            "--unwanted-extension",
            ".jpg",
            "-n",
            "dir_a",
            "dir_b",
        ]);

        assert_eq!(
            cli.directories,
            vec![PathBuf::from("dir_a"), PathBuf::from("dir_b")]
        );
        assert_eq!(
            cli.libraries,
            vec![PathBuf::from("/media/movies"), PathBuf::from("/media/shows")]
        );
        assert_eq!(cli.trash, Some(PathBuf::from(".trash")));
        assert_eq!(cli.unwanted_extensions, vec!["txt", ".jpg"]);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_exclusive_takes_several_values_and_repeats() {
        let cli = Cli::parse_from(["subsweep", "-e", ".en.srt", "nfo", "-t", "x", "-e", "idx"]);
        assert_eq!(cli.exclusive, vec![".en.srt", "nfo", "idx"]);
        assert!(cli.directories.is_empty());
    }

    #[test]
    fn test_into_options_keeps_values() {
        let cli = Cli::parse_from(["subsweep", "--config", "rc.toml", "-n", "movies"]);
        let (options, config_path) = cli.into_options();

        assert_eq!(config_path, Some(PathBuf::from("rc.toml")));
        assert_eq!(options.directories, vec![PathBuf::from("movies")]);
        assert!(options.dry_run);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
