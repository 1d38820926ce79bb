//! Run configuration.
//!
//! Two layers live here:
//! - [`FileConfig`]: optional defaults read from a TOML file (never written back)
//! - [`CleanOptions`]: raw command-line values, merged with the file defaults and
//!   resolved once into the immutable [`CleanConfig`] handed to the cleaner
//!
//! # Configuration File Format
//!
//! ```toml
//! [clean]
//! unwanted_extensions = ["txt"]
//! exclusive = [".en.srt", ".nfo"]
//! trash = ".trash"
//! libraries = ["/media/movies"]
//! ```

use crate::matcher::normalize_extension;
use crate::output::OutputFormatter;
use crate::remover::TrashLocation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the defaults file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".subsweeprc.toml";

/// Errors that can occur while loading or resolving configuration.
///
/// All of them are fatal: they stop the run before any directory is touched.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
    /// The absolute trash path exists and is not a directory.
    TrashNotDirectory(PathBuf),
    /// The parent of the absolute trash path does not exist.
    TrashParentMissing(PathBuf),
    /// Creating the absolute trash directory failed for another reason.
    TrashCreateFailed { path: PathBuf, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::TrashNotDirectory(path) => write!(
                f,
                "Unable to create trash directory - File exists: {}",
                path.display()
            ),
            ConfigError::TrashParentMissing(path) => write!(
                f,
                "Unable to create trash directory - Directory doesn't exist: {}",
                path.display()
            ),
            ConfigError::TrashCreateFailed { path, reason } => write!(
                f,
                "Unable to create trash directory {}: {}",
                path.display(),
                reason
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Defaults loaded from a TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub clean: CleanDefaults,
}

/// The `[clean]` table of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanDefaults {
    /// Extra extensions to clean unless they belong to a video.
    #[serde(default)]
    pub unwanted_extensions: Vec<String>,

    /// Companion extensions to keep; empty keeps every matching companion.
    #[serde(default)]
    pub exclusive: Vec<String>,

    /// Trash destination used instead of permanent deletion.
    #[serde(default)]
    pub trash: Option<PathBuf>,

    /// Libraries whose subdirectories are always cleaned.
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
}

impl FileConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.subsweeprc.toml` in `cwd`
    /// 3. Look for `~/.config/subsweep/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(&absolutize(path, cwd));
        }

        let local_config = cwd.join(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("subsweep")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Raw, unresolved options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub directories: Vec<PathBuf>,
    pub libraries: Vec<PathBuf>,
    pub exclusive: Vec<String>,
    pub unwanted_extensions: Vec<String>,
    pub trash: Option<PathBuf>,
    pub dry_run: bool,
}

impl CleanOptions {
    /// Folds file defaults underneath the command-line values.
    ///
    /// File lists come first; a command-line trash overrides the file's.
    pub fn with_defaults(self, defaults: CleanDefaults) -> Self {
        let mut merged = self;
        merged.libraries = concat(defaults.libraries, merged.libraries);
        merged.exclusive = concat(defaults.exclusive, merged.exclusive);
        merged.unwanted_extensions =
            concat(defaults.unwanted_extensions, merged.unwanted_extensions);
        merged.trash = merged.trash.or(defaults.trash);
        merged
    }

    /// Resolves the options into the configuration used for the run.
    ///
    /// Relative directories and libraries are made absolute against `cwd`.
    /// Libraries expand to their immediate subdirectories, sorted by name;
    /// a library that is not a directory is reported and skipped. With no
    /// directories and no libraries, `cwd` itself is cleaned. An absolute
    /// trash directory is created here, once; a dry run only checks that it
    /// could be.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the absolute trash directory cannot be
    /// created.
    pub fn resolve(self, cwd: &Path, out: &OutputFormatter) -> Result<CleanConfig, ConfigError> {
        let no_targets = self.directories.is_empty() && self.libraries.is_empty();

        let mut directories: Vec<PathBuf> = self
            .directories
            .iter()
            .map(|dir| absolutize(dir, cwd))
            .collect();

        for library in &self.libraries {
            let library = absolutize(library, cwd);
            match library_subdirectories(&library) {
                Ok(subdirs) => directories.extend(subdirs),
                Err(e) => out.warning(&format!(
                    "Library {} is not a usable directory ({}). Skipping.",
                    library.display(),
                    e
                )),
            }
        }

        if no_targets {
            directories.push(cwd.to_path_buf());
        }

        let trash = self.trash.map(TrashLocation::new);
        if let Some(TrashLocation::Shared(path)) = &trash {
            if self.dry_run {
                check_shared_trash(path)?;
            } else {
                prepare_shared_trash(path)?;
            }
        }

        Ok(CleanConfig {
            directories,
            unwanted_extensions: normalize_all(&self.unwanted_extensions),
            allowed_companions: normalize_all(&self.exclusive),
            trash,
            dry_run: self.dry_run,
        })
    }
}

/// Fully resolved configuration for one run. Not modified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanConfig {
    /// Absolute directories to clean, in processing order.
    pub directories: Vec<PathBuf>,
    /// Normalized extra cleaning extensions.
    pub unwanted_extensions: Vec<String>,
    /// Normalized keep list; empty keeps every matching companion.
    pub allowed_companions: Vec<String>,
    pub trash: Option<TrashLocation>,
    pub dry_run: bool,
}

impl CleanConfig {
    /// A configuration cleaning the given directories with default rules.
    pub fn for_directories(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            unwanted_extensions: Vec::new(),
            allowed_companions: Vec::new(),
            trash: None,
            dry_run: false,
        }
    }
}

fn concat<T>(mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
    first.extend(second);
    first
}

fn normalize_all(extensions: &[String]) -> Vec<String> {
    extensions.iter().map(|ext| normalize_extension(ext)).collect()
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Lists the immediate subdirectories of a library, sorted by path.
fn library_subdirectories(library: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut subdirs: Vec<PathBuf> = fs::read_dir(library)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();
    Ok(subdirs)
}

/// Fails the same way [`prepare_shared_trash`] would, without creating anything.
fn check_shared_trash(path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.symlink_metadata().is_ok() {
        return Err(ConfigError::TrashNotDirectory(path.to_path_buf()));
    }
    match path.parent() {
        Some(parent) if !parent.is_dir() => {
            Err(ConfigError::TrashParentMissing(parent.to_path_buf()))
        }
        _ => Ok(()),
    }
}

/// Creates the shared trash directory if it does not exist yet.
fn prepare_shared_trash(path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Ok(());
    }

    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(ConfigError::TrashNotDirectory(path.to_path_buf()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ConfigError::TrashParentMissing(
            path.parent().unwrap_or(path).to_path_buf(),
        )),
        Err(e) => Err(ConfigError::TrashCreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = FileConfig::parse(
            r#"
            [clean]
            unwanted_extensions = ["txt"]
            exclusive = [".en.srt", "nfo"]
            trash = ".trash"
            libraries = ["/media/movies"]
            "#,
        )
        .unwrap();

        assert_eq!(config.clean.unwanted_extensions, vec!["txt"]);
        assert_eq!(config.clean.exclusive, vec![".en.srt", "nfo"]);
        assert_eq!(config.clean.trash, Some(PathBuf::from(".trash")));
        assert_eq!(config.clean.libraries, vec![PathBuf::from("/media/movies")]);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = FileConfig::parse("[clean]\nexclusive = 3");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = FileConfig::load(
            Some(Path::new("/non/existent/subsweep.toml")),
            Path::new("/"),
        );
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_local_config_from_given_cwd() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            temp_dir.path().join(LOCAL_CONFIG_FILE),
            "[clean]\nexclusive = [\"nfo\"]\n",
        )
        .unwrap();

        let config = FileConfig::load(None, temp_dir.path()).unwrap();
        assert_eq!(config.clean.exclusive, vec!["nfo"]);
    }

    #[test]
    fn test_load_relative_config_path_from_given_cwd() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("rc.toml"), "[clean]\ntrash = \"bin\"\n").unwrap();

        let config = FileConfig::load(Some(Path::new("rc.toml")), temp_dir.path()).unwrap();
        assert_eq!(config.clean.trash, Some(PathBuf::from("bin")));
    }

    #[test]
    fn test_command_line_values_follow_file_defaults() {
        let options = CleanOptions {
            exclusive: vec![".nfo".to_string()],
            trash: Some(PathBuf::from("cli-trash")),
            ..Default::default()
        };
        let defaults = CleanDefaults {
            exclusive: vec![".en.srt".to_string()],
            unwanted_extensions: vec!["txt".to_string()],
            trash: Some(PathBuf::from("file-trash")),
            libraries: Vec::new(),
        };

        let merged = options.with_defaults(defaults);

        assert_eq!(merged.exclusive, vec![".en.srt", ".nfo"]);
        assert_eq!(merged.unwanted_extensions, vec!["txt"]);
        assert_eq!(merged.trash, Some(PathBuf::from("cli-trash")));
    }

    #[test]
    fn test_resolve_normalizes_extensions() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = CleanOptions {
            directories: vec![PathBuf::from("Movies")],
            exclusive: vec!["en.srt".to_string(), ".nfo".to_string()],
            unwanted_extensions: vec!["txt".to_string()],
            ..Default::default()
        };

        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();

        assert_eq!(config.directories, vec![temp_dir.path().join("Movies")]);
        assert_eq!(config.allowed_companions, vec![".en.srt", ".nfo"]);
        assert_eq!(config.unwanted_extensions, vec![".txt"]);
        assert_eq!(config.trash, None);
    }

    #[test]
    fn test_resolve_defaults_to_cwd() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = CleanOptions::default()
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();
        assert_eq!(config.directories, vec![temp_dir.path().to_path_buf()]);
    }

    #[test]
    fn test_resolve_expands_library() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("library");
        fs::create_dir(&library).unwrap();
        fs::create_dir(library.join("B Movie")).unwrap();
        fs::create_dir(library.join("A Movie")).unwrap();
        fs::write(library.join("index.nfo"), "").unwrap();

        let options = CleanOptions {
            libraries: vec![PathBuf::from("library")],
            ..Default::default()
        };
        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();

        assert_eq!(
            config.directories,
            vec![library.join("A Movie"), library.join("B Movie")]
        );
    }

    #[test]
    fn test_resolve_missing_library_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = CleanOptions {
            libraries: vec![PathBuf::from("nowhere")],
            ..Default::default()
        };
        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();
        assert!(config.directories.is_empty());
    }

    #[test]
    fn test_resolve_creates_absolute_trash() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let trash = temp_dir.path().join("trash");
        let options = CleanOptions {
            trash: Some(trash.clone()),
            ..Default::default()
        };

        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();

        assert!(trash.is_dir());
        assert_eq!(config.trash, Some(TrashLocation::Shared(trash)));
    }

    #[test]
    fn test_resolve_dry_run_leaves_absolute_trash_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let trash = temp_dir.path().join("trash");
        let options = CleanOptions {
            trash: Some(trash.clone()),
            dry_run: true,
            ..Default::default()
        };

        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();

        assert!(!trash.exists());
        assert_eq!(config.trash, Some(TrashLocation::Shared(trash)));
    }

    #[test]
    fn test_resolve_relative_trash_is_not_created() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = CleanOptions {
            trash: Some(PathBuf::from(".trash")),
            ..Default::default()
        };

        let config = options
            .resolve(temp_dir.path(), &OutputFormatter::new())
            .unwrap();

        assert!(!temp_dir.path().join(".trash").exists());
        assert_eq!(
            config.trash,
            Some(TrashLocation::PerDirectory(PathBuf::from(".trash")))
        );
    }

    #[test]
    fn test_resolve_trash_blocked_by_file_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let trash = temp_dir.path().join("trash");
        fs::write(&trash, "occupied").unwrap();
        let options = CleanOptions {
            trash: Some(trash),
            ..Default::default()
        };

        let result = options.resolve(temp_dir.path(), &OutputFormatter::new());
        assert!(matches!(result, Err(ConfigError::TrashNotDirectory(_))));
    }

    #[test]
    fn test_resolve_trash_missing_parent_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = CleanOptions {
            trash: Some(temp_dir.path().join("missing").join("trash")),
            ..Default::default()
        };

        let result = options.resolve(temp_dir.path(), &OutputFormatter::new());
        assert!(matches!(result, Err(ConfigError::TrashParentMissing(_))));
    }
}
