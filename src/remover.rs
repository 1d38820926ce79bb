/// Removal of doomed companion files.
///
/// Files are either deleted outright or moved into a trash directory. A
/// relative trash path is resolved against the directory holding each file,
/// so every cleaned directory gets its own trash folder; an absolute trash
/// path is shared by all directories and is created once during setup.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Upper bound on `_copyN` suffixes tried before giving up on a trash move.
pub const MAX_TRASH_COPIES: u32 = 10_000;

/// Where removed files go instead of being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrashLocation {
    /// A single trash directory shared by every cleaned directory.
    Shared(PathBuf),
    /// A trash directory relative to each file's parent directory.
    PerDirectory(PathBuf),
}

impl TrashLocation {
    /// Chooses the trash kind from the shape of the path.
    pub fn new(path: PathBuf) -> Self {
        if path.is_absolute() {
            Self::Shared(path)
        } else {
            Self::PerDirectory(path)
        }
    }

    /// Returns the trash directory that receives `file`.
    pub fn directory_for(&self, file: &Path) -> PathBuf {
        match self {
            Self::Shared(path) => path.clone(),
            Self::PerDirectory(relative) => file
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(relative),
        }
    }
}

/// What happened to a file handed to [`Remover::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The file was deleted, or was already gone.
    Removed,
    /// The file was moved into the trash.
    Trashed {
        /// Final path of the file inside the trash directory.
        destination: PathBuf,
    },
    /// The per-directory trash could not be prepared; the file was left alone.
    Skipped(SkipReason),
}

/// Why a per-directory trash could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Something other than a directory occupies the trash path.
    TrashNotDirectory(PathBuf),
    /// A parent component of the trash path does not exist.
    TrashParentMissing(PathBuf),
    /// Creating the trash directory failed for another reason.
    TrashUnavailable { path: PathBuf, reason: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrashNotDirectory(path) => write!(
                f,
                "Unable to create trash directory - File exists: {}",
                path.display()
            ),
            Self::TrashParentMissing(path) => write!(
                f,
                "Unable to create trash directory - Directory doesn't exist: {}",
                path.display()
            ),
            Self::TrashUnavailable { path, reason } => write!(
                f,
                "Unable to create trash directory {}: {}",
                path.display(),
                reason
            ),
        }
    }
}

/// Errors that abort the removal of a single file.
#[derive(Debug)]
pub enum RemoveError {
    /// The file has no final name component.
    NoFileName(PathBuf),
    /// Deleting the file failed.
    DeleteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Moving the file into the trash failed.
    TrashMoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Every `_copyN` name up to the limit is already taken.
    CollisionLimit { trash_dir: PathBuf, attempts: u32 },
}

impl std::fmt::Display for RemoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFileName(path) => write!(f, "{} has no file name", path.display()),
            Self::DeleteFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::TrashMoveFailed {
                source,
                destination,
                source_error,
            } => write!(
                f,
                "Failed to move {} to {}: {}",
                source.display(),
                destination.display(),
                source_error
            ),
            Self::CollisionLimit {
                trash_dir,
                attempts,
            } => write!(
                f,
                "No free name in trash {} after {} attempts",
                trash_dir.display(),
                attempts
            ),
        }
    }
}

impl std::error::Error for RemoveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeleteFailed { source, .. } => Some(source),
            Self::TrashMoveFailed { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for removal operations.
pub type RemoveResult<T> = Result<T, RemoveError>;

/// Deletes files or moves them into a trash directory.
pub struct Remover;

impl Remover {
    /// Removes a file, honoring the optional trash location.
    ///
    /// Without a trash location the file is deleted; a file that is already
    /// gone counts as removed. With a per-directory trash, the trash folder is
    /// created next to the file when missing; if that fails the file is
    /// skipped rather than deleted.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subsweep::remover::{Remover, TrashLocation};
    /// use std::path::{Path, PathBuf};
    ///
    /// let trash = TrashLocation::new(PathBuf::from(".trash"));
    /// match Remover::remove(Path::new("/media/Movie/Orphan.srt"), Some(&trash)) {
    ///     Ok(outcome) => println!("{:?}", outcome),
    ///     Err(e) => eprintln!("Removal failed: {}", e),
    /// }
    /// ```
    pub fn remove(file: &Path, trash: Option<&TrashLocation>) -> RemoveResult<RemoveOutcome> {
        match trash {
            None => Self::delete_permanently(file),
            Some(location) => {
                let trash_dir = location.directory_for(file);
                if let TrashLocation::PerDirectory(_) = location
                    && let Err(reason) = Self::ensure_trash_dir(&trash_dir)
                {
                    return Ok(RemoveOutcome::Skipped(reason));
                }
                Self::move_to_trash(file, &trash_dir)
            }
        }
    }

    fn delete_permanently(file: &Path) -> RemoveResult<RemoveOutcome> {
        match fs::remove_file(file) {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RemoveOutcome::Removed),
            Err(e) => Err(RemoveError::DeleteFailed {
                path: file.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Creates a per-directory trash folder if it is not already there.
    ///
    /// Only the last component is created; missing parents are reported.
    fn ensure_trash_dir(trash_dir: &Path) -> Result<(), SkipReason> {
        if trash_dir.is_dir() {
            return Ok(());
        }
        if trash_dir.symlink_metadata().is_ok() {
            return Err(SkipReason::TrashNotDirectory(trash_dir.to_path_buf()));
        }

        match fs::create_dir(trash_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && trash_dir.is_dir() => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(SkipReason::TrashNotDirectory(trash_dir.to_path_buf()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SkipReason::TrashParentMissing(
                trash_dir
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| trash_dir.to_path_buf()),
            )),
            Err(e) => Err(SkipReason::TrashUnavailable {
                path: trash_dir.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    fn move_to_trash(file: &Path, trash_dir: &Path) -> RemoveResult<RemoveOutcome> {
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RemoveError::NoFileName(file.to_path_buf()))?;

        let destination = Self::free_trash_path(trash_dir, file_name)?;

        match fs::rename(file, &destination) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                // Shared trash on another filesystem.
                copy_then_remove(file, &destination, |path| fs::remove_file(path))?;
            }
            Err(e) => {
                return Err(RemoveError::TrashMoveFailed {
                    source: file.to_path_buf(),
                    destination,
                    source_error: e,
                });
            }
        }

        Ok(RemoveOutcome::Trashed { destination })
    }

    /// Finds an unused name for `file_name` inside `trash_dir`.
    ///
    /// Tries the plain name first, then `<name>_copy1`, `<name>_copy2`, ...
    /// up to [`MAX_TRASH_COPIES`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subsweep::remover::Remover;
    /// use std::path::Path;
    ///
    /// let path = Remover::free_trash_path(Path::new("/media/.trash"), "Movie.srt").unwrap();
    /// println!("Would move to {}", path.display());
    /// ```
    pub fn free_trash_path(trash_dir: &Path, file_name: &str) -> RemoveResult<PathBuf> {
        Self::free_trash_path_within(trash_dir, file_name, MAX_TRASH_COPIES)
    }

    pub(crate) fn free_trash_path_within(
        trash_dir: &Path,
        file_name: &str,
        max_copies: u32,
    ) -> RemoveResult<PathBuf> {
        let candidate = trash_dir.join(file_name);
        if !is_occupied(&candidate) {
            return Ok(candidate);
        }

        for copies in 1..=max_copies {
            let candidate = trash_dir.join(format!("{}_copy{}", file_name, copies));
            if !is_occupied(&candidate) {
                return Ok(candidate);
            }
        }

        Err(RemoveError::CollisionLimit {
            trash_dir: trash_dir.to_path_buf(),
            attempts: max_copies,
        })
    }
}

/// Copies `file` to `destination`, then removes the original with `remove`.
///
/// If the original cannot be removed the copy is deleted again, so the file
/// never ends up in both places.
fn copy_then_remove<F>(file: &Path, destination: &Path, remove: F) -> RemoveResult<()>
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    let failed = |e: std::io::Error| RemoveError::TrashMoveFailed {
        source: file.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    fs::copy(file, destination).map_err(failed)?;
    if let Err(e) = remove(file) {
        let _ = fs::remove_file(destination);
        return Err(failed(e));
    }
    Ok(())
}

fn is_occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
