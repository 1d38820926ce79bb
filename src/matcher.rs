//! Companion file classification.
//!
//! Decides which files in a single directory listing are orphaned companions:
//! files carrying a subtitle/info extension whose name does not start with the
//! stem of any video file in the same listing.
//!
//! Extension matching is a literal, case-sensitive suffix comparison on the
//! file name. `.MKV` is not `.mkv`, and overlapping extensions such as `.srt`
//! and `.en.srt` can both match the same name.

use std::collections::BTreeSet;

/// Video container extensions whose stems protect companion files.
pub const VIDEO_EXTENSIONS: [&str; 4] = [".mkv", ".mp4", ".avi", ".wmv"];

/// Built-in companion extensions that are always candidates for cleaning.
pub const COMPANION_EXTENSIONS: [&str; 9] = [
    ".srt", ".ass", ".ssa", ".sub", ".idx", ".vtt", ".info", ".nfo", ".pgs",
];

/// Result of classifying one directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The listing holds no video file; nothing may be touched.
    NoVideo,
    /// Names of the orphaned companion files, in name order.
    Doomed(BTreeSet<String>),
}

impl Classification {
    /// Returns the doomed names, or an empty iterator for [`Classification::NoVideo`].
    pub fn doomed(&self) -> impl Iterator<Item = &str> {
        let names = match self {
            Classification::NoVideo => None,
            Classification::Doomed(names) => Some(names),
        };
        names.into_iter().flatten().map(String::as_str)
    }
}

/// Classifies directory listings against a fixed set of extensions.
///
/// Built once per run from the resolved configuration and reused for every
/// directory.
#[derive(Debug, Clone)]
pub struct CompanionMatcher {
    cleaning_extensions: Vec<String>,
    allowed_extensions: Vec<String>,
}

impl CompanionMatcher {
    /// Creates a matcher from normalized extension lists.
    ///
    /// # Arguments
    ///
    /// * `unwanted_extensions` - Extra extensions that become cleaning candidates
    /// * `allowed_companions` - Extensions that may be kept when they match a video.
    ///   When empty, every cleaning extension may be kept.
    pub fn new(unwanted_extensions: &[String], allowed_companions: &[String]) -> Self {
        let mut cleaning_extensions: Vec<String> = COMPANION_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect();
        for ext in unwanted_extensions {
            if !cleaning_extensions.contains(ext) {
                cleaning_extensions.push(ext.clone());
            }
        }

        // An empty keep list means every matched companion is kept.
        let allowed_extensions = if allowed_companions.is_empty() {
            cleaning_extensions.clone()
        } else {
            allowed_companions.to_vec()
        };

        Self {
            cleaning_extensions,
            allowed_extensions,
        }
    }

    /// Extensions that make a file a cleaning candidate.
    pub fn cleaning_extensions(&self) -> &[String] {
        &self.cleaning_extensions
    }

    /// Extensions that are kept when their file matches a video stem.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Returns true if the name ends with any cleaning extension.
    pub fn is_candidate(&self, file_name: &str) -> bool {
        ends_with_any(file_name, &self.cleaning_extensions)
    }

    /// Classifies a directory listing.
    ///
    /// The listing is only read; the caller enumerates the directory once and
    /// passes the same names to both the stem scan and the candidate scan.
    ///
    /// # Examples
    ///
    /// ```
    /// use subsweep::matcher::{Classification, CompanionMatcher};
    ///
    /// let matcher = CompanionMatcher::new(&[], &[]);
    /// let listing = ["Movie.mkv", "Movie.en.srt", "Orphan.srt", "poster.jpg"];
    ///
    /// let result = matcher.classify(&listing);
    /// assert_eq!(result.doomed().collect::<Vec<_>>(), vec!["Orphan.srt"]);
    /// ```
    pub fn classify<S: AsRef<str>>(&self, listing: &[S]) -> Classification {
        let stems = video_stems(listing);
        if stems.is_empty() {
            return Classification::NoVideo;
        }

        let doomed = listing
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.is_candidate(name))
            .filter(|name| !self.is_spared(name, &stems))
            .map(str::to_string)
            .collect();

        Classification::Doomed(doomed)
    }

    fn is_spared(&self, file_name: &str, stems: &BTreeSet<&str>) -> bool {
        stems.iter().any(|stem| {
            starts_with_stem(file_name, stem) && ends_with_any(file_name, &self.allowed_extensions)
        })
    }
}

/// Collects the stems of every video file in the listing.
///
/// A name ending with several video extensions contributes one stem per match.
pub fn video_stems<S: AsRef<str>>(listing: &[S]) -> BTreeSet<&str> {
    let mut stems = BTreeSet::new();
    for name in listing.iter().map(AsRef::as_ref) {
        for ext in VIDEO_EXTENSIONS {
            if let Some(stem) = name.strip_suffix(ext) {
                stems.insert(stem);
            }
        }
    }
    stems
}

/// Prefixes an extension with `.` when it lacks one.
///
/// # Examples
///
/// ```
/// use subsweep::matcher::normalize_extension;
///
/// assert_eq!(normalize_extension("srt"), ".srt");
/// assert_eq!(normalize_extension(".en.srt"), ".en.srt");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

fn ends_with_any(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

/// True when `file_name` begins with `stem` followed by a dot.
fn starts_with_stem(file_name: &str, stem: &str) -> bool {
    file_name
        .strip_prefix(stem)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doomed(result: &Classification) -> Vec<&str> {
        result.doomed().collect()
    }

    fn exts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_no_video_skips_directory() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["notes.nfo", "show.en.srt"]);
        assert_eq!(result, Classification::NoVideo);
        assert!(doomed(&result).is_empty());
    }

    #[test]
    fn test_non_companion_never_doomed() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["Other.mkv", "poster.jpg", "readme.txt"]);
        assert!(doomed(&result).is_empty());
    }

    #[test]
    fn test_default_keeps_all_matching_companions() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["Movie.mkv", "Movie.en.srt", "Movie.nfo"]);
        assert!(doomed(&result).is_empty());
    }

    #[test]
    fn test_exclusive_narrows_kept_companions() {
        let matcher = CompanionMatcher::new(&[], &exts(&[".nfo"]));
        let result = matcher.classify(&["Movie.mkv", "Movie.en.srt", "Movie.nfo"]);
        assert_eq!(doomed(&result), vec!["Movie.en.srt"]);
    }

    #[test]
    fn test_exclusive_multi_dot_extension() {
        let matcher = CompanionMatcher::new(&[], &exts(&[".en.srt"]));
        let result = matcher.classify(&["Movie.mkv", "Movie.en.srt", "Movie.fr.srt"]);
        assert_eq!(doomed(&result), vec!["Movie.fr.srt"]);
    }

    #[test]
    fn test_orphan_deleted_when_other_video_present() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["Other.mkv", "Orphan.srt"]);
        assert_eq!(doomed(&result), vec!["Orphan.srt"]);
    }

    #[test]
    fn test_unwanted_extension_becomes_candidate() {
        let matcher = CompanionMatcher::new(&exts(&[".txt"]), &[]);
        let result = matcher.classify(&["Movie.mp4", "Movie.txt", "notes.txt"]);
        assert_eq!(doomed(&result), vec!["notes.txt"]);
    }

    #[test]
    fn test_exclusive_does_not_expand_candidates() {
        // .jpg is allowed but never a candidate, so poster.jpg is untouched.
        let matcher = CompanionMatcher::new(&[], &exts(&[".jpg"]));
        let result = matcher.classify(&["Movie.avi", "poster.jpg", "Movie.srt"]);
        assert_eq!(doomed(&result), vec!["Movie.srt"]);
    }

    #[test]
    fn test_video_extension_is_case_sensitive() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["Movie.MKV", "Movie.srt"]);
        assert_eq!(result, Classification::NoVideo);
    }

    #[test]
    fn test_stem_requires_dot_boundary() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let result = matcher.classify(&["Movie.mkv", "Movie2.srt", "Movie.srt"]);
        assert_eq!(doomed(&result), vec!["Movie2.srt"]);
    }

    #[test]
    fn test_any_video_stem_can_spare() {
        let matcher = CompanionMatcher::new(&[], &[]);
        let listing = ["A.mkv", "B.wmv", "A.srt", "B.idx", "B.sub", "C.vtt"];
        let result = matcher.classify(&listing);
        assert_eq!(doomed(&result), vec!["C.vtt"]);
    }

    #[test]
    fn test_video_stems_strip_extension() {
        let stems = video_stems(&["Show S01E01.mkv", "clip.mp4", "cover.png"]);
        assert_eq!(
            stems.into_iter().collect::<Vec<_>>(),
            vec!["Show S01E01", "clip"]
        );
    }

    #[test]
    fn test_matcher_default_allowed_equals_cleaning() {
        let matcher = CompanionMatcher::new(&exts(&[".txt"]), &[]);
        assert_eq!(matcher.allowed_extensions(), matcher.cleaning_extensions());
        assert!(matcher.cleaning_extensions().contains(&".txt".to_string()));
        assert_eq!(matcher.cleaning_extensions().len(), 10);
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("nfo"), ".nfo");
        assert_eq!(normalize_extension(".nfo"), ".nfo");
        assert_eq!(normalize_extension("en.srt"), ".en.srt");
    }
}
