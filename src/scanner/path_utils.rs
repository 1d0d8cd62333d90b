//! Path normalization and containment checks.
//!
//! Two kinds of normalization are combined here:
//!
//! - **Unicode**: macOS stores names decomposed (NFD) while Windows and Linux
//!   usually store them composed (NFC). `café` can therefore have two byte
//!   representations; comparing NFC forms makes them equal.
//! - **Lexical**: `.` components are dropped and `..` pops the previous
//!   component, without touching the filesystem. Relative paths are first
//!   anchored at the current directory.
//!
//! [`is_same_or_within`] uses both to decide whether a copy or move would
//! place a directory inside itself.
//!
//! # Example
//!
//! ```
//! use proview::scanner::path_utils::{is_same_or_within, paths_equal};
//! use std::path::Path;
//!
//! assert!(paths_equal("café.txt", "cafe\u{0301}.txt"));
//! assert!(is_same_or_within(Path::new("/data/photos/2024"), Path::new("/data/photos")));
//! assert!(!is_same_or_within(Path::new("/data/photos-old"), Path::new("/data/photos")));
//! ```

use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
///
/// # Example
///
/// ```
/// use proview::scanner::path_utils::normalize_path_str;
///
/// let nfd = "cafe\u{0301}.txt"; // NFD form
/// assert_eq!(normalize_path_str(nfd), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Normalize a [`Path`] to NFC form.
///
/// Paths that are not valid UTF-8 are returned unchanged.
#[must_use]
pub fn normalize_pathbuf(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(normalize_path_str(s)),
        None => path.to_path_buf(),
    }
}

/// Check if two path strings are equal after NFC normalization.
#[must_use]
pub fn paths_equal(a: &str, b: &str) -> bool {
    normalize_path_str(a) == normalize_path_str(b)
}

/// Comparison key for a path, insensitive to Unicode normalization form.
///
/// Invalid UTF-8 is converted lossily.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&path.to_string_lossy())
}

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` at the root stays at the root; a leading `..` in a relative path is
/// kept.
///
/// # Example
///
/// ```
/// use proview::scanner::path_utils::lexical_normalize;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(lexical_normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
/// ```
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir | Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Anchor a relative path at the current working directory.
///
/// If the working directory cannot be read the path is returned as is.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            log::debug!("Cannot read current directory ({}), using {}", e, path.display());
            path.to_path_buf()
        }
    }
}

/// Absolute, lexically normalized, NFC form of a path.
#[must_use]
pub fn comparison_path(path: &Path) -> PathBuf {
    normalize_pathbuf(&lexical_normalize(&absolutize(path)))
}

/// True if `candidate` is `base` or lies somewhere below it.
///
/// Comparison is component-wise on [`comparison_path`] forms, so
/// `/data/photos-old` is not inside `/data/photos`.
#[must_use]
pub fn is_same_or_within(candidate: &Path, base: &Path) -> bool {
    comparison_path(candidate).starts_with(comparison_path(base))
}
