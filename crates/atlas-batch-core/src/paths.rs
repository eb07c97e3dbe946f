//! Path classification and normalization.
//!
//! Every path that enters the core (descriptor entries, walker results) goes
//! through [`normalize`], so comparisons never depend on separator style or
//! `.`/`..` segments.

use std::path::{Component, Path, PathBuf};

use crate::walk::{EntryKind, FileTree};

/// Replaces every `\` with `/` and trims surrounding whitespace.
pub fn normalize_separators(raw: &str) -> String {
    raw.trim().replace('\\', "/")
}

/// Makes `raw` absolute against `base` and removes `.`/`..` lexically.
///
/// Nothing is resolved on disk; symlinks are left alone.
pub fn normalize(base: &Path, raw: &str) -> PathBuf {
    let fixed = normalize_separators(raw);
    let candidate = Path::new(&fixed);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };
    clean(&joined)
}

/// Lexical cleanup of an already-built path.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                let pending_parent =
                    matches!(out.components().next_back(), Some(Component::ParentDir));
                if pending_parent || (!out.pop() && !out.has_root()) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last path segment, after separator normalization.
pub fn base_name(path: &Path) -> String {
    let fixed = normalize_separators(&path.to_string_lossy());
    fixed
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Lowercased text after the last `.` of the last segment.
///
/// A segment without a dot yields the whole segment, mirroring a plain
/// split-on-dot; callers only compare against known extensions.
pub fn extension(path: &Path) -> String {
    base_name(path)
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Name heuristic for paths that do not exist (yet): a last segment with no
/// `.`-delimited extension is taken to be a folder.
///
/// Approximate on purpose. An extension-less file such as `README` that has
/// already been moved away is reported as a folder.
pub fn looks_like_folder_by_extension(path: &Path) -> bool {
    base_name(path).split('.').count() == 1
}

/// Folder test used by the walker and the exclusion resolver.
///
/// Existing entries answer from the tree; missing ones fall back to
/// [`looks_like_folder_by_extension`].
pub fn is_folder<T: FileTree + ?Sized>(tree: &T, path: &Path) -> bool {
    match tree.entry_kind(path) {
        Some(kind) => kind == EntryKind::Dir,
        None => looks_like_folder_by_extension(path),
    }
}
