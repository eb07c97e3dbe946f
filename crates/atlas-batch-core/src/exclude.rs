use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::paths::{extension, is_folder, normalize};
use crate::walk::{FileEntry, FileTree, list_files, list_folders};

/// Extensions the packer accepts. Anything else is copied through.
pub const PACKABLE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Closed set of excluded absolute paths.
///
/// Built by [`ExcludeSet::expand`]: when a folder is a member, every folder
/// below it is a member as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExcludeSet {
    paths: BTreeSet<PathBuf>,
}

impl ExcludeSet {
    /// Normalizes each declared entry against `base` and adds the descendant
    /// folders of every entry that classifies as a folder. Files are kept as
    /// declared and never expanded.
    pub fn expand<T: FileTree + ?Sized>(tree: &T, base: &Path, entries: &[String]) -> Self {
        let mut paths = BTreeSet::new();
        for raw in entries {
            let entry = normalize(base, raw);
            if is_folder(tree, &entry) {
                paths.extend(list_folders(tree, &entry));
            }
            paths.insert(entry);
        }
        Self { paths }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<PathBuf> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// `png`/`jpg`, case-insensitive.
pub fn is_packable_image(path: &Path) -> bool {
    let ext = extension(path);
    PACKABLE_EXTENSIONS.contains(&ext.as_str())
}

/// Direct files of one folder split by destination.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Images handed to the packer.
    pub to_pack: Vec<FileEntry>,
    /// Copied byte-for-byte to the mirrored location.
    pub passthrough: Vec<FileEntry>,
}

/// Splits the direct files of `folder`. An image is packed unless its path is
/// excluded; every other file passes through.
pub fn partition_files<T: FileTree + ?Sized>(
    tree: &T,
    folder: &Path,
    excludes: &ExcludeSet,
) -> io::Result<Partition> {
    let mut part = Partition::default();
    for file in list_files(tree, folder)? {
        if !is_packable_image(&file.path) {
            part.passthrough.push(file);
        } else if excludes.contains(&file.path) {
            debug!(file = %file.path.display(), "exclude file");
            part.passthrough.push(file);
        } else {
            part.to_pack.push(file);
        }
    }
    Ok(part)
}
