use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::paths::{base_name, is_folder};

/// What sits at a path that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// Directory-listing abstraction the walker and resolver run on.
///
/// `read_dir` returns child paths built by joining the child name onto `dir`,
/// in whatever order the source produces them.
pub trait FileTree {
    /// `None` when nothing exists at `path`.
    fn entry_kind(&self, path: &Path) -> Option<EntryKind>;
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTree;

impl FileTree for FsTree {
    fn entry_kind(&self, path: &Path) -> Option<EntryKind> {
        fs::metadata(path).ok().map(|m| {
            if m.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            }
        })
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(dir)?
            .map(|entry| entry.map(|e| dir.join(e.file_name())))
            .collect()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// A file found directly inside a folder. `contents` is filled lazily, and only
/// for images headed to the packer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip)]
    pub contents: Option<Vec<u8>>,
}

impl FileEntry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            name: base_name(&path),
            path,
            contents: None,
        }
    }
}

/// Archive tool leftovers (`__MACOSX`), matched case-insensitively anywhere in
/// the path.
pub fn is_archive_metadata(path: &Path) -> bool {
    path.to_string_lossy().to_uppercase().contains("__MACOSX")
}

/// Every folder below `root` (not `root` itself), pre-order, with
/// [`is_archive_metadata`] directories and their subtrees left out.
pub fn list_folders<T: FileTree + ?Sized>(tree: &T, root: &Path) -> Vec<PathBuf> {
    walk_folders(tree, root, &is_archive_metadata)
}

/// Recursive folder enumeration; `skip` prunes a directory and everything
/// under it.
pub fn walk_folders<T, F>(tree: &T, root: &Path, skip: &F) -> Vec<PathBuf>
where
    T: FileTree + ?Sized,
    F: Fn(&Path) -> bool + ?Sized,
{
    let mut out = Vec::new();
    collect_folders(tree, root, skip, &mut out);
    out
}

fn collect_folders<T, F>(tree: &T, dir: &Path, skip: &F, out: &mut Vec<PathBuf>)
where
    T: FileTree + ?Sized,
    F: Fn(&Path) -> bool + ?Sized,
{
    let children = match tree.read_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read folder, treating as empty");
            return;
        }
    };
    for child in children {
        if is_folder(tree, &child) && !skip(&child) {
            out.push(child.clone());
            collect_folders(tree, &child, skip, out);
        }
    }
}

/// Direct file children of `folder`; sub-folders are not entered.
pub fn list_files<T: FileTree + ?Sized>(tree: &T, folder: &Path) -> io::Result<Vec<FileEntry>> {
    let children = tree.read_dir(folder)?;
    Ok(children
        .into_iter()
        .filter(|child| !is_folder(tree, child))
        .map(FileEntry::new)
        .collect())
}
