//! Re-rooting input paths onto the output tree, and the writes that go there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{BatchError, Result};
use crate::paths::{clean, normalize_separators};

/// Strips `input_root` from `path` and joins the rest onto `output_root`.
///
/// `None` when `path` is not under `input_root`. Pure: the same arguments
/// always give the same destination.
pub fn map_path(path: &Path, input_root: &Path, output_root: &Path) -> Option<PathBuf> {
    path.strip_prefix(input_root)
        .ok()
        .map(|rest| output_root.join(rest))
}

/// Files copied and files that failed during one recursive copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub failed: usize,
}

/// Writes into the output tree at positions mirrored from the input tree.
#[derive(Debug, Clone)]
pub struct OutputMapper {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl OutputMapper {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn map(&self, path: &Path) -> Result<PathBuf> {
        map_path(path, &self.input_root, &self.output_root).ok_or_else(|| {
            BatchError::OutsideInputRoot {
                path: path.to_path_buf(),
                root: self.input_root.clone(),
            }
        })
    }

    /// Creates every missing directory above `dest`. Existing ones are fine.
    pub fn ensure_parent(dest: &Path) -> io::Result<()> {
        match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Writes `bytes` at the mirror of `input_path`, replacing any previous
    /// file. Returns the destination.
    pub fn write_mapped(&self, input_path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let dest = self.map(input_path)?;
        Self::ensure_parent(&dest)?;
        fs::write(&dest, bytes)?;
        info!(path = %dest.display(), "writing");
        Ok(dest)
    }

    /// Writes `bytes` at `name` below the output root, replacing any previous
    /// file. `name` may not climb out of the root.
    pub fn write_output(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dest = clean(&self.output_root.join(normalize_separators(name)));
        if !dest.starts_with(&self.output_root) || dest == self.output_root {
            return Err(BatchError::OutsideOutputRoot {
                path: dest,
                root: self.output_root.clone(),
            });
        }
        Self::ensure_parent(&dest)?;
        fs::write(&dest, bytes)?;
        info!(path = %dest.display(), "writing");
        Ok(dest)
    }

    /// Byte-for-byte copy of one file to its mirror.
    pub fn copy_file(&self, src: &Path) -> Result<PathBuf> {
        let dest = self.map(src)?;
        if dest == src {
            debug!(path = %src.display(), "output equals input, nothing to copy");
            return Ok(dest);
        }
        Self::ensure_parent(&dest)?;
        fs::copy(src, &dest)?;
        info!(src = %src.display(), dest = %dest.display(), "copied");
        Ok(dest)
    }

    /// Recursive copy of `folder` to its mirror, every entry included.
    ///
    /// An entry that cannot be read or copied is logged and counted, and the
    /// copy goes on with the rest. Errors only when `folder` has no mirror.
    pub fn copy_tree(&self, folder: &Path) -> Result<CopyStats> {
        let dest_root = self.map(folder)?;
        let mut stats = CopyStats::default();
        for entry in WalkDir::new(folder).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(folder);
                    error!(path = %path.display(), error = %e, "copy failed");
                    stats.failed += 1;
                    continue;
                }
            };
            if let Err(e) = self.copy_entry(&entry) {
                error!(path = %entry.path().display(), error = %e, "copy failed");
                stats.failed += 1;
                continue;
            }
            if !entry.file_type().is_dir() {
                stats.copied += 1;
            }
        }
        info!(
            src = %folder.display(),
            dest = %dest_root.display(),
            files = stats.copied,
            failed = stats.failed,
            "copied folder"
        );
        Ok(stats)
    }

    fn copy_entry(&self, entry: &walkdir::DirEntry) -> Result<()> {
        let src = entry.path();
        let dest = self.map(src)?;
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else if dest != src {
            Self::ensure_parent(&dest)?;
            fs::copy(src, &dest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_under_output_root() {
        let mapped = map_path(Path::new("/in/a/b.png"), Path::new("/in"), Path::new("/out"));
        assert_eq!(mapped, Some(PathBuf::from("/out/a/b.png")));
        let again = map_path(Path::new("/in/a/b.png"), Path::new("/in"), Path::new("/out"));
        assert_eq!(mapped, again);
    }

    #[test]
    fn outside_paths_do_not_map() {
        assert_eq!(
            map_path(Path::new("/elsewhere/x.png"), Path::new("/in"), Path::new("/out")),
            None
        );
        // prefix match is by component, not by string
        assert_eq!(
            map_path(Path::new("/input/x.png"), Path::new("/in"), Path::new("/out")),
            None
        );
    }

    #[test]
    fn mapper_reports_outside_paths() {
        let m = OutputMapper::new("/in", "/out");
        assert!(matches!(
            m.map(Path::new("/other/file")),
            Err(BatchError::OutsideInputRoot { .. })
        ));
        assert_eq!(m.map(Path::new("/in")).expect("root"), PathBuf::from("/out"));
    }

    #[test]
    fn mapped_write_mirrors_input_position() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let m = OutputMapper::new(tmp.path().join("in"), tmp.path().join("out"));
        let dest = m
            .write_mapped(&tmp.path().join("in/a/b/c.json"), b"1")
            .expect("write");
        assert_eq!(dest, tmp.path().join("out/a/b/c.json"));
        m.write_mapped(&tmp.path().join("in/a/b/c.json"), b"2").expect("rewrite");
        assert_eq!(fs::read(&dest).expect("read"), b"2");
    }

    #[test]
    fn outputs_stay_below_output_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let out = tmp.path().join("out");
        let m = OutputMapper::new(tmp.path().join("in"), &out);
        let dest = m.write_output("ui.atlas", b"{}").expect("write");
        assert_eq!(dest, out.join("ui.atlas"));
        assert!(matches!(
            m.write_output("../escape.png", b"x"),
            Err(BatchError::OutsideOutputRoot { .. })
        ));
        assert!(!tmp.path().join("escape.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn tree_copy_goes_past_a_broken_entry() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("in/locked");
        fs::create_dir_all(src.join("deep")).expect("mkdir");
        for name in ["a.png", "b.txt", "deep/c.png"] {
            fs::write(src.join(name), name).expect("write");
        }
        std::os::unix::fs::symlink(src.join("missing"), src.join("dangling.png")).expect("symlink");

        let m = OutputMapper::new(tmp.path().join("in"), tmp.path().join("out"));
        let stats = m.copy_tree(&src).expect("mirrored folder");
        assert_eq!(stats, CopyStats { copied: 3, failed: 1 });
        let out = tmp.path().join("out/locked");
        for name in ["a.png", "b.txt", "deep/c.png"] {
            assert_eq!(fs::read_to_string(out.join(name)).expect("copied"), name);
        }
    }
}
