use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{PackJobOptions, Project};
use crate::exclude::{ExcludeSet, Partition, partition_files};
use crate::paths::base_name;
use crate::walk::{FileEntry, FileTree};

/// Work planned for one folder under the input root.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackJob {
    /// Excluded folder: copied recursively, never packed.
    CopyThrough { folder: PathBuf },
    Pack(PackPlan),
}

impl PackJob {
    pub fn folder(&self) -> &Path {
        match self {
            Self::CopyThrough { folder } => folder,
            Self::Pack(plan) => &plan.folder,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackPlan {
    pub folder: PathBuf,
    pub to_pack: Vec<FileEntry>,
    pub passthrough: Vec<FileEntry>,
    pub options: PackJobOptions,
}

impl PackPlan {
    pub fn texture_name(&self) -> &str {
        &self.options.texture_name
    }

    pub fn scale(&self) -> f64 {
        self.options.scale
    }
}

/// Scale for a folder: its entry in the map when present, positive and
/// finite, else 1.
pub fn resolve_scale(scale_map: &BTreeMap<String, f64>, texture_name: &str) -> f64 {
    match scale_map.get(texture_name) {
        Some(&scale) if scale.is_finite() && scale > 0.0 => scale,
        Some(&scale) => {
            warn!(texture = texture_name, scale, "unusable scale, using 1");
            1.0
        }
        None => 1.0,
    }
}

/// One job per folder, in `folders` order.
///
/// An excluded folder whose parent is also an excluded folder of this walk is
/// already covered by the parent's recursive copy and gets no job of its own.
pub fn plan_jobs<T: FileTree + ?Sized>(
    tree: &T,
    project: &Project,
    folders: &[PathBuf],
    excludes: &Arc<ExcludeSet>,
) -> Vec<PackJob> {
    let walked: HashSet<&Path> = folders.iter().map(PathBuf::as_path).collect();
    let mut jobs = Vec::with_capacity(folders.len());

    for folder in folders {
        if excludes.contains(folder) {
            let covered = folder
                .parent()
                .is_some_and(|parent| excludes.contains(parent) && walked.contains(parent));
            if covered {
                debug!(folder = %folder.display(), "covered by parent folder copy");
            } else {
                jobs.push(PackJob::CopyThrough {
                    folder: folder.clone(),
                });
            }
            continue;
        }

        let Partition {
            to_pack,
            passthrough,
        } = match partition_files(tree, folder, excludes) {
            Ok(part) => part,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "cannot list folder files");
                Partition::default()
            }
        };
        let texture_name = base_name(folder);
        let scale = resolve_scale(project.scale_map(), &texture_name);
        let options = PackJobOptions::for_folder(project, texture_name, scale, excludes.clone());
        jobs.push(PackJob::Pack(PackPlan {
            folder: folder.clone(),
            to_pack,
            passthrough,
            options,
        }));
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectDescriptor;
    use crate::walk::list_folders;
    use crate::walk::testing::MemTree;

    fn project(scale_dir: &[(&str, f64)], excludes: &[&str]) -> Project {
        let descriptor = ProjectDescriptor {
            input_dir: Some("/in".into()),
            output_dir: Some("/out".into()),
            exclude_list: excludes.iter().map(|s| s.to_string()).collect(),
            scale_dir: scale_dir.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        };
        Project::resolve(descriptor, Path::new("/in/project.json"), Path::new("/"), None)
    }

    fn tree() -> MemTree {
        MemTree::new()
            .file("/in/hero/a.png", b"a")
            .file("/in/hero/b.jpg", b"b")
            .file("/in/hero/info.txt", b"i")
            .file("/in/enemy/e.png", b"e")
            .file("/in/locked/l.png", b"l")
            .file("/in/locked/deep/d.png", b"d")
            .file("/in/locked/deep/deeper/x.png", b"x")
            .dir("/in/empty")
    }

    fn plan(project: &Project, tree: &MemTree) -> Vec<PackJob> {
        let folders = list_folders(tree, &project.input_root);
        let excludes = Arc::new(ExcludeSet::expand(
            tree,
            &project.base_dir,
            &project.descriptor.exclude_list,
        ));
        plan_jobs(tree, project, &folders, &excludes)
    }

    #[test]
    fn scale_defaults_to_one() {
        let map: BTreeMap<String, f64> = [("hero".to_string(), 2.0), ("ui".to_string(), 1.0)]
            .into_iter()
            .collect();
        assert_eq!(resolve_scale(&map, "enemy"), 1.0);
        assert_eq!(resolve_scale(&map, "hero"), 2.0);
        assert_eq!(resolve_scale(&map, "ui"), 1.0);
    }

    #[test]
    fn zero_negative_and_nan_scales_fall_back_to_one() {
        let map: BTreeMap<String, f64> = [
            ("zero".to_string(), 0.0),
            ("neg".to_string(), -2.0),
            ("nan".to_string(), f64::NAN),
            ("inf".to_string(), f64::INFINITY),
        ]
        .into_iter()
        .collect();
        for name in ["zero", "neg", "nan", "inf"] {
            assert_eq!(resolve_scale(&map, name), 1.0, "{name}");
        }
    }

    #[test]
    fn excluded_folder_is_copied_once() {
        let p = project(&[], &["/in/locked"]);
        let jobs = plan(&p, &tree());
        let copies: Vec<&Path> = jobs
            .iter()
            .filter_map(|j| match j {
                PackJob::CopyThrough { folder } => Some(folder.as_path()),
                _ => None,
            })
            .collect();
        assert_eq!(copies, vec![Path::new("/in/locked")]);
        // nothing under the excluded folder is planned for packing
        for job in &jobs {
            if let PackJob::Pack(plan) = job {
                assert!(!plan.folder.starts_with("/in/locked"));
                assert!(plan.to_pack.iter().all(|f| !f.path.starts_with("/in/locked")));
            }
        }
    }

    #[test]
    fn pack_jobs_carry_name_scale_and_files() {
        let p = project(&[("hero", 2.0)], &[]);
        let jobs = plan(&p, &tree());
        let hero = jobs
            .iter()
            .find_map(|j| match j {
                PackJob::Pack(plan) if plan.texture_name() == "hero" => Some(plan),
                _ => None,
            })
            .expect("hero job");
        assert_eq!(hero.scale(), 2.0);
        assert_eq!(hero.to_pack.len(), 2);
        assert_eq!(hero.passthrough.len(), 1);
        let enemy = jobs
            .iter()
            .find_map(|j| match j {
                PackJob::Pack(plan) if plan.texture_name() == "enemy" => Some(plan),
                _ => None,
            })
            .expect("enemy job");
        assert_eq!(enemy.scale(), 1.0);
    }

    #[test]
    fn empty_folder_still_gets_a_pack_job() {
        let p = project(&[], &[]);
        let jobs = plan(&p, &tree());
        let empty = jobs
            .iter()
            .find(|j| j.folder() == Path::new("/in/empty"))
            .expect("empty job");
        match empty {
            PackJob::Pack(plan) => assert!(plan.to_pack.is_empty()),
            other => panic!("expected pack job, got {other:?}"),
        }
    }

    #[test]
    fn excluded_subfolder_of_packed_folder_is_copied() {
        let p = project(&[], &["/in/locked/deep"]);
        let jobs = plan(&p, &tree());
        assert!(jobs.iter().any(|j| matches!(j, PackJob::Pack(plan) if plan.folder == Path::new("/in/locked"))));
        assert!(jobs.iter().any(|j| matches!(j, PackJob::CopyThrough { folder } if folder == Path::new("/in/locked/deep"))));
        assert!(!jobs.iter().any(|j| j.folder() == Path::new("/in/locked/deep/deeper")));
    }
}
