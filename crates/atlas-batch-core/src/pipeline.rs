use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Project;
use crate::error::{BatchError, Result};
use crate::exclude::ExcludeSet;
use crate::output::OutputMapper;
use crate::packer::{PackInput, PackerAdapter};
use crate::plan::{PackJob, PackPlan, plan_jobs};
use crate::walk::{EntryKind, FileTree, is_archive_metadata, walk_folders};

/// Lifecycle of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Planned,
    Invoked,
    Completed,
    Failed,
}

/// What happened to one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub folder: PathBuf,
    pub state: JobState,
    /// True for copy-through jobs.
    pub copy_through: bool,
    /// Atlas pages and descriptors written.
    pub written: Vec<PathBuf>,
    pub copied_files: usize,
    pub copy_failures: usize,
    /// Images dropped because they could not be read.
    pub skipped_files: usize,
    pub error: Option<String>,
}

impl JobOutcome {
    fn new(folder: &Path, copy_through: bool) -> Self {
        Self {
            folder: folder.to_path_buf(),
            state: JobState::Planned,
            copy_through,
            written: Vec::new(),
            copied_files: 0,
            copy_failures: 0,
            skipped_files: 0,
            error: None,
        }
    }

    fn fail(mut self, message: String) -> Self {
        self.state = JobState::Failed;
        self.error = Some(message);
        self
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub jobs: usize,
    pub packed: usize,
    pub copied_folders: usize,
    pub copied_files: usize,
    pub outputs_written: usize,
    pub copy_failures: usize,
    pub skipped_files: usize,
    pub failed: Vec<PathBuf>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: &JobOutcome) {
        self.jobs += 1;
        self.copied_files += outcome.copied_files;
        self.outputs_written += outcome.written.len();
        self.copy_failures += outcome.copy_failures;
        self.skipped_files += outcome.skipped_files;
        match outcome.state {
            JobState::Failed => self.failed.push(outcome.folder.clone()),
            JobState::Completed if outcome.copy_through => self.copied_folders += 1,
            JobState::Completed => self.packed += 1,
            JobState::Planned | JobState::Invoked => {}
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Jobs: {}, Packed: {}, Copied folders: {}, Copied files: {}, Outputs: {}, Copy failures: {}, Skipped: {}, Failed: {}",
            self.jobs,
            self.packed,
            self.copied_folders,
            self.copied_files,
            self.outputs_written,
            self.copy_failures,
            self.skipped_files,
            self.failed.len(),
        )
    }
}

/// Drives a project: discover folders, resolve exclusions, plan, then execute
/// jobs one at a time.
pub struct Runner<'a, T: FileTree + ?Sized, P: PackerAdapter> {
    tree: &'a T,
    packer: &'a P,
    project: &'a Project,
    mapper: OutputMapper,
    dry_run: bool,
    /// Atlas output path → folder that wrote it.
    written: HashMap<PathBuf, PathBuf>,
}

impl<'a, T: FileTree + ?Sized, P: PackerAdapter> Runner<'a, T, P> {
    pub fn new(tree: &'a T, packer: &'a P, project: &'a Project) -> Self {
        Self {
            tree,
            packer,
            project,
            mapper: OutputMapper::new(&project.input_root, &project.output_root),
            dry_run: false,
            written: HashMap::new(),
        }
    }

    /// Plan and log only; nothing is copied, packed or written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Every folder below the input root. When the output root sits inside the
    /// input tree it is left out, so earlier results are never re-packed.
    pub fn discover(&self) -> Vec<PathBuf> {
        let input_root = &self.project.input_root;
        let output_root = &self.project.output_root;
        let nested_output = output_root != input_root && output_root.starts_with(input_root);
        let folders = walk_folders(self.tree, input_root, &|p: &Path| {
            is_archive_metadata(p) || (nested_output && p == output_root.as_path())
        });
        info!(count = folders.len(), "discovered folders");
        for folder in &folders {
            debug!(folder = %folder.display(), "folder");
        }
        folders
    }

    pub fn resolve_excludes(&self) -> Arc<ExcludeSet> {
        let set = ExcludeSet::expand(
            self.tree,
            &self.project.base_dir,
            &self.project.descriptor.exclude_list,
        );
        info!(count = set.len(), "resolved exclude list");
        for path in set.iter() {
            debug!(path = %path.display(), "exclude");
        }
        Arc::new(set)
    }

    pub fn plan(&self) -> Result<Vec<PackJob>> {
        let input_root = &self.project.input_root;
        if self.tree.entry_kind(input_root) != Some(EntryKind::Dir) {
            return Err(BatchError::MissingInputRoot(input_root.clone()));
        }
        info!(
            input = %input_root.display(),
            output = %self.project.output_root.display(),
            "project roots"
        );
        let folders = self.discover();
        let excludes = self.resolve_excludes();
        Ok(plan_jobs(self.tree, self.project, &folders, &excludes))
    }

    pub fn execute(&mut self, job: &PackJob) -> JobOutcome {
        match job {
            PackJob::CopyThrough { folder } => self.copy_through(folder),
            PackJob::Pack(plan) => self.pack(plan),
        }
    }

    /// Plans and executes every job in order.
    pub fn run(&mut self) -> Result<BatchReport> {
        let jobs = self.plan()?;
        let mut report = BatchReport::default();
        for job in &jobs {
            let outcome = self.execute(job);
            report.record(&outcome);
        }
        info!(summary = %report.summary(), "done");
        Ok(report)
    }

    fn copy_through(&mut self, folder: &Path) -> JobOutcome {
        let mut outcome = JobOutcome::new(folder, true);
        info!(folder = %folder.display(), "exclude folder");
        if self.dry_run {
            return outcome;
        }
        match self.mapper.copy_tree(folder) {
            Ok(stats) => {
                outcome.copied_files = stats.copied;
                outcome.copy_failures = stats.failed;
            }
            Err(e) => {
                error!(folder = %folder.display(), error = %e, "copy failed");
                outcome.copy_failures += 1;
            }
        }
        outcome.state = JobState::Completed;
        outcome
    }

    fn pack(&mut self, plan: &PackPlan) -> JobOutcome {
        let mut outcome = JobOutcome::new(&plan.folder, false);
        info!(
            folder = %plan.folder.display(),
            texture = plan.texture_name(),
            scale = plan.scale(),
            images = plan.to_pack.len(),
            passthrough = plan.passthrough.len(),
            "start packing"
        );
        if self.dry_run {
            return outcome;
        }

        for file in &plan.passthrough {
            match self.mapper.copy_file(&file.path) {
                Ok(_) => outcome.copied_files += 1,
                Err(e) => {
                    error!(file = %file.path.display(), error = %e, "copy failed");
                    outcome.copy_failures += 1;
                }
            }
        }

        let mut inputs = Vec::with_capacity(plan.to_pack.len());
        for file in &plan.to_pack {
            let contents = match &file.contents {
                Some(bytes) => bytes.clone(),
                None => match self.tree.read(&file.path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        debug!(file = %file.path.display(), error = %e, "skip unreadable image");
                        outcome.skipped_files += 1;
                        continue;
                    }
                },
            };
            inputs.push(PackInput {
                path: file.name.clone(),
                dir: file.path.clone(),
                contents,
            });
        }

        outcome.state = JobState::Invoked;
        let produced = match self.packer.pack(inputs, &plan.options) {
            Ok(files) => files,
            Err(e) => {
                error!(folder = %plan.folder.display(), error = %e, "packing failed");
                return outcome.fail(e.to_string());
            }
        };

        for file in produced {
            match self.mapper.write_output(&file.name, &file.buffer) {
                Ok(dest) => {
                    if let Some(previous) = self.written.insert(dest.clone(), plan.folder.clone()) {
                        if previous != plan.folder {
                            warn!(
                                path = %dest.display(),
                                first = %previous.display(),
                                second = %plan.folder.display(),
                                "output collision, later write wins"
                            );
                        }
                    }
                    outcome.written.push(dest);
                }
                Err(e) => {
                    error!(file = %file.name, error = %e, "write failed");
                    return outcome.fail(e.to_string());
                }
            }
        }
        outcome.state = JobState::Completed;
        outcome
    }
}
