//! Batch atlas builds driven by a project descriptor.
//!
//! - Walk: every folder under the input root becomes one job (`__MACOSX` skipped)
//! - Exclude: declared folders expand to whole subtrees and are copied verbatim
//! - Partition: `png`/`jpg` files go to the packer, everything else passes through
//! - Output: copies land at their mirrored position, atlases at the top of the output root
//!
//! The packing engine sits behind [`PackerAdapter`]; `atlas-batch-engine`
//! provides the default one.
//!
//! Quick example:
//! ```ignore
//! use atlas_batch_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let cwd = std::env::current_dir()?;
//! let project = Project::load("project.json".as_ref(), &cwd, None)?;
//! let engine = atlas_batch_engine::AtlasEngine::default();
//! let report = Runner::new(&FsTree, &engine, &project).run()?;
//! println!("{}", report.summary());
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod exclude;
pub mod output;
pub mod packer;
pub mod paths;
pub mod pipeline;
pub mod plan;
pub mod walk;

pub use config::*;
pub use error::*;
pub use exclude::*;
pub use output::*;
pub use packer::*;
pub use pipeline::*;
pub use plan::*;
pub use walk::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_batch_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        Exporter, PackJobOptions, PackerMethod, Project, ProjectDescriptor, TextureFormat,
    };
    pub use crate::error::{BatchError, Result};
    pub use crate::exclude::{ExcludeSet, Partition, partition_files};
    pub use crate::output::{OutputMapper, map_path};
    pub use crate::packer::{PackInput, PackedFile, PackerAdapter};
    pub use crate::pipeline::{BatchReport, JobOutcome, JobState, Runner};
    pub use crate::plan::{PackJob, PackPlan, plan_jobs, resolve_scale};
    pub use crate::walk::{FileEntry, FileTree, FsTree, list_files, list_folders};
}
