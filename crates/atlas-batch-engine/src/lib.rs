//! Default packing engine for `atlas-batch`.
//!
//! - Sprites: decode, scale (Lanczos3), size limits, transparent-border trim
//! - Placement: MaxRects (BSSF/BLSF/BAF/BL/CP) or `Smart`, which keeps the best of them
//! - Output: PNG/JPEG pages plus a LayaBox `.atlas` or JSON hash descriptor
//!
//! Quick example:
//! ```ignore
//! use atlas_batch_core::prelude::*;
//! use atlas_batch_engine::AtlasEngine;
//! # fn main() -> anyhow::Result<()> {
//! let cwd = std::env::current_dir()?;
//! let project = Project::load("project.json".as_ref(), &cwd, None)?;
//! let report = Runner::new(&FsTree, &AtlasEngine::new(), &project).run()?;
//! println!("{}", report.summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod engine;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod packer;
pub mod sprite;

pub use engine::*;
pub use error::*;
pub use export::*;
pub use layout::*;
pub use model::*;
pub use packer::*;

pub mod prelude {
    pub use crate::engine::{AtlasEngine, descriptor_file_name, page_file_name};
    pub use crate::error::EngineError;
    pub use crate::layout::{Layout, pack_pages, pack_smart};
    pub use crate::model::{Frame, Meta, Page, Rect};
    pub use crate::packer::{Heuristic, MaxRectsPacker, Packer, PageLimits};
    pub use crate::sprite::{Sprite, SpriteLimits};
}
