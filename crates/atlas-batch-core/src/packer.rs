use std::path::PathBuf;

use crate::config::PackJobOptions;

/// One image handed to the packer.
#[derive(Debug, Clone)]
pub struct PackInput {
    /// Name relative to the folder being packed (the sprite key).
    pub path: String,
    /// Absolute path of the source file.
    pub dir: PathBuf,
    pub contents: Vec<u8>,
}

/// One file produced by the packer: an atlas page or a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFile {
    /// Output name, relative to the output root.
    pub name: String,
    pub buffer: Vec<u8>,
}

/// The packing engine, seen from the batch runner.
///
/// One call per folder, blocking until the engine is done. The runner does not
/// retry or time the call out, and writes every returned file unchanged.
pub trait PackerAdapter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn pack(
        &self,
        files: Vec<PackInput>,
        options: &PackJobOptions,
    ) -> Result<Vec<PackedFile>, Self::Error>;
}
