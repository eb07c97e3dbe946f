use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read project descriptor {path}: {source}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported project format {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is not under the input root {root}")]
    OutsideInputRoot { path: PathBuf, root: PathBuf },
    #[error("{path} escapes the output root {root}")]
    OutsideOutputRoot { path: PathBuf, root: PathBuf },
    #[error("input root does not exist or is not a directory: {0}")]
    MissingInputRoot(PathBuf),
}

pub type Result<T> = std::result::Result<T, BatchError>;
