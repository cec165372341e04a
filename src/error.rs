use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::Depth;
use crate::quadtree::Point;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] postcard::Error),

    #[error("Invalid region file magic, found {got:?}")]
    BadMagic { got: [u8; 4] },

    #[error("Unsupported region file version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Region file truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Region file checksum mismatch")]
    ChecksumMismatch,

    #[error("Region file node {node} refers to missing node {child}")]
    DanglingNode { node: u32, child: u32 },

    #[error("Region file root {root} is out of range, file has {nodes} nodes")]
    DanglingRoot { root: u32, nodes: usize },

    #[error("Cannot persist an unmaterialized subtree at {origin:?}, depth {depth}")]
    Unmaterialized { origin: Point, depth: Depth },
}

impl MapError {
    /// Attach `path` to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> MapError {
        let path = path.into();

        move |source| MapError::Io { path, source }
    }

    /// Whether this is an I/O error caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
