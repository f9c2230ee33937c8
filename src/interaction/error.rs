use std::path::PathBuf;

use thiserror::Error;

/// Why an interaction produced no result. All of these are expected outcomes:
/// the caller skips the gesture and retries on a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("no tracking frame yet")]
    NoFrame,
    #[error("feature point cloud is empty")]
    EmptyCloud,
    #[error("no feature point in front of the ray origin")]
    NothingInFront,
    #[error("object is outside the camera view")]
    OutOfView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("interaction unavailable: {0}")]
    Unavailable(#[from] Unavailable),
    #[error("degenerate ray: direction cannot be normalized")]
    DegenerateRay,
}

impl InteractionError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, InteractionError::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("cannot open feature cloud {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse feature cloud {}: {source}", .path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: obj::ObjError,
    },
}
