//! File Handle Error Types
//!
//! Structured error handling for handle lifecycle operations.
//! Maps each failure to an errno and the legacy `-1` return code.

use nix::errno::Errno;

/// File handle error types
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Handle has no file name")]
    NotFilled,

    #[error("Invalid open flags for {0}")]
    InvalidFlags(String),

    #[error("Error opening {name} ({errno})")]
    Open { name: String, errno: Errno },

    #[error("Error closing {name} ({errno})")]
    Close { name: String, errno: Errno },

    #[error("Error getting stats for {name} ({errno})")]
    Stat { name: String, errno: Errno },
}

impl FileError {
    /// Map the error to an appropriate libc errno
    pub fn to_errno(&self) -> i32 {
        match self {
            FileError::InvalidArgument(_) => libc::EINVAL,
            FileError::NotFilled => libc::EINVAL,
            FileError::InvalidFlags(_) => libc::EINVAL,
            FileError::Open { errno, .. }
            | FileError::Close { errno, .. }
            | FileError::Stat { errno, .. } => *errno as i32,
        }
    }

    /// Whether retrying the same call could succeed without changing the handle
    pub fn is_retryable(&self) -> bool {
        match self {
            FileError::Open { errno, .. }
            | FileError::Close { errno, .. }
            | FileError::Stat { errno, .. } => matches!(
                *errno,
                Errno::EINTR | Errno::EAGAIN | Errno::EMFILE | Errno::ENFILE
            ),
            _ => false,
        }
    }

    /// The sentinel returned by the C-style interface for any failure
    pub fn return_code(&self) -> i32 {
        -1
    }
}

pub type Result<T> = std::result::Result<T, FileError>;
