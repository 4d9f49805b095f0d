//! fhandle - managed single-file descriptor handles
//!
//! A [`FileHandle`] carries a path, open flags, creation mode, an optional
//! descriptor, an optional stats snapshot and keyed extras.
//! [`FileHandleManager`] opens, closes and releases it against injected
//! OS primitives and a log sink.

pub mod container;
pub mod error;
pub mod extras;
pub mod flags;
pub mod handle;
pub mod logging;
pub mod ops;
pub mod stats;

pub use container::HandleSet;
pub use error::{FileError, Result};
pub use extras::Extras;
pub use flags::BehaviorFlags;
pub use handle::{compare_by_name, FileHandle, FileHandleManager, HandleState};
pub use logging::{CaptureSink, LogSink, Severity, TracingSink};
pub use ops::{FileOps, PosixOps};
pub use stats::FileStats;
