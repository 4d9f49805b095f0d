//! OS file primitives
//!
//! The handle manager reaches the operating system only through
//! [`FileOps`]. [`PosixOps`] is the real implementation on top of `nix`.

use std::os::fd::RawFd;

use nix::fcntl::{self, OFlag};
use nix::sys::stat::{self, Mode};
use nix::unistd;

use crate::stats::FileStats;

/// open/close/stat as seen by the handle manager
pub trait FileOps: Send + Sync {
    /// Open `path`, passing `mode` only when one was configured
    fn open(&self, path: &str, flags: OFlag, mode: Option<Mode>) -> nix::Result<RawFd>;

    /// Close a descriptor previously returned by `open`
    fn close(&self, fd: RawFd) -> nix::Result<()>;

    /// Take a stats snapshot of `path`
    fn stat(&self, path: &str) -> nix::Result<FileStats>;
}

/// Direct system calls
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixOps;

impl FileOps for PosixOps {
    fn open(&self, path: &str, flags: OFlag, mode: Option<Mode>) -> nix::Result<RawFd> {
        fcntl::open(path, flags, mode.unwrap_or(Mode::empty()))
    }

    fn close(&self, fd: RawFd) -> nix::Result<()> {
        unistd::close(fd)
    }

    fn stat(&self, path: &str) -> nix::Result<FileStats> {
        stat::stat(path).map(FileStats::from)
    }
}
