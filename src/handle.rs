//! File Handle Management
//!
//! A [`FileHandle`] bundles one path with its open flags, creation mode,
//! behavior flags, an optional open descriptor, an optional stats snapshot
//! and a side table of extras. [`FileHandleManager`] drives its lifecycle:
//! create, fill, open, close and release, plus `new_handle` which composes
//! them.
//!
//! A handle is not synchronized. Callers sharing one across threads must
//! serialize access themselves.

use std::any::Any;
use std::cmp::Ordering;
use std::os::fd::RawFd;
use std::sync::Arc;

use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::error::{FileError, Result};
use crate::extras::Extras;
use crate::flags::BehaviorFlags;
use crate::logging::{LogSink, Severity, TracingSink};
use crate::ops::{FileOps, PosixOps};
use crate::stats::FileStats;

/// Where a handle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Created, no name yet
    Empty,
    /// Has a name, never opened
    Filled,
    /// Holds a descriptor
    Open,
    /// Was opened, descriptor since given back
    Closed,
}

/// One managed file
#[derive(Debug, Default)]
pub struct FileHandle {
    name: Option<String>,
    fd: Option<RawFd>,
    open_flags: Option<OFlag>,
    mode: Option<Mode>,
    behavior: BehaviorFlags,
    stats: Option<FileStats>,
    extras: Option<Extras>,
    opened_before: bool,
}

impl FileHandle {
    /// File name, if the handle has been filled
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Held descriptor, if open
    pub fn descriptor(&self) -> Option<RawFd> {
        self.fd
    }

    /// Held descriptor, or -1 when not open
    pub fn raw_descriptor(&self) -> RawFd {
        self.fd.unwrap_or(-1)
    }

    pub fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    /// Open flags, `None` until the handle is filled
    pub fn open_flags(&self) -> Option<OFlag> {
        self.open_flags
    }

    /// Creation mode, `None` when no mode was given
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn behavior(&self) -> BehaviorFlags {
        self.behavior
    }

    /// Change behavior flags, e.g. to toggle auto-close before release
    pub fn set_behavior(&mut self, behavior: BehaviorFlags) {
        self.behavior = behavior;
    }

    /// Most recent stats snapshot
    pub fn stats(&self) -> Option<&FileStats> {
        self.stats.as_ref()
    }

    /// Attached side data, if any was ever attached
    pub fn extras(&self) -> Option<&Extras> {
        self.extras.as_ref()
    }

    /// Side data table, created on first use
    pub fn extras_mut(&mut self) -> &mut Extras {
        self.extras.get_or_insert_with(Extras::new)
    }

    pub fn state(&self) -> HandleState {
        if self.fd.is_some() {
            HandleState::Open
        } else if self.name.is_none() {
            HandleState::Empty
        } else if self.opened_before {
            HandleState::Closed
        } else {
            HandleState::Filled
        }
    }
}

/// Order two handles by name
///
/// # Panics
/// Both handles must have been filled. An unnamed handle is a caller bug.
pub fn compare_by_name(lhs: &FileHandle, rhs: &FileHandle) -> Ordering {
    assert!(
        lhs.name.is_some() && rhs.name.is_some(),
        "compare_by_name called on a handle without a name"
    );
    lhs.name.cmp(&rhs.name)
}

/// Drives handle lifecycles against an OS and a log sink
pub struct FileHandleManager {
    ops: Arc<dyn FileOps>,
    log: Arc<dyn LogSink>,
}

impl FileHandleManager {
    /// Manager using real system calls and `tracing` output
    pub fn new() -> Self {
        Self::with_parts(Arc::new(PosixOps), Arc::new(TracingSink))
    }

    /// Manager with injected OS primitives and log sink
    pub fn with_parts(ops: Arc<dyn FileOps>, log: Arc<dyn LogSink>) -> Self {
        Self { ops, log }
    }

    fn emit(&self, severity: Severity, message: String) {
        self.log.emit(severity, &message);
    }

    /// Allocate an empty handle
    pub fn create(&self) -> FileHandle {
        self.emit(Severity::Debug, "created empty file handle".to_string());
        FileHandle::default()
    }

    /// Set the identity and policy of a handle
    ///
    /// # Arguments
    /// * `handle` - Handle to fill; a new one is created when `None`
    /// * `name` - File path, copied into the handle
    /// * `open_flags` - Flags for the OS open; empty means read-only
    /// * `mode` - Creation mode, used with `O_CREAT`; empty means none
    /// * `behavior` - Handle-manager policy bits
    pub fn fill(
        &self,
        handle: Option<FileHandle>,
        name: &str,
        open_flags: OFlag,
        mode: Mode,
        behavior: BehaviorFlags,
    ) -> FileHandle {
        let mut handle = handle.unwrap_or_else(|| self.create());

        handle.name = Some(name.to_string());

        if open_flags.is_empty() {
            self.emit(
                Severity::Debug,
                format!("defaulting to O_RDONLY for {}", name),
            );
            handle.open_flags = Some(OFlag::O_RDONLY);
        } else {
            handle.open_flags = Some(open_flags);
        }

        handle.mode = (!mode.is_empty()).then_some(mode);
        handle.behavior = behavior;

        handle
    }

    /// Open the handle's file, or return the descriptor it already holds
    ///
    /// # Returns
    /// The open descriptor
    pub fn open(&self, handle: &mut FileHandle) -> Result<RawFd> {
        let name = match handle.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                self.emit(Severity::Debug, "open on a handle without a name".to_string());
                return Err(FileError::NotFilled);
            }
        };

        if let Some(fd) = handle.fd {
            return Ok(fd);
        }

        let Some(flags) = handle.open_flags else {
            self.emit(Severity::Debug, format!("invalid flags for {}", name));
            return Err(FileError::InvalidFlags(name.to_string()));
        };

        match self.ops.open(name, flags, handle.mode) {
            Ok(fd) => {
                handle.fd = Some(fd);
                handle.opened_before = true;
                Ok(fd)
            }
            Err(errno) => {
                self.emit(
                    Severity::Error,
                    format!("error opening {} ({})", name, errno as i32),
                );
                Err(FileError::Open {
                    name: name.to_string(),
                    errno,
                })
            }
        }
    }

    /// Give back the handle's descriptor; a closed handle is left alone
    ///
    /// On failure the descriptor stays recorded on the handle.
    pub fn close(&self, handle: &mut FileHandle) -> Result<()> {
        let Some(fd) = handle.fd else {
            return Ok(());
        };

        match self.ops.close(fd) {
            Ok(()) => {
                handle.fd = None;
                Ok(())
            }
            Err(errno) => {
                let name = handle.name.clone().unwrap_or_default();
                self.emit(
                    Severity::Error,
                    format!("error closing {} ({})", name, errno as i32),
                );
                Err(FileError::Close { name, errno })
            }
        }
    }

    /// Tear down a handle
    ///
    /// A held descriptor is closed unless `NO_AUTOCLOSE` is set, in which
    /// case it is left open for whoever else knows about it. Name, stats
    /// and extras are freed whatever the close outcome.
    ///
    /// # Returns
    /// The close result, or `InvalidArgument` when `handle` is `None`
    pub fn release(&self, handle: Option<FileHandle>) -> Result<()> {
        let Some(mut handle) = handle else {
            return Err(FileError::InvalidArgument(
                "release of a missing handle".to_string(),
            ));
        };

        let held = handle.fd;
        let rc = match held {
            Some(_) if handle.behavior.auto_close() => self.close(&mut handle),
            Some(fd) => {
                self.emit(
                    Severity::Debug,
                    format!(
                        "leaving descriptor {} open for {}",
                        fd,
                        handle.name().unwrap_or_default()
                    ),
                );
                Ok(())
            }
            None => Ok(()),
        };

        let freed = handle.extras.as_mut().map_or(0, Extras::free_all);
        self.emit(
            Severity::Debug,
            format!(
                "released {} ({} extras)",
                handle.name().unwrap_or_default(),
                freed
            ),
        );

        rc
    }

    /// Take a stats snapshot of the handle's file, replacing any earlier one
    ///
    /// On failure the handle is left without stats.
    pub fn capture_stats<'a>(&self, handle: &'a mut FileHandle) -> Result<&'a FileStats> {
        let name = match handle.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(FileError::NotFilled),
        };

        match self.ops.stat(name) {
            Ok(stats) => Ok(handle.stats.insert(stats)),
            Err(errno) => {
                self.emit(
                    Severity::Debug,
                    format!("error getting stats for {} ({})", name, errno as i32),
                );
                let name = name.to_string();
                handle.stats = None;
                Err(FileError::Stat { name, errno })
            }
        }
    }

    /// Build a filled handle, optionally capturing stats and opening it
    ///
    /// Stats capture and opening are best effort: failures are logged and
    /// the handle is returned without stats or without a descriptor.
    pub fn new_handle(
        &self,
        name: &str,
        open_flags: OFlag,
        mode: Mode,
        behavior: BehaviorFlags,
    ) -> FileHandle {
        let mut handle = self.fill(None, name, open_flags, mode, behavior);

        let want_stats = behavior.contains(BehaviorFlags::STATS);
        if want_stats {
            // Failure already logged by capture_stats
            let _ = self.capture_stats(&mut handle);
        }

        if behavior.contains(BehaviorFlags::AUTO_OPEN) {
            // Failure already logged by open
            let opened = self.open(&mut handle).is_ok();

            // O_CREAT may have just brought the file into existence
            if want_stats && opened && handle.stats.is_none() {
                let _ = self.capture_stats(&mut handle);
            }
        }

        handle
    }

    /// Release adapter matching a container's element-free callback
    pub fn container_free(&self, handle: FileHandle, _context: Option<&dyn Any>) -> Result<()> {
        self.release(Some(handle))
    }
}

impl Default for FileHandleManager {
    fn default() -> Self {
        Self::new()
    }
}
