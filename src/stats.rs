//! Stats snapshot
//!
//! A one-time copy of a file's metadata taken when the handle is built.
//! It is not refreshed when the file changes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nix::sys::stat::FileStat;
use serde::Serialize;

/// Filesystem metadata captured at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    /// Device containing the file
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// File type and permission bits
    pub mode: u32,
    /// Number of hard links
    pub nlink: u64,
    /// Owner user ID
    pub uid: u32,
    /// Owner group ID
    pub gid: u32,
    /// Size in bytes
    pub size: u64,
    /// Preferred I/O block size
    pub blksize: u64,
    /// Number of 512-byte blocks allocated
    pub blocks: u64,
    /// Last access time
    pub atime: SystemTime,
    /// Last modification time
    pub mtime: SystemTime,
    /// Last status change time
    pub ctime: SystemTime,
}

impl FileStats {
    /// Whether the snapshot describes a regular file
    pub fn is_file(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }

    /// Whether the snapshot describes a directory
    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    /// Permission bits only (e.g. 0o644)
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

#[allow(clippy::unnecessary_cast)]
impl From<FileStat> for FileStats {
    fn from(st: FileStat) -> Self {
        Self {
            dev: st.st_dev as u64,
            ino: st.st_ino as u64,
            mode: st.st_mode as u32,
            nlink: st.st_nlink as u64,
            uid: st.st_uid,
            gid: st.st_gid,
            size: st.st_size.max(0) as u64,
            blksize: st.st_blksize.max(0) as u64,
            blocks: st.st_blocks.max(0) as u64,
            atime: to_system_time(st.st_atime as i64, st.st_atime_nsec as i64),
            mtime: to_system_time(st.st_mtime as i64, st.st_mtime_nsec as i64),
            ctime: to_system_time(st.st_ctime as i64, st.st_ctime_nsec as i64),
        }
    }
}

fn to_system_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = nsecs.clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos)
    } else {
        // Pre-epoch timestamps: step back whole seconds, then forward the fraction
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + Duration::from_nanos(nanos as u64)
    }
}
