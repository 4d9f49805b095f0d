//! Handle behavior flags and open-flag helpers

use bitflags::bitflags;
use nix::fcntl::OFlag;

bitflags! {
    /// Handle-manager policy bits, distinct from the OS open flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BehaviorFlags: u32 {
        /// Leave the descriptor open when the handle is released
        const NO_AUTOCLOSE = 0x0000_0001;
        /// Capture a stats snapshot when constructing with `new_handle`
        const STATS = 0x0000_0002;
        /// Open the file when constructing with `new_handle`
        const AUTO_OPEN = 0x0000_0004;
    }
}

impl BehaviorFlags {
    /// Whether release should close a held descriptor
    #[inline]
    pub fn auto_close(&self) -> bool {
        !self.contains(BehaviorFlags::NO_AUTOCLOSE)
    }
}

/// Access mode bits of an open-flag set
#[inline]
pub fn access_mode(flags: OFlag) -> OFlag {
    flags & OFlag::O_ACCMODE
}

/// Whether the flags request file creation (and therefore use a mode)
#[inline]
pub fn is_create(flags: OFlag) -> bool {
    flags.contains(OFlag::O_CREAT)
}
