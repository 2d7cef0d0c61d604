//! Per-channel vector time.

use std::fmt;

/// A two-component vector clock scoped to exactly one client↔server channel.
///
/// `local` counts operations generated and sent on this channel; `remote`
/// counts operations received and applied from the peer. Jupiter deliberately
/// keeps one such pair per channel instead of a full vector clock across all
/// sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    pub local: u32,
    pub remote: u32,
}

impl Timestamp {
    pub const fn new(local: u32, remote: u32) -> Self {
        Self { local, remote }
    }

    /// The state of a freshly opened channel.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Returns a new timestamp with `local` bumped by exactly 1.
    #[inline]
    pub fn increment_local(self) -> Self {
        Self::new(self.local + 1, self.remote)
    }

    /// Returns a new timestamp with `remote` bumped by exactly 1.
    #[inline]
    pub fn increment_remote(self) -> Self {
        Self::new(self.local, self.remote + 1)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.local, self.remote)
    }
}
