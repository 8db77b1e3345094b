//! # Storage Budget
//!
//! Tracks the cumulative size of captured photos against a fixed ceiling.
//!
//! The check is taken before each capture, so a run may overshoot the ceiling
//! by at most one photo.

/// Default photo storage ceiling (2.5 GiB).
pub const DEFAULT_MAX_PHOTOS_BYTES: u64 = 2_684_354_560;

/// Byte allowance for captured artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageBudget {
    consumed: u64,
    ceiling: u64,
}

impl Default for StorageBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PHOTOS_BYTES)
    }
}

impl StorageBudget {
    /// Creates an empty budget with a fixed ceiling.
    #[must_use]
    pub fn new(ceiling: u64) -> Self {
        Self { consumed: 0, ceiling }
    }

    /// True while more captures are allowed.
    pub fn remaining(&self) -> bool {
        self.consumed < self.ceiling
    }

    /// Credits the size of one stored artifact.
    pub fn consume(&mut self, bytes: u64) {
        self.consumed = self.consumed.saturating_add(bytes);
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }
}
