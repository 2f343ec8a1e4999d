use std::collections::HashSet;

use outpost_core::sha256_hex;

/// Content hashes of installation scripts already run in this process.
#[derive(Debug, Default)]
pub struct InstallCache {
    digests: HashSet<String>,
}

impl InstallCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the script content was seen before, marking it as seen.
    pub fn seen(&mut self, script: &[u8]) -> bool {
        !self.digests.insert(sha256_hex(script))
    }

    /// Drops the mark for a script whose installation failed.
    pub fn forget(&mut self, script: &[u8]) {
        self.digests.remove(&sha256_hex(script));
    }

    /// Number of distinct scripts recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns true when nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
