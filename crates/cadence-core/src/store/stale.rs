//! Rate-limited reporting of references that no longer resolve.

use std::collections::HashSet;

use log::warn;

/// Remembers which stale ids were already reported so each is logged once.
#[derive(Debug, Default)]
pub struct StaleReferenceLog {
    seen: HashSet<String>,
}

impl StaleReferenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `id` as stale the first time it is reported. Returns whether this
    /// was the first report.
    pub fn report(&mut self, kind: &str, id: &str) -> bool {
        let first = self.seen.insert(format!("{kind}:{id}"));
        if first {
            warn!("Stale {kind} reference '{id}', reconciling");
        }
        first
    }

    /// Number of distinct stale references seen so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
