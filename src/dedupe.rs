//! Concurrent case-insensitive dedupers backing every emit-once and
//! visit-once guarantee in the crawler.

use dashmap::DashSet;

/// A set of lowercased keys with an atomic insert-or-report operation.
/// Exactly one caller for a given key ever sees `false` from `observe`.
#[derive(Debug, Default)]
pub struct SeenSet {
    set: DashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key. Returns `true` if it was already present.
    pub fn observe(&self, key: &str) -> bool {
        !self.set.insert(key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_observe_reports_duplicates() {
        let seen = SeenSet::new();
        assert!(!seen.observe("https://test.local/"));
        assert!(seen.observe("https://test.local/"));
        assert!(seen.observe("HTTPS://TEST.LOCAL/"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_exactly_one_winner_under_contention() {
        let seen = Arc::new(SeenSet::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let seen = Arc::clone(&seen);
            handles.push(std::thread::spawn(move || {
                let mut wins = 0usize;
                for i in 0..1000 {
                    if !seen.observe(&format!("https://test.local/{}", i)) {
                        wins += 1;
                    }
                }
                wins
            }));
        }
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1000);
        assert_eq!(seen.len(), 1000);
    }
}
