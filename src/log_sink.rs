//! Bounded diagnostic log shown next to the viewer.

use std::collections::VecDeque;

const LOG_TARGET: &str = "skelview";

/// Ring buffer of timestamped diagnostic lines.
///
/// Every entry is also forwarded to the `log` facade, so hosts that install a
/// logger see the full history while the UI only keeps the recent tail.
#[derive(Clone, Debug)]
pub struct LogSink {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::with_capacity(10)
    }
}

impl LogSink {
    /// Create a sink keeping at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an info-level entry.
    pub fn push(&mut self, clock_label: &str, message: &str) {
        self.record(log::Level::Info, clock_label, message);
    }

    /// Record an entry at the given level, evicting the oldest when full.
    pub fn record(&mut self, level: log::Level, clock_label: &str, message: &str) {
        log::log!(target: LOG_TARGET, level, "{message}");

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(format!("{clock_label}: {message}"));
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    /// Copy of the entries, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
