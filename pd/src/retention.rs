//! Bounded, insertion-ordered retention buffer
//!
//! Every append-only log in the coordinator (messages, system activities,
//! repository activity) keeps only the N most recent entries. Older entries
//! are evicted first.

use std::collections::VecDeque;

use serde::Serialize;

/// Retention cap for cross-pillar messages
pub const MESSAGE_RETENTION: usize = 50;

/// Retention cap for system activities
pub const ACTIVITY_RETENTION: usize = 100;

/// Retention cap for repository activity
pub const REPOSITORY_ACTIVITY_RETENTION: usize = 20;

/// FIFO buffer that never holds more than `capacity` entries
#[derive(Debug, Clone, Serialize)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// Create an empty log. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted one if the log was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }
}

impl<T: Clone> BoundedLog<T> {
    /// The last `n` entries, most recent last
    pub fn recent(&self, n: usize) -> Vec<T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// The last `n` entries matching `pred`, most recent last
    pub fn recent_matching<F>(&self, n: usize, pred: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut matched: Vec<T> = self.entries.iter().rev().filter(|e| pred(*e)).take(n).cloned().collect();
        matched.reverse();
        matched
    }

    /// All retained entries, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
