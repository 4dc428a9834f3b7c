use indexmap::IndexMap;
use tracing::warn;

use crate::classify::Classification;

/// Point-in-time view of the tracked counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub counters: IndexMap<String, u32>,
    pub max_count: u32,
    pub complete: bool,
}

/// Accumulates per-class evidence counts toward a shared cap.
///
/// Counters only move up, one increment per accepted classification, and
/// saturate at the cap. The background class is excluded from the tracked
/// set entirely, so background evidence can never drive completion.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    counters: IndexMap<String, u32>,
    background_label: String,
    max_count: u32,
}

impl ProgressTracker {
    pub fn new<I, S>(labels: I, background_label: String, max_count: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let counters = labels
            .into_iter()
            .map(Into::into)
            .filter(|label| *label != background_label)
            .map(|label| (label, 0))
            .collect();
        Self {
            counters,
            background_label,
            max_count,
        }
    }

    /// Folds one classification result into the counters and returns the
    /// resulting snapshot. `None` results, sub-threshold confidence, and the
    /// background class all leave the counters untouched.
    pub fn update(
        &mut self,
        result: Option<&Classification>,
        threshold: f32,
    ) -> ProgressSnapshot {
        match result {
            Some(c) if c.confidence >= threshold && c.label != self.background_label => {
                match self.counters.get_mut(&c.label) {
                    Some(counter) => *counter = counter.saturating_add(1).min(self.max_count),
                    None => warn!("Ignoring unknown class label {:?}", c.label),
                }
            }
            _ => {}
        }
        self.snapshot()
    }

    /// True once every tracked counter has reached the cap.
    pub fn is_complete(&self) -> bool {
        self.counters.values().all(|&count| count >= self.max_count)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            counters: self.counters.clone(),
            max_count: self.max_count,
            complete: self.is_complete(),
        }
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }
}
