//! Importance scoring for memory retention
//!
//! Importance combines the entry's intrinsic salience with an exponential
//! recency decay and a logarithmic usage boost:
//!
//! `importance = base × exp(-age_hours / τ) × ln(use_count + 1)`
//!
//! Retention probability is `importance / 100` clamped to `[0, 1]`.

use chrono::{DateTime, Utc};

use crate::memory::types::MemoryEntry;

/// Reference decay constant: importance falls by a factor of `e` per day.
pub const DEFAULT_DECAY_HOURS: f64 = 24.0;

/// Scale that maps importance onto a retention probability.
pub const IMPORTANCE_SCALE: f64 = 100.0;

/// Scores an entry at a given instant.
///
/// Implementations must be pure: the same entry and instant always give
/// the same score.
pub trait ImportanceModel: Send + Sync {
    fn importance(&self, entry: &MemoryEntry, now: DateTime<Utc>) -> f64;

    /// Decay time constant in hours, for models that have one
    fn decay_hours(&self) -> Option<f64> {
        None
    }
}

/// Exponential recency decay with a logarithmic usage boost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    /// Decay time constant τ in hours
    pub decay_hours: f64,
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        Self {
            decay_hours: DEFAULT_DECAY_HOURS,
        }
    }
}

impl ExponentialDecay {
    pub fn new(decay_hours: f64) -> Self {
        Self { decay_hours }
    }
}

impl ImportanceModel for ExponentialDecay {
    fn importance(&self, entry: &MemoryEntry, now: DateTime<Utc>) -> f64 {
        calculate_importance(entry, now, self.decay_hours)
    }

    fn decay_hours(&self) -> Option<f64> {
        Some(self.decay_hours)
    }
}

/// Calculate the importance of an entry at `now`.
///
/// Age is clamped to zero so a timestamp from the future scores as brand new.
pub fn calculate_importance(entry: &MemoryEntry, now: DateTime<Utc>, decay_hours: f64) -> f64 {
    let age_hours = entry.age_hours(now);
    let decay_factor = (-age_hours / decay_hours).exp();
    let usage_factor = (f64::from(entry.uses()) + 1.0).ln();

    entry.base_importance * decay_factor * usage_factor
}

/// Map an importance score onto the probability that the entry survives a
/// forgetting cycle. Non-finite scores yield `None`.
pub fn retention_probability(importance: f64) -> Option<f64> {
    if !importance.is_finite() {
        return None;
    }
    Some((importance / IMPORTANCE_SCALE).clamp(0.0, 1.0))
}
