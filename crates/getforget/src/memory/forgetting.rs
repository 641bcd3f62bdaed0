//! Probabilistic forgetting for the memory store
//!
//! A forgetting cycle visits every entry under exclusive access, scores it,
//! and draws `r` uniformly from `[0, 1)`. The entry is forgotten when
//! `r > importance / 100`. High-importance entries are likely, never
//! certain, to survive.
//!
//! The background task runs one cycle per tick (`Idle → Scanning → Idle`)
//! until its [`ForgettingHandle`] is stopped or dropped.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::memory::events::{self, MemoryEvent};
use crate::memory::importance::{ExponentialDecay, ImportanceModel, retention_probability};
use crate::memory::random::{RandomSource, ThreadRandom};
use crate::memory::store::MemoryStore;
use crate::memory::types::MemoryEntry;

/// Reference interval between forgetting cycles
pub const DEFAULT_FORGETTING_INTERVAL: Duration = Duration::from_secs(10);

/// Whether a cycle is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgettingState {
    Idle,
    Scanning,
}

/// An entry removed by a forgetting cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForgottenMemory {
    pub key: String,
    /// Importance at the moment it was forgotten
    pub importance: f64,
    pub content: String,
}

/// Outcome of one forgetting cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForgettingReport {
    /// Entries visited
    pub scanned: usize,
    /// Entries removed, in key order
    pub forgotten: Vec<ForgottenMemory>,
    /// Entries kept because scoring failed
    pub skipped: usize,
}

impl ForgettingReport {
    pub fn forgotten_keys(&self) -> Vec<&str> {
        self.forgotten.iter().map(|f| f.key.as_str()).collect()
    }
}

/// Lifetime counters of the forgetting process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgettingStats {
    pub state: ForgettingState,
    pub cycles: u64,
    pub total_forgotten: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

enum Decision {
    Keep,
    Forget(f64),
    Skip,
}

/// Applies the forgetting policy to a store
pub struct Forgetter {
    store: Arc<MemoryStore>,
    model: Arc<dyn ImportanceModel>,
    random: Arc<dyn RandomSource>,
    events: Option<broadcast::Sender<MemoryEvent>>,
    /// Cycles currently in progress
    scanning: AtomicUsize,
    cycles: AtomicU64,
    total_forgotten: AtomicU64,
    last_cycle_at: Mutex<Option<DateTime<Utc>>>,
}

impl Forgetter {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            model: Arc::new(ExponentialDecay::default()),
            random: Arc::new(ThreadRandom),
            events: None,
            scanning: AtomicUsize::new(0),
            cycles: AtomicU64::new(0),
            total_forgotten: AtomicU64::new(0),
            last_cycle_at: Mutex::new(None),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ImportanceModel>) -> Self {
        self.model = model;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<MemoryEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> ForgettingState {
        if self.scanning.load(Ordering::SeqCst) > 0 {
            ForgettingState::Scanning
        } else {
            ForgettingState::Idle
        }
    }

    pub fn stats(&self) -> ForgettingStats {
        ForgettingStats {
            state: self.state(),
            cycles: self.cycles.load(Ordering::SeqCst),
            total_forgotten: self.total_forgotten.load(Ordering::SeqCst),
            last_cycle_at: *self.last_cycle_at.lock(),
        }
    }

    /// Run one cycle at the store clock's current instant
    pub fn run_cycle(&self) -> ForgettingReport {
        self.run_cycle_at(self.store.now())
    }

    /// Run one cycle as if the current instant were `now`
    pub fn run_cycle_at(&self, now: DateTime<Utc>) -> ForgettingReport {
        self.scanning.fetch_add(1, Ordering::SeqCst);

        let mut report = ForgettingReport::default();
        let removed = self.store.sweep(|key, entry| {
            report.scanned += 1;
            match self.decide(key, entry, now) {
                Decision::Keep => true,
                Decision::Skip => {
                    report.skipped += 1;
                    true
                }
                Decision::Forget(importance) => {
                    report.forgotten.push(ForgottenMemory {
                        key: key.to_string(),
                        importance,
                        content: String::new(),
                    });
                    false
                }
            }
        });

        for (forgotten, (_, entry)) in report.forgotten.iter_mut().zip(removed) {
            forgotten.content = entry.content;
        }

        self.scanning.fetch_sub(1, Ordering::SeqCst);
        self.cycles.fetch_add(1, Ordering::SeqCst);
        self.total_forgotten
            .fetch_add(report.forgotten.len() as u64, Ordering::SeqCst);
        *self.last_cycle_at.lock() = Some(now);

        if report.forgotten.is_empty() {
            debug!(scanned = report.scanned, "Forgetting cycle kept every memory");
        } else {
            info!(
                scanned = report.scanned,
                forgotten = report.forgotten.len(),
                "Forgetting cycle faded memories: {:?}",
                report.forgotten_keys()
            );
        }

        self.publish(&report, now);
        report
    }

    fn decide(&self, key: &str, entry: &MemoryEntry, now: DateTime<Utc>) -> Decision {
        let scored = catch_unwind(AssertUnwindSafe(|| self.model.importance(entry, now)));
        let importance = match scored {
            Ok(importance) => importance,
            Err(_) => {
                warn!("Importance scoring panicked for '{key}', keeping it");
                return Decision::Skip;
            }
        };

        let Some(probability) = retention_probability(importance) else {
            warn!("Importance for '{key}' is not finite ({importance}), keeping it");
            return Decision::Skip;
        };

        if self.random.next_float() > probability {
            Decision::Forget(importance)
        } else {
            Decision::Keep
        }
    }

    fn publish(&self, report: &ForgettingReport, now: DateTime<Utc>) {
        let Some(tx) = &self.events else {
            return;
        };
        for forgotten in &report.forgotten {
            events::publish(
                tx,
                MemoryEvent::Forgotten {
                    key: forgotten.key.clone(),
                    importance: forgotten.importance,
                    content_preview: events::preview(&forgotten.content),
                },
            );
        }
        events::publish(
            tx,
            MemoryEvent::CycleCompleted {
                scanned: report.scanned,
                forgotten: report.forgotten.len(),
                skipped: report.skipped,
                timestamp: now,
            },
        );
    }

    /// Spawn the periodic forgetting task. The first cycle runs one full
    /// `period` after start.
    pub fn start(self: Arc<Self>, period: Duration) -> ForgettingHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Forgetting process started (interval={}ms)", period.as_millis());

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.run_cycle();
                    }
                }
            }

            info!("Forgetting process stopped");
        });

        ForgettingHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to the background forgetting task.
///
/// Dropping the handle cancels the task; `stop` also waits for it to finish.
pub struct ForgettingHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ForgettingHandle {
    /// Cancel the timer and wait for the task to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Forgetting task ended abnormally: {e}");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ForgettingHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
