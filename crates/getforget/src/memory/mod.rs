//! Memory entries, importance scoring, and probabilistic forgetting
//!
//! Defines the keyword store, the importance formula that turns age and
//! usage into a retention probability, and the background process that
//! applies it.

pub mod clock;
pub mod events;
pub mod forgetting;
pub mod importance;
pub mod random;
pub mod store;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use events::MemoryEvent;
pub use forgetting::{
    DEFAULT_FORGETTING_INTERVAL, Forgetter, ForgettingHandle, ForgettingReport, ForgettingState,
    ForgettingStats, ForgottenMemory,
};
pub use importance::{ExponentialDecay, ImportanceModel, calculate_importance, retention_probability};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use store::{MemoryStore, Recall, RecalledMemory};
pub use types::MemoryEntry;
