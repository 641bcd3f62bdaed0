//! Integration tests for the forgetting process
//!
//! Statistical survival checks use a seeded random source so the outcome is
//! reproducible run to run.

use std::sync::Arc;
use std::time::Duration;

use getforget::memory::{Forgetter, ForgettingState, MemoryEvent, MemoryStore, SeededRandom};
use getforget::memory::events;
use getforget::testing::{ManualClock, SequenceRandom};

const CYCLES: usize = 1_000;

/// Store holding "alpha" (base 95, 50 uses) and "beta" (base 50, 1 use),
/// both created at the clock's current instant.
fn create_contrast_store() -> Arc<MemoryStore> {
    // base = 50 + r * 50, drawn once per created entry
    let store = MemoryStore::new()
        .with_clock(Arc::new(ManualClock::default()))
        .with_random(Arc::new(SequenceRandom::new(vec![0.9, 0.0])));
    let store = Arc::new(store);

    store.upsert("alpha", "The deploy key lives in the vault");
    store.upsert("beta", "Lunch was a sandwich");
    for _ in 1..50 {
        store.upsert("alpha", "The deploy key lives in the vault");
    }
    store
}

mod survival_tests {
    use super::*;

    #[test]
    fn test_important_entry_outlives_trivial_one() {
        let random = Arc::new(SeededRandom::new(42));
        let mut alpha_survived = 0;
        let mut beta_survived = 0;

        for _ in 0..CYCLES {
            let store = create_contrast_store();
            let alpha = store.lookup("alpha").unwrap();
            let beta = store.lookup("beta").unwrap();
            assert!((alpha.base_importance - 95.0).abs() < 1e-9);
            assert_eq!(alpha.uses(), 50);
            assert_eq!(beta.base_importance, 50.0);

            let forgetter = Forgetter::new(store.clone()).with_random(random.clone());
            forgetter.run_cycle();

            if store.lookup("alpha").is_some() {
                alpha_survived += 1;
            }
            if store.lookup("beta").is_some() {
                beta_survived += 1;
            }
        }

        // alpha scores 95·ln 51 ≈ 373, so its retention probability is 1
        assert_eq!(alpha_survived, CYCLES);
        // beta scores 50·ln 2 ≈ 34.7; 1000 draws land near 347
        assert!(
            (250..450).contains(&beta_survived),
            "beta survived {beta_survived} of {CYCLES} cycles"
        );
        assert!(alpha_survived - beta_survived > 500);
    }

    #[test]
    fn test_repeated_cycles_thin_out_weak_entries() {
        let store = Arc::new(
            MemoryStore::new()
                .with_clock(Arc::new(ManualClock::default()))
                .with_random(Arc::new(SequenceRandom::constant(0.0))),
        );
        for i in 0..100 {
            store.upsert(&format!("note{i:03}"), "weak memory");
        }

        let forgetter = Forgetter::new(store.clone()).with_random(Arc::new(SeededRandom::new(7)));
        for _ in 0..20 {
            forgetter.run_cycle();
        }

        // survival per cycle is ~0.35, so twenty cycles leave essentially nothing
        assert!(store.len() < 5);
        assert_eq!(forgetter.stats().cycles, 20);
        assert_eq!(forgetter.stats().total_forgotten as usize, 100 - store.len());
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_empty_store_cycle_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let forgetter = Forgetter::new(store.clone());

        let report = forgetter.run_cycle();
        assert_eq!(report.scanned, 0);
        assert!(report.forgotten.is_empty());
        assert_eq!(forgetter.state(), ForgettingState::Idle);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_background_task_forgets_and_stops() {
        let store = Arc::new(
            MemoryStore::new()
                .with_clock(Arc::new(ManualClock::default()))
                .with_random(Arc::new(SequenceRandom::constant(0.0))),
        );
        store.upsert("ephemeral", "gone soon");

        let tx = events::channel();
        let mut rx = tx.subscribe();
        // every draw exceeds the retention probability of ~0.35
        let forgetter = Arc::new(
            Forgetter::new(store.clone())
                .with_random(Arc::new(SequenceRandom::constant(0.99)))
                .with_events(tx),
        );

        let handle = forgetter.clone().start(Duration::from_millis(20));
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("a cycle should run")
            .unwrap();
        assert!(matches!(event, MemoryEvent::Forgotten { ref key, .. } if key == "ephemeral"));

        tokio::time::timeout(Duration::from_secs(5), handle.stop())
            .await
            .expect("stop should not hang");
        assert!(store.is_empty());
        assert!(forgetter.stats().cycles >= 1);
    }
}
