//! Grading of player decisions against basic strategy, and the counters that accumulate the grades.
//!
//! Every session keeps its own counter, the all-time counter is shared by all sessions of a process and is
//! persisted through an injected `AccuracyStore` after every update.

use crate::hand::HandKind;
use crate::round::{PlayerAction, Round, RoundState};
use crate::strategy::{optimal_action, Upcard};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Number of correct decisions out of the total number of decisions made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyCounter {
    pub correct: u64,
    pub total: u64,
}

impl AccuracyCounter {
    pub fn new() -> AccuracyCounter {
        AccuracyCounter::default()
    }

    /// Counts one decision.
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Percentage of correct decisions, `None` before the first decision.
    pub fn percentage(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64 * 100.0)
        }
    }
}

impl Display for AccuracyCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.percentage() {
            Some(pct) => write!(f, "{}/{} ({:.1}%)", self.correct, self.total, pct),
            None => write!(f, "{}/{} (n/a)", self.correct, self.total),
        }
    }
}

/// A single graded decision, i.e. the situation the player faced, what they did, and what the chart says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub hand_kind: HandKind,
    pub player_total: u8,
    pub dealer_upcard: Upcard,
    pub action: PlayerAction,
    pub optimal: PlayerAction,
}

impl Decision {
    /// Grades `action` against the state of `round` before the action is applied.
    /// Returns `None` unless the round is waiting on the player, there is no decision to grade otherwise.
    pub fn judge(round: &Round, action: PlayerAction) -> Option<Decision> {
        if round.state() != RoundState::PlayerTurn {
            return None;
        }
        let total = round.player().total();
        let dealer_upcard = Upcard::from_card(&round.dealer_upcard()?);
        Some(Decision {
            hand_kind: total.kind(),
            player_total: total.best,
            dealer_upcard,
            action,
            optimal: optimal_action(total.kind(), total.best, dealer_upcard),
        })
    }

    pub fn is_correct(&self) -> bool {
        self.action == self.optimal
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("accuracy store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("accuracy store holds invalid data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for the persistence behind the all-time counter.
pub trait AccuracyStore: Send {
    fn load(&mut self) -> Result<AccuracyCounter, StoreError>;
    fn save(&mut self, counter: &AccuracyCounter) -> Result<(), StoreError>;
}

/// A store that keeps the counter in memory only, nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counter: AccuracyCounter,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_counter(counter: AccuracyCounter) -> MemoryStore {
        MemoryStore { counter }
    }
}

impl AccuracyStore for MemoryStore {
    fn load(&mut self) -> Result<AccuracyCounter, StoreError> {
        Ok(self.counter)
    }

    fn save(&mut self, counter: &AccuracyCounter) -> Result<(), StoreError> {
        self.counter = *counter;
        Ok(())
    }
}

/// A store that keeps the counter as a small JSON document on disk, e.g. `{"correct":3,"total":4}`.
/// A missing file loads as a zeroed counter. Saves go through a temporary file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> JsonFileStore {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccuracyStore for JsonFileStore {
    fn load(&mut self) -> Result<AccuracyCounter, StoreError> {
        if !self.path.exists() {
            debug!("no accuracy file at {}, starting from zero", self.path.display());
            return Ok(AccuracyCounter::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&mut self, counter: &AccuracyCounter) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(counter)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

struct AllTimeInner {
    counter: AccuracyCounter,
    store: Box<dyn AccuracyStore>,
}

/// The process wide all-time counter. A single lock guards both the counter and its store, so every update
/// is an increment followed by a save with no other update in between.
pub struct AllTimeAccuracy {
    inner: Mutex<AllTimeInner>,
}

impl AllTimeAccuracy {
    /// Loads the counter from `store`.
    pub fn load(mut store: Box<dyn AccuracyStore>) -> Result<AllTimeAccuracy, StoreError> {
        let counter = store.load()?;
        Ok(AllTimeAccuracy {
            inner: Mutex::new(AllTimeInner { counter, store }),
        })
    }

    /// A zeroed counter backed by a `MemoryStore`.
    pub fn in_memory() -> AllTimeAccuracy {
        AllTimeAccuracy {
            inner: Mutex::new(AllTimeInner {
                counter: AccuracyCounter::default(),
                store: Box::new(MemoryStore::new()),
            }),
        }
    }

    pub fn get(&self) -> AccuracyCounter {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counter
    }

    /// Counts one decision and persists the result. A failed save is logged, the in-memory count stands.
    pub fn record(&self, correct: bool) -> AccuracyCounter {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.counter.record(correct);
        let counter = inner.counter;
        if let Err(e) = inner.store.save(&counter) {
            error!("failed to persist all-time accuracy {}: {}", counter, e);
        }
        counter
    }
}

/// Struct that observes the decisions of one session and feeds both the session and the all-time counters.
pub struct AccuracyTracker {
    session: AccuracyCounter,
    all_time: Arc<AllTimeAccuracy>,
}

impl AccuracyTracker {
    pub fn new(all_time: Arc<AllTimeAccuracy>) -> AccuracyTracker {
        AccuracyTracker {
            session: AccuracyCounter::default(),
            all_time,
        }
    }

    pub fn record(&mut self, decision: &Decision) {
        let correct = decision.is_correct();
        self.session.record(correct);
        let all_time = self.all_time.record(correct);
        debug!(
            "{} {} vs {}: {} (chart says {}), session {}, all time {}",
            decision.hand_kind,
            decision.player_total,
            decision.dealer_upcard,
            decision.action,
            decision.optimal,
            self.session,
            all_time
        );
    }

    pub fn session(&self) -> AccuracyCounter {
        self.session
    }

    pub fn all_time(&self) -> AccuracyCounter {
        self.all_time.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::TableConfig;
    use crate::round::Table;
    use crate::shoe::{RngShuffle, Shoe};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn table(order: &[&str]) -> Table {
        let cards = order.iter().map(|c| c.parse().unwrap()).collect();
        let config = TableConfig::new().reshuffle_threshold(None).build().unwrap();
        let shoe = Shoe::stacked(cards, 6, None, Box::new(RngShuffle::seeded(3)));
        Table::with_shoe(config, shoe)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "blackjack_lib_{}_{}_{}.json",
            name,
            std::process::id(),
            rand::random::<u32>()
        ))
    }

    /// Counts saves, and fails every one of them when `fail` is set.
    struct CountingStore {
        saves: Arc<AtomicU64>,
        fail: bool,
    }

    impl AccuracyStore for CountingStore {
        fn load(&mut self) -> Result<AccuracyCounter, StoreError> {
            Ok(AccuracyCounter { correct: 7, total: 10 })
        }

        fn save(&mut self, _counter: &AccuracyCounter) -> Result<(), StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn counter_records() {
        let mut counter = AccuracyCounter::new();
        assert_eq!(counter.percentage(), None);
        counter.record(true);
        counter.record(false);
        counter.record(true);
        counter.record(true);
        assert_eq!(counter, AccuracyCounter { correct: 3, total: 4 });
        assert_eq!(counter.percentage(), Some(75.0));
        assert_eq!(counter.to_string(), "3/4 (75.0%)");
    }

    #[test]
    fn judge_hard_16_against_ten() {
        let mut table = table(&["10D", "KS", "6C", "7H"]);
        let round = table.new_round().unwrap();

        let stand = Decision::judge(round, PlayerAction::Stand).unwrap();
        assert_eq!(stand.hand_kind, HandKind::Hard);
        assert_eq!(stand.player_total, 16);
        assert_eq!(stand.dealer_upcard, Upcard::Ten);
        assert_eq!(stand.optimal, PlayerAction::Hit);
        assert!(!stand.is_correct());

        let hit = Decision::judge(round, PlayerAction::Hit).unwrap();
        assert!(hit.is_correct());
    }

    #[test]
    fn judge_soft_hand() {
        let mut table = table(&["AD", "9S", "7C", "7H"]);
        let round = table.new_round().unwrap();
        let decision = Decision::judge(round, PlayerAction::Stand).unwrap();
        assert_eq!(decision.hand_kind, HandKind::Soft);
        assert_eq!(decision.player_total, 18);
        assert_eq!(decision.optimal, PlayerAction::Hit);
    }

    #[test]
    fn nothing_to_judge_once_settled() {
        let mut table = table(&["AD", "9S", "KC", "7H"]);
        let round = table.new_round().unwrap();
        assert!(round.is_over());
        assert_eq!(Decision::judge(round, PlayerAction::Hit), None);
    }

    #[test]
    fn tracker_feeds_both_counters() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut first = AccuracyTracker::new(Arc::clone(&all_time));
        let mut second = AccuracyTracker::new(Arc::clone(&all_time));

        let mut table = table(&["10D", "KS", "6C", "7H"]);
        let round = table.new_round().unwrap();
        let right = Decision::judge(round, PlayerAction::Hit).unwrap();
        let wrong = Decision::judge(round, PlayerAction::Stand).unwrap();

        first.record(&right);
        first.record(&wrong);
        second.record(&right);

        assert_eq!(first.session(), AccuracyCounter { correct: 1, total: 2 });
        assert_eq!(second.session(), AccuracyCounter { correct: 1, total: 1 });
        assert_eq!(all_time.get(), AccuracyCounter { correct: 2, total: 3 });
        assert_eq!(first.all_time(), second.all_time());
    }

    #[test]
    fn all_time_saves_every_update() {
        let saves = Arc::new(AtomicU64::new(0));
        let store = CountingStore {
            saves: Arc::clone(&saves),
            fail: false,
        };
        let all_time = AllTimeAccuracy::load(Box::new(store)).unwrap();
        assert_eq!(all_time.get(), AccuracyCounter { correct: 7, total: 10 });
        all_time.record(true);
        all_time.record(false);
        assert_eq!(saves.load(Ordering::SeqCst), 2);
        assert_eq!(all_time.get(), AccuracyCounter { correct: 8, total: 12 });
    }

    #[test]
    fn failed_save_keeps_the_count() {
        let saves = Arc::new(AtomicU64::new(0));
        let store = CountingStore {
            saves: Arc::clone(&saves),
            fail: true,
        };
        let all_time = AllTimeAccuracy::load(Box::new(store)).unwrap();
        let counter = all_time.record(true);
        assert_eq!(counter, AccuracyCounter { correct: 8, total: 11 });
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let all_time = Arc::clone(&all_time);
                std::thread::spawn(move || {
                    for j in 0..250 {
                        all_time.record((i + j) % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let counter = all_time.get();
        assert_eq!(counter.total, 2000);
        assert_eq!(counter.correct, 1000);
    }

    #[test]
    fn json_file_store_persists_between_loads() {
        let path = temp_path("persist");
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.load().unwrap(), AccuracyCounter::default());

        let all_time = AllTimeAccuracy::load(Box::new(store.clone())).unwrap();
        all_time.record(true);
        all_time.record(false);
        all_time.record(true);

        assert_eq!(store.load().unwrap(), AccuracyCounter { correct: 2, total: 3 });
        let reloaded = AllTimeAccuracy::load(Box::new(JsonFileStore::new(&path))).unwrap();
        assert_eq!(reloaded.get(), AccuracyCounter { correct: 2, total: 3 });

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn json_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        fs::remove_file(&path).unwrap();
    }
}
