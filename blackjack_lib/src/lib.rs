//! Engine for a single player blackjack trainer: cards and the shoe, hand scoring, the round state machine,
//! the hit/stand basic strategy chart, and the counters grading player decisions against it.

pub mod accuracy;
pub mod card;
pub mod error;
pub mod hand;
pub mod round;
pub mod rules;
pub mod shoe;
pub mod strategy;

pub use accuracy::{
    AccuracyCounter, AccuracyStore, AccuracyTracker, AllTimeAccuracy, Decision, JsonFileStore,
    MemoryStore, StoreError,
};
pub use card::{standard_deck, Card, ParseCardError, Rank, Suit};
pub use error::BlackjackError;
pub use hand::{evaluate, Hand, HandKind, HandTotal};
pub use round::{settle_hands, Outcome, PlayerAction, Round, RoundState, Table};
pub use rules::{TableConfig, TableConfigBuilder};
pub use shoe::{PresetShuffle, RngShuffle, Shoe, ShuffleSource};
pub use strategy::{chart_entries, optimal_action, ChartEntry, Upcard};

pub mod prelude {
    pub use super::{
        AccuracyCounter, AccuracyTracker, AllTimeAccuracy, BlackjackError, Card, Decision, Hand,
        HandKind, Outcome, PlayerAction, Round, RoundState, Shoe, ShuffleSource, Table,
        TableConfig, Upcard,
    };
}
