use crate::snapshot::Snapshot;
use blackjack_lib::{
    AccuracyCounter, AccuracyTracker, AllTimeAccuracy, BlackjackError, Decision, PlayerAction,
    ShuffleSource, Table, TableConfig,
};
use log::debug;
use std::sync::Arc;

/// Struct for one player's session, the table they play at (shoe and current round) and the accuracy of
/// their decisions. The all-time accuracy is shared with every other session of the process.
pub struct BlackjackSession {
    table: Table,
    tracker: AccuracyTracker,
}

impl BlackjackSession {
    /// Associated function to create a new `BlackjackSession`, no round is dealt until `start` or `new_round`.
    pub fn new(
        config: TableConfig,
        source: Box<dyn ShuffleSource>,
        all_time: Arc<AllTimeAccuracy>,
    ) -> BlackjackSession {
        BlackjackSession::with_table(Table::new(config, source), all_time)
    }

    pub fn with_table(table: Table, all_time: Arc<AllTimeAccuracy>) -> BlackjackSession {
        BlackjackSession {
            table,
            tracker: AccuracyTracker::new(all_time),
        }
    }

    /// Method for resuming the session, deals a round only if none has been dealt yet.
    pub fn start(&mut self) -> Result<Snapshot, BlackjackError> {
        if self.table.round().is_none() {
            self.table.new_round()?;
        }
        Ok(self.snapshot())
    }

    /// Method for dealing a new round, any unfinished round is abandoned.
    pub fn new_round(&mut self) -> Result<Snapshot, BlackjackError> {
        self.table.new_round()?;
        Ok(self.snapshot())
    }

    /// Method for applying a hit or stand given as a token, i.e. `H`, `S`, `hit` or `stand`.
    /// The decision is graded against the round as it was before the action, and recorded only once
    /// the action has been applied.
    pub fn action(&mut self, token: &str) -> Result<Snapshot, BlackjackError> {
        let action: PlayerAction = token.parse()?;
        let decision = self
            .table
            .round()
            .and_then(|round| Decision::judge(round, action));

        self.table.act(action)?;

        if let Some(decision) = &decision {
            self.tracker.record(decision);
        } else {
            debug!("{} applied without a decision to grade", action);
        }
        Ok(self.snapshot().with_decision(decision))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.table.round(),
            self.tracker.session(),
            self.tracker.all_time(),
        )
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn session_accuracy(&self) -> AccuracyCounter {
        self.tracker.session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::{Outcome, RngShuffle, RoundState, Shoe};

    fn session(order: &[&str], all_time: Arc<AllTimeAccuracy>) -> BlackjackSession {
        let cards = order.iter().map(|c| c.parse().unwrap()).collect();
        let config = TableConfig::new().reshuffle_threshold(None).build().unwrap();
        let shoe = Shoe::stacked(cards, 6, None, Box::new(RngShuffle::seeded(5)));
        BlackjackSession::with_table(Table::with_shoe(config, shoe), all_time)
    }

    #[test]
    fn start_deals_once() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["10D", "9S", "7C", "6H", "5C"], all_time);
        let first = session.start().unwrap();
        assert_eq!(first.state, Some(RoundState::PlayerTurn));
        let again = session.start().unwrap();
        assert_eq!(first, again);
        assert_eq!(session.table().rounds_dealt(), 1);
    }

    #[test]
    fn stand_on_17_against_9() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["10D", "9S", "7C", "6H", "5C"], Arc::clone(&all_time));
        session.start().unwrap();

        let snapshot = session.action("S").unwrap();
        assert_eq!(snapshot.outcome, Some(Outcome::Lose));
        assert_eq!(snapshot.dealer_total, Some(20));
        assert!(snapshot.round_over);
        assert!(!snapshot.hide_dealer_second);
        assert_eq!(snapshot.correct_move, Some(PlayerAction::Stand));
        assert!(snapshot.last_decision.unwrap().is_correct());
        assert_eq!(snapshot.session_accuracy, AccuracyCounter { correct: 1, total: 1 });
        assert_eq!(snapshot.all_time_accuracy, AccuracyCounter { correct: 1, total: 1 });
    }

    #[test]
    fn wrong_move_counts_against_accuracy() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["10D", "10S", "6C", "7H", "2C", "9D"], all_time);
        session.start().unwrap();
        let snapshot = session.action("stand").unwrap();
        assert_eq!(snapshot.correct_move, Some(PlayerAction::Hit));
        assert_eq!(snapshot.session_accuracy, AccuracyCounter { correct: 0, total: 1 });
    }

    #[test]
    fn invalid_token_changes_nothing() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["10D", "9S", "7C", "6H", "5C"], Arc::clone(&all_time));
        let before = session.start().unwrap();
        assert_eq!(
            session.action("double").unwrap_err(),
            BlackjackError::InvalidAction("double".to_string())
        );
        assert_eq!(session.snapshot(), before);
        assert_eq!(all_time.get(), AccuracyCounter::default());
    }

    #[test]
    fn actions_after_settlement_are_not_graded() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["AS", "10C", "KD", "9H"], Arc::clone(&all_time));
        let snapshot = session.start().unwrap();
        assert_eq!(snapshot.outcome, Some(Outcome::Blackjack));

        let err = session.action("H").unwrap_err();
        assert!(matches!(err, BlackjackError::IllegalState { .. }));
        assert_eq!(session.session_accuracy(), AccuracyCounter::default());
        assert_eq!(all_time.get(), AccuracyCounter::default());
    }

    #[test]
    fn failed_hit_is_not_graded() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut session = session(&["10D", "9S", "2C", "6H"], all_time);
        let before = session.start().unwrap();
        assert_eq!(session.action("H").unwrap_err(), BlackjackError::EmptyShoe);
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.session_accuracy(), AccuracyCounter::default());
    }

    #[test]
    fn sessions_share_the_all_time_counter() {
        let all_time = Arc::new(AllTimeAccuracy::in_memory());
        let mut a = session(&["10D", "9S", "7C", "6H", "5C"], Arc::clone(&all_time));
        let mut b = session(&["10D", "10S", "6C", "7H", "2C", "9D"], Arc::clone(&all_time));
        a.start().unwrap();
        b.start().unwrap();
        a.action("S").unwrap();
        let snapshot = b.action("S").unwrap();
        assert_eq!(snapshot.session_accuracy, AccuracyCounter { correct: 0, total: 1 });
        assert_eq!(snapshot.all_time_accuracy, AccuracyCounter { correct: 1, total: 2 });
        assert_eq!(a.session_accuracy(), AccuracyCounter { correct: 1, total: 1 });
    }
}
