use blackjack_lib::{
    AccuracyCounter, Card, Decision, HandKind, Outcome, PlayerAction, Round, RoundState, Upcard,
};
use serde::Serialize;

/// The state of a session as the client sees it, serialised as the JSON body of every round response.
///
/// The dealer's hole card is always included in `dealer`, and `dealerTotal` is always the dealer's true total.
/// Clients are expected to show `dealerUpcard` in place of the total while `hideDealerSecond` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub dealer: Vec<Card>,
    pub player: Vec<Card>,
    pub hide_dealer_second: bool,
    pub player_total: Option<u8>,
    pub dealer_total: Option<u8>,
    pub dealer_upcard: Option<Upcard>,
    pub hand_kind: Option<HandKind>,
    pub state: Option<RoundState>,
    pub outcome: Option<Outcome>,
    pub round_over: bool,
    pub session_accuracy: AccuracyCounter,
    pub all_time_accuracy: AccuracyCounter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_move: Option<PlayerAction>,
}

impl Snapshot {
    /// Associated function to build a `Snapshot` of `round`, or of an empty table when there is no round yet.
    /// An empty table reports the round as over, a new round is the only thing to do.
    pub fn new(
        round: Option<&Round>,
        session_accuracy: AccuracyCounter,
        all_time_accuracy: AccuracyCounter,
    ) -> Snapshot {
        let mut snapshot = Snapshot {
            dealer: Vec::new(),
            player: Vec::new(),
            hide_dealer_second: false,
            player_total: None,
            dealer_total: None,
            dealer_upcard: None,
            hand_kind: None,
            state: None,
            outcome: None,
            round_over: true,
            session_accuracy,
            all_time_accuracy,
            last_decision: None,
            correct_move: None,
        };

        if let Some(round) = round {
            snapshot.dealer = round.dealer().cards().to_vec();
            snapshot.player = round.player().cards().to_vec();
            snapshot.hide_dealer_second = round.hide_dealer_second();
            snapshot.player_total = Some(round.player().value());
            snapshot.dealer_total = Some(round.dealer().value());
            snapshot.dealer_upcard = round.dealer_upcard().map(|c| Upcard::from_card(&c));
            snapshot.hand_kind = Some(round.player().kind());
            snapshot.state = Some(round.state());
            snapshot.outcome = round.outcome();
            snapshot.round_over = round.is_over();
        }

        snapshot
    }

    /// Attaches the grade of the decision that produced this snapshot.
    pub fn with_decision(mut self, decision: Option<Decision>) -> Snapshot {
        self.correct_move = decision.map(|d| d.optimal);
        self.last_decision = decision;
        self
    }
}
