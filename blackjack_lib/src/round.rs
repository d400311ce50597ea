//! The round state machine. A `Table` owns the shoe for its whole lifetime and at most one `Round` at a time,
//! every round moves through `DEALING -> PLAYER_TURN -> DEALER_TURN -> SETTLED`, with the dealing and dealer
//! states being transient (they are never observed between two calls).

use crate::card::Card;
use crate::error::BlackjackError;
use crate::hand::Hand;
use crate::rules::TableConfig;
use crate::shoe::{ShuffleSource, Shoe};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    #[serde(rename = "H")]
    Hit,
    #[serde(rename = "S")]
    Stand,
}

impl PlayerAction {
    /// The one letter wire code, `H` or `S`.
    pub fn code(self) -> &'static str {
        match self {
            PlayerAction::Hit => "H",
            PlayerAction::Stand => "S",
        }
    }
}

impl Display for PlayerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerAction::Hit => write!(f, "hit"),
            PlayerAction::Stand => write!(f, "stand"),
        }
    }
}

impl FromStr for PlayerAction {
    type Err = BlackjackError;

    /// Accepts `H`/`S` and `hit`/`stand`, case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hit" => Ok(PlayerAction::Hit),
            "s" | "stand" => Ok(PlayerAction::Stand),
            _ => Err(BlackjackError::InvalidAction(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Settled,
}

impl Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundState::Dealing => "DEALING",
            RoundState::PlayerTurn => "PLAYER_TURN",
            RoundState::DealerTurn => "DEALER_TURN",
            RoundState::Settled => "SETTLED",
        };
        write!(f, "{}", name)
    }
}

/// The result of a settled round from the player's point of view. `Blackjack` is a win with a natural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Push,
    Blackjack,
}

impl Outcome {
    pub fn is_player_win(self) -> bool {
        matches!(self, Outcome::Win | Outcome::Blackjack)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
            Outcome::Push => "push",
            Outcome::Blackjack => "blackjack",
        };
        write!(f, "{}", name)
    }
}

/// Decides the outcome of two finished hands.
pub fn settle_hands(player: &Hand, dealer: &Hand) -> Outcome {
    let (p, d) = (player.total(), dealer.total());
    if p.is_bust {
        Outcome::Lose
    } else if p.is_blackjack && !d.is_blackjack {
        Outcome::Blackjack
    } else if d.is_blackjack && !p.is_blackjack {
        Outcome::Lose
    } else if d.is_bust || p.best > d.best {
        Outcome::Win
    } else if p.best < d.best {
        Outcome::Lose
    } else {
        Outcome::Push
    }
}

/// A single round of play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    player: Hand,
    dealer: Hand,
    state: RoundState,
    hide_dealer_second: bool,
    outcome: Option<Outcome>,
}

impl Round {
    pub fn player(&self) -> &Hand {
        &self.player
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// True while the dealer's second card is face down.
    pub fn hide_dealer_second(&self) -> bool {
        self.hide_dealer_second
    }

    /// `None` until the round is settled.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.state == RoundState::Settled
    }

    /// The dealer's face up card.
    pub fn dealer_upcard(&self) -> Option<Card> {
        self.dealer.cards().first().copied()
    }

    /// Deals a fresh round from `shoe`: player, dealer, player, dealer, the last card face down.
    /// Naturals are resolved straight away, so the returned round is either waiting on the player or settled.
    fn deal(shoe: &mut Shoe, config: &TableConfig) -> Result<Round, BlackjackError> {
        if shoe.reshuffle_if_needed() {
            info!("reshuffled the shoe before dealing ({} cards)", shoe.remaining());
        }

        let mut round = Round {
            player: Hand::new(),
            dealer: Hand::new(),
            state: RoundState::Dealing,
            hide_dealer_second: true,
            outcome: None,
        };
        round.player.add_card(shoe.draw()?);
        round.dealer.add_card(shoe.draw()?);
        round.player.add_card(shoe.draw()?);
        round.dealer.add_card(shoe.draw()?);
        debug!(
            "dealt player {} vs dealer upcard {:?}",
            round.player,
            round.dealer_upcard().map(|c| c.to_string())
        );

        if round.player.is_blackjack() {
            // Only the hole card is checked, a natural never makes the dealer draw.
            round.state = RoundState::DealerTurn;
            round.settle();
        } else if config.dealer_peeks && round.dealer.is_blackjack() {
            round.settle();
        } else {
            round.state = RoundState::PlayerTurn;
        }

        Ok(round)
    }

    /// Applies a player decision. Only called in `PLAYER_TURN`.
    fn apply(
        &mut self,
        action: PlayerAction,
        shoe: &mut Shoe,
        config: &TableConfig,
    ) -> Result<(), BlackjackError> {
        match action {
            PlayerAction::Hit => {
                let card = shoe.draw()?;
                self.player.add_card(card);
                debug!("player hits, draws {}, now {}", card, self.player);
                let total = self.player.total();
                if total.is_bust {
                    self.settle();
                } else if total.best == 21 {
                    self.play_dealer(shoe, config)?;
                }
            }
            PlayerAction::Stand => self.play_dealer(shoe, config)?,
        }
        Ok(())
    }

    /// Reveals the hole card and draws for the dealer until the drawing rule says stop, then settles.
    fn play_dealer(&mut self, shoe: &mut Shoe, config: &TableConfig) -> Result<(), BlackjackError> {
        self.state = RoundState::DealerTurn;
        self.hide_dealer_second = false;
        while config.dealer_should_hit(&self.dealer.total()) {
            let card = shoe.draw()?;
            self.dealer.add_card(card);
            debug!("dealer draws {}, now {}", card, self.dealer);
        }
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        let outcome = settle_hands(&self.player, &self.dealer);
        self.hide_dealer_second = false;
        self.outcome = Some(outcome);
        self.state = RoundState::Settled;
        info!(
            "round settled: {}, player {} vs dealer {}",
            outcome, self.player, self.dealer
        );
    }
}

/// Struct for a blackjack table, the state machine driving rounds for a single player.
/// Every public operation either applies completely or fails without changing the round or the shoe.
#[derive(Debug)]
pub struct Table {
    config: TableConfig,
    shoe: Shoe,
    round: Option<Round>,
    rounds_dealt: u64,
}

impl Table {
    /// Associated function to create a new `Table` with a freshly shuffled shoe drawn from `source`.
    pub fn new(config: TableConfig, source: Box<dyn ShuffleSource>) -> Table {
        let shoe = Shoe::new(config.num_decks, config.reshuffle_threshold, source);
        Table::with_shoe(config, shoe)
    }

    /// Associated function to create a `Table` around an existing shoe.
    pub fn with_shoe(config: TableConfig, shoe: Shoe) -> Table {
        Table {
            config,
            shoe,
            round: None,
            rounds_dealt: 0,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    /// The current round, `None` before the first deal.
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn rounds_dealt(&self) -> u64 {
        self.rounds_dealt
    }

    /// Deals a new round, superseding the current one whatever its state.
    pub fn new_round(&mut self) -> Result<&Round, BlackjackError> {
        let checkpoint = self.shoe.checkpoint();
        match Round::deal(&mut self.shoe, &self.config) {
            Ok(round) => {
                self.rounds_dealt += 1;
                let round: &Round = self.round.insert(round);
                Ok(round)
            }
            Err(e) => {
                self.shoe.restore(checkpoint);
                Err(e)
            }
        }
    }

    /// Applies a hit or a stand to the current round. Legal only while the round is waiting on the player.
    pub fn act(&mut self, action: PlayerAction) -> Result<&Round, BlackjackError> {
        let mut next = match &self.round {
            Some(round) if round.state == RoundState::PlayerTurn => round.clone(),
            other => {
                return Err(BlackjackError::IllegalState {
                    action,
                    state: other.as_ref().map(Round::state),
                })
            }
        };

        let checkpoint = self.shoe.checkpoint();
        if let Err(e) = next.apply(action, &mut self.shoe, &self.config) {
            self.shoe.restore(checkpoint);
            return Err(e);
        }
        let round: &Round = self.round.insert(next);
        Ok(round)
    }
}
