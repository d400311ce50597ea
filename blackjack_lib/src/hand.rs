use crate::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Whether a hand counts an ace as 11 in its best total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandKind {
    Hard,
    Soft,
}

impl Display for HandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandKind::Hard => write!(f, "HARD"),
            HandKind::Soft => write!(f, "SOFT"),
        }
    }
}

/// The evaluated totals of a set of cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandTotal {
    /// Total counting every ace as 1.
    pub hard: u8,
    /// Total counting one ace as 11, present only if the hand holds an ace and that total does not bust.
    pub soft: Option<u8>,
    /// The soft total when there is one, otherwise the hard total.
    pub best: u8,
    pub is_bust: bool,
    /// Exactly two cards totalling 21.
    pub is_blackjack: bool,
}

impl HandTotal {
    pub fn kind(&self) -> HandKind {
        if self.soft.is_some() {
            HandKind::Soft
        } else {
            HandKind::Hard
        }
    }
}

/// Evaluates `cards`. Counting a second ace as 11 always busts, so at most one ace is ever promoted.
pub fn evaluate(cards: &[Card]) -> HandTotal {
    let hard = cards
        .iter()
        .fold(0u8, |total, card| total.saturating_add(card.value()));
    let soft = if cards.iter().any(Card::is_ace) && hard <= 11 {
        Some(hard + 10)
    } else {
        None
    };
    let best = soft.unwrap_or(hard);

    HandTotal {
        hard,
        soft,
        best,
        is_bust: hard > 21,
        is_blackjack: cards.len() == 2 && best == 21,
    }
}

/// Struct for the cards held by one participant, the player or the dealer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand { cards: Vec::new() }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total(&self) -> HandTotal {
        evaluate(&self.cards)
    }

    /// The total to display, i.e. the best total.
    pub fn value(&self) -> u8 {
        self.total().best
    }

    pub fn kind(&self) -> HandKind {
        self.total().kind()
    }

    pub fn is_bust(&self) -> bool {
        self.total().is_bust
    }

    pub fn is_blackjack(&self) -> bool {
        self.total().is_blackjack
    }

    /// Formats the best total, showing both totals for a live soft hand e.g. `7/17`.
    pub fn formatted_value(&self) -> String {
        let total = self.total();
        match total.soft {
            Some(soft) => format!("{}/{}", total.hard, soft),
            None => format!("{}", total.hard),
        }
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        write!(f, "{} ({})", codes, self.formatted_value())
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Hand {
            cards: iter.into_iter().collect(),
        }
    }
}
