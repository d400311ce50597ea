//! Basic strategy for a hit/stand only game (no doubling, splitting or surrender; a textbook double is played
//! as a hit). The chart is a pair of static tables indexed by player total and dealer upcard.

use crate::card::{Card, Rank};
use crate::hand::HandKind;
use crate::round::PlayerAction;
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// The dealer's upcard as far as strategy is concerned, all ten valued cards are the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Upcard {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Ace,
}

impl Upcard {
    /// Columns of the chart, in order.
    pub const ALL: [Upcard; 10] = [
        Upcard::Two,
        Upcard::Three,
        Upcard::Four,
        Upcard::Five,
        Upcard::Six,
        Upcard::Seven,
        Upcard::Eight,
        Upcard::Nine,
        Upcard::Ten,
        Upcard::Ace,
    ];

    pub fn from_card(card: &Card) -> Upcard {
        match card.rank {
            Rank::Ace => Upcard::Ace,
            Rank::Two => Upcard::Two,
            Rank::Three => Upcard::Three,
            Rank::Four => Upcard::Four,
            Rank::Five => Upcard::Five,
            Rank::Six => Upcard::Six,
            Rank::Seven => Upcard::Seven,
            Rank::Eight => Upcard::Eight,
            Rank::Nine => Upcard::Nine,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => Upcard::Ten,
        }
    }

    /// `2` through `10`, or `A`.
    pub fn label(self) -> &'static str {
        match self {
            Upcard::Two => "2",
            Upcard::Three => "3",
            Upcard::Four => "4",
            Upcard::Five => "5",
            Upcard::Six => "6",
            Upcard::Seven => "7",
            Upcard::Eight => "8",
            Upcard::Nine => "9",
            Upcard::Ten => "10",
            Upcard::Ace => "A",
        }
    }

    fn column(self) -> usize {
        self as usize
    }
}

impl Display for Upcard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Upcard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

const H: PlayerAction = PlayerAction::Hit;
const S: PlayerAction = PlayerAction::Stand;

const HARD_MIN: u8 = 4;
const SOFT_MIN: u8 = 12;

//                                 2  3  4  5  6  7  8  9  10 A
static HARD_CHART: [[PlayerAction; 10]; 18] = [
    /*  4 */ [H, H, H, H, H, H, H, H, H, H],
    /*  5 */ [H, H, H, H, H, H, H, H, H, H],
    /*  6 */ [H, H, H, H, H, H, H, H, H, H],
    /*  7 */ [H, H, H, H, H, H, H, H, H, H],
    /*  8 */ [H, H, H, H, H, H, H, H, H, H],
    /*  9 */ [H, H, H, H, H, H, H, H, H, H],
    /* 10 */ [H, H, H, H, H, H, H, H, H, H],
    /* 11 */ [H, H, H, H, H, H, H, H, H, H],
    /* 12 */ [H, H, S, S, S, H, H, H, H, H],
    /* 13 */ [S, S, S, S, S, H, H, H, H, H],
    /* 14 */ [S, S, S, S, S, H, H, H, H, H],
    /* 15 */ [S, S, S, S, S, H, H, H, H, H],
    /* 16 */ [S, S, S, S, S, H, H, H, H, H],
    /* 17 */ [S, S, S, S, S, S, S, S, S, S],
    /* 18 */ [S, S, S, S, S, S, S, S, S, S],
    /* 19 */ [S, S, S, S, S, S, S, S, S, S],
    /* 20 */ [S, S, S, S, S, S, S, S, S, S],
    /* 21 */ [S, S, S, S, S, S, S, S, S, S],
];

//                                 2  3  4  5  6  7  8  9  10 A
static SOFT_CHART: [[PlayerAction; 10]; 10] = [
    /* 12 */ [H, H, H, H, H, H, H, H, H, H],
    /* 13 */ [H, H, H, H, H, H, H, H, H, H],
    /* 14 */ [H, H, H, H, H, H, H, H, H, H],
    /* 15 */ [H, H, H, H, H, H, H, H, H, H],
    /* 16 */ [H, H, H, H, H, H, H, H, H, H],
    /* 17 */ [H, H, H, H, H, H, H, H, H, H],
    /* 18 */ [S, S, S, S, S, S, S, H, H, H],
    /* 19 */ [S, S, S, S, S, S, S, S, S, S],
    /* 20 */ [S, S, S, S, S, S, S, S, S, S],
    /* 21 */ [S, S, S, S, S, S, S, S, S, S],
];

fn chart(kind: HandKind) -> (&'static [[PlayerAction; 10]], u8) {
    match kind {
        HandKind::Hard => (&HARD_CHART[..], HARD_MIN),
        HandKind::Soft => (&SOFT_CHART[..], SOFT_MIN),
    }
}

/// Looks up the basic strategy play. Totals outside a table clamp to its nearest row.
pub fn optimal_action(kind: HandKind, player_total: u8, upcard: Upcard) -> PlayerAction {
    let (rows, min) = chart(kind);
    let max = min + (rows.len() as u8 - 1);
    let row = (player_total.clamp(min, max) - min) as usize;
    rows[row][upcard.column()]
}

/// One cell of the chart, the shape the chart is served in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    pub hand_kind: HandKind,
    pub player_total: u8,
    pub dealer_upcard: Upcard,
    pub action: PlayerAction,
}

/// Every cell of both tables, hard totals first.
pub fn chart_entries() -> Vec<ChartEntry> {
    [HandKind::Hard, HandKind::Soft]
        .into_iter()
        .flat_map(|hand_kind| {
            let (rows, min) = chart(hand_kind);
            rows.iter().enumerate().flat_map(move |(i, row)| {
                Upcard::ALL.into_iter().map(move |dealer_upcard| ChartEntry {
                    hand_kind,
                    player_total: min + i as u8,
                    dealer_upcard,
                    action: row[dealer_upcard.column()],
                })
            })
        })
        .collect()
}
