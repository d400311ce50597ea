//! The shoe, i.e. the undealt cards of one or more decks, and the sources of randomness used to shuffle it.
//!
//! Shuffling goes through the `ShuffleSource` trait so a table can be driven by an entropy seeded rng in
//! production and by a seeded rng, or a preset card order, in tests.

use crate::card::{standard_deck, Card};
use crate::error::BlackjackError;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;
use std::fmt::Debug;

/// Trait for anything that can put a slice of cards into a (uniformly) random order.
pub trait ShuffleSource: Send {
    fn shuffle(&mut self, cards: &mut [Card]);
}

/// A `ShuffleSource` backed by any rng, shuffles with a Fisher-Yates permutation.
pub struct RngShuffle<R: RngCore + Send> {
    rng: R,
}

impl<R: RngCore + Send> RngShuffle<R> {
    pub fn new(rng: R) -> Self {
        RngShuffle { rng }
    }
}

impl RngShuffle<StdRng> {
    /// The production source, seeded from the operating system.
    pub fn from_entropy() -> Self {
        RngShuffle::new(StdRng::from_entropy())
    }

    /// A deterministic source, the same seed always yields the same sequence of shuffles.
    pub fn seeded(seed: u64) -> Self {
        RngShuffle::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> ShuffleSource for RngShuffle<R> {
    fn shuffle(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut self.rng);
    }
}

/// Stacks a preset sequence of cards on top of the shoe the first time it is asked to shuffle.
/// Every shuffle, the first one included, is delegated to `then` beforehand, so the cards below the preset
/// (and every later shuffle) are still ordered by it.
pub struct PresetShuffle {
    preset: Option<Vec<Card>>,
    then: Box<dyn ShuffleSource>,
}

impl PresetShuffle {
    pub fn new(preset: Vec<Card>, then: impl ShuffleSource + 'static) -> Self {
        PresetShuffle {
            preset: Some(preset),
            then: Box::new(then),
        }
    }
}

impl ShuffleSource for PresetShuffle {
    fn shuffle(&mut self, cards: &mut [Card]) {
        self.then.shuffle(cards);
        if let Some(preset) = self.preset.take() {
            for (i, card) in preset.iter().enumerate().take(cards.len()) {
                if let Some(offset) = cards[i..].iter().position(|c| c == card) {
                    cards.swap(i, i + offset);
                }
            }
        }
    }
}

/// Saved contents of a shoe, used to roll back a failed operation.
#[derive(Clone)]
pub(crate) struct ShoeCheckpoint {
    cards: VecDeque<Card>,
    num_shuffles: u32,
}

/// Struct for the shoe, the ordered sequence of undealt cards. Cards are dealt from the front.
pub struct Shoe {
    cards: VecDeque<Card>,
    num_decks: u8,
    reshuffle_threshold: Option<usize>,
    num_shuffles: u32,
    source: Box<dyn ShuffleSource>,
}

impl Shoe {
    /// Associated function to create a new, freshly shuffled `Shoe` of `num_decks` decks.
    /// `reshuffle_threshold` is the number of remaining cards below which the shoe is rebuilt before a round,
    /// with `None` the shoe is never rebuilt and running out of cards is an error.
    pub fn new(
        num_decks: u8,
        reshuffle_threshold: Option<usize>,
        source: Box<dyn ShuffleSource>,
    ) -> Shoe {
        let mut shoe = Shoe {
            cards: VecDeque::new(),
            num_decks,
            reshuffle_threshold,
            num_shuffles: 0,
            source,
        };
        shoe.reshuffle();
        shoe
    }

    /// Associated function to create a `Shoe` holding exactly `cards`, dealt in the given order.
    /// Should the shoe need rebuilding later it is rebuilt as `num_decks` full decks.
    pub fn stacked(
        cards: Vec<Card>,
        num_decks: u8,
        reshuffle_threshold: Option<usize>,
        source: Box<dyn ShuffleSource>,
    ) -> Shoe {
        Shoe {
            cards: cards.into(),
            num_decks,
            reshuffle_threshold,
            num_shuffles: 0,
            source,
        }
    }

    /// Deals the card at the front of the shoe. An empty shoe is rebuilt first when a reshuffle threshold is
    /// configured, otherwise `BlackjackError::EmptyShoe` is returned and the shoe is left as it was.
    pub fn draw(&mut self) -> Result<Card, BlackjackError> {
        if self.cards.is_empty() {
            if self.reshuffle_threshold.is_none() {
                return Err(BlackjackError::EmptyShoe);
            }
            debug!("shoe ran dry mid round, reshuffling");
            self.reshuffle();
        }
        self.cards.pop_front().ok_or(BlackjackError::EmptyShoe)
    }

    /// Rebuilds the shoe from `num_decks` full decks and shuffles it.
    pub fn reshuffle(&mut self) {
        let mut cards: Vec<Card> = (0..self.num_decks).flat_map(|_| standard_deck()).collect();
        self.source.shuffle(&mut cards);
        self.cards = cards.into();
        self.num_shuffles += 1;
        debug!(
            "shuffled a {} deck shoe ({} cards), shuffle #{}",
            self.num_decks,
            self.cards.len(),
            self.num_shuffles
        );
    }

    /// True if fewer cards remain than the reshuffle threshold.
    pub fn needs_reshuffle(&self) -> bool {
        self.reshuffle_threshold
            .map_or(false, |threshold| self.cards.len() < threshold)
    }

    /// Reshuffles if `needs_reshuffle()`, returns whether a reshuffle happened.
    pub fn reshuffle_if_needed(&mut self) -> bool {
        if self.needs_reshuffle() {
            self.reshuffle();
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Number of cards in a full shoe.
    pub fn capacity(&self) -> usize {
        self.num_decks as usize * 52
    }

    pub fn num_decks(&self) -> u8 {
        self.num_decks
    }

    pub fn reshuffle_threshold(&self) -> Option<usize> {
        self.reshuffle_threshold
    }

    /// Number of times the shoe has been rebuilt and shuffled.
    pub fn num_shuffles(&self) -> u32 {
        self.num_shuffles
    }

    pub(crate) fn checkpoint(&self) -> ShoeCheckpoint {
        ShoeCheckpoint {
            cards: self.cards.clone(),
            num_shuffles: self.num_shuffles,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: ShoeCheckpoint) {
        self.cards = checkpoint.cards;
        self.num_shuffles = checkpoint.num_shuffles;
    }
}

impl Debug for Shoe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shoe")
            .field("remaining", &self.cards.len())
            .field("num_decks", &self.num_decks)
            .field("reshuffle_threshold", &self.reshuffle_threshold)
            .field("num_shuffles", &self.num_shuffles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn card(code: &str) -> Card {
        code.parse().unwrap()
    }

    #[test]
    fn draws_front_to_back() {
        let mut shoe = Shoe::stacked(
            vec![card("AS"), card("10H"), card("5C")],
            1,
            None,
            Box::new(RngShuffle::seeded(1)),
        );
        assert_eq!(shoe.draw(), Ok(card("AS")));
        assert_eq!(shoe.draw(), Ok(card("10H")));
        assert_eq!(shoe.draw(), Ok(card("5C")));
        assert_eq!(shoe.remaining(), 0);
    }

    #[test]
    fn empty_shoe_without_policy_is_an_error() {
        let mut shoe = Shoe::stacked(vec![card("2D")], 1, None, Box::new(RngShuffle::seeded(1)));
        assert!(shoe.draw().is_ok());
        assert_eq!(shoe.draw(), Err(BlackjackError::EmptyShoe));
        assert_eq!(shoe.remaining(), 0);
        assert_eq!(shoe.num_shuffles(), 0);
    }

    #[test]
    fn empty_shoe_with_policy_rebuilds() {
        let mut shoe = Shoe::stacked(vec![], 2, Some(20), Box::new(RngShuffle::seeded(1)));
        assert!(shoe.draw().is_ok());
        assert_eq!(shoe.num_shuffles(), 1);
        assert_eq!(shoe.remaining(), 2 * 52 - 1);
    }

    #[test]
    fn reshuffle_threshold() {
        let four = vec![card("2S"), card("3S"), card("4S"), card("5S")];
        let mut shoe = Shoe::stacked(four, 1, Some(15), Box::new(RngShuffle::seeded(7)));
        assert!(shoe.needs_reshuffle());
        assert!(shoe.reshuffle_if_needed());
        assert_eq!(shoe.remaining(), 52);
        assert!(!shoe.needs_reshuffle());
        assert!(!shoe.reshuffle_if_needed());
    }

    #[test]
    fn seeded_shuffles_are_reproducible() {
        let mut a = Shoe::new(6, Some(67), Box::new(RngShuffle::seeded(42)));
        let mut b = Shoe::new(6, Some(67), Box::new(RngShuffle::seeded(42)));
        for _ in 0..50 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut shoe = Shoe::new(2, None, Box::new(RngShuffle::seeded(3)));
        let mut dealt = Vec::new();
        while let Ok(c) = shoe.draw() {
            dealt.push(c);
        }
        assert_eq!(dealt.len(), 104);
        for c in standard_deck() {
            assert_eq!(dealt.iter().filter(|d| **d == c).count(), 2);
        }
        assert_ne!(&dealt[..52], standard_deck().as_slice());
    }

    #[test]
    fn preset_cards_come_first() {
        let preset = vec![
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::King, Suit::Diamonds),
            Card::new(Rank::Ace, Suit::Spades),
        ];
        let source = PresetShuffle::new(preset.clone(), RngShuffle::seeded(9));
        let mut shoe = Shoe::new(2, None, Box::new(source));
        for expected in preset {
            assert_eq!(shoe.draw(), Ok(expected));
        }
        assert_eq!(shoe.remaining(), 101);
    }

    #[test]
    fn checkpoint_restores_cards() {
        let mut shoe = Shoe::new(1, None, Box::new(RngShuffle::seeded(5)));
        let checkpoint = shoe.checkpoint();
        let first = shoe.draw();
        shoe.draw().unwrap();
        shoe.restore(checkpoint);
        assert_eq!(shoe.remaining(), 52);
        assert_eq!(shoe.draw(), first);
    }
}
