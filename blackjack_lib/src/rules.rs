use crate::error::BlackjackError;
use crate::hand::HandTotal;
use serde::{Deserialize, Serialize};

/// Struct for configuring a table, i.e. the shoe and the house rules the dealer plays by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub num_decks: u8,
    /// Rebuild and reshuffle the shoe before a round once fewer cards than this remain.
    /// `None` disables reshuffling altogether, an exhausted shoe is then an error.
    pub reshuffle_threshold: Option<usize>,
    /// Dealer hits soft 17 (H17) when set, stands on it (S17) otherwise.
    pub dealer_hits_soft_17: bool,
    /// Dealer checks the hole card for a natural before the player acts.
    pub dealer_peeks: bool,
}

impl TableConfig {
    /// Associated method for returning a new `TableConfigBuilder`, every option left unset takes its default.
    pub fn new() -> TableConfigBuilder {
        TableConfigBuilder {
            num_decks: None,
            reshuffle_threshold: None,
            dealer_hits_soft_17: None,
            dealer_peeks: None,
        }
    }

    /// The dealer's drawing rule: draw below 17, and on soft 17 under H17.
    pub fn dealer_should_hit(&self, total: &HandTotal) -> bool {
        if total.best < 17 {
            return true;
        }
        total.best == 17 && total.soft.is_some() && self.dealer_hits_soft_17
    }
}

impl Default for TableConfig {
    /// Six decks, reshuffled below 67 cards, dealer hits soft 17 and peeks for naturals.
    fn default() -> Self {
        TableConfig {
            num_decks: 6,
            reshuffle_threshold: Some(67),
            dealer_hits_soft_17: true,
            dealer_peeks: true,
        }
    }
}

/// Struct to implement builder pattern for `TableConfig`
#[derive(Debug, Clone, Copy)]
pub struct TableConfigBuilder {
    num_decks: Option<u8>,
    reshuffle_threshold: Option<Option<usize>>,
    dealer_hits_soft_17: Option<bool>,
    dealer_peeks: Option<bool>,
}

impl TableConfigBuilder {
    /// Method for choosing the number of decks in the shoe
    pub fn num_decks(&mut self, decks: u8) -> &mut Self {
        self.num_decks = Some(decks);
        self
    }

    /// Method for setting the reshuffle threshold, `None` turns reshuffling off
    pub fn reshuffle_threshold(&mut self, threshold: Option<usize>) -> &mut Self {
        self.reshuffle_threshold = Some(threshold);
        self
    }

    /// Method for setting whether the dealer must hit soft seventeens
    pub fn dealer_hits_soft_17(&mut self, hits: bool) -> &mut Self {
        self.dealer_hits_soft_17 = Some(hits);
        self
    }

    pub fn dealer_peeks(&mut self, peeks: bool) -> &mut Self {
        self.dealer_peeks = Some(peeks);
        self
    }

    /// Method for building a `TableConfig`, fails if the shoe would have no decks or more than eight.
    pub fn build(&mut self) -> Result<TableConfig, BlackjackError> {
        let defaults = TableConfig::default();
        let config = TableConfig {
            num_decks: self.num_decks.unwrap_or(defaults.num_decks),
            reshuffle_threshold: self
                .reshuffle_threshold
                .unwrap_or(defaults.reshuffle_threshold),
            dealer_hits_soft_17: self
                .dealer_hits_soft_17
                .unwrap_or(defaults.dealer_hits_soft_17),
            dealer_peeks: self.dealer_peeks.unwrap_or(defaults.dealer_peeks),
        };

        if !(1..=8).contains(&config.num_decks) {
            return Err(BlackjackError::InvalidConfig(format!(
                "number of decks must be between 1 and 8, got {}",
                config.num_decks
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Card;
    use crate::hand::evaluate;

    fn total(codes: &[&str]) -> HandTotal {
        let cards: Vec<Card> = codes.iter().map(|c| c.parse().unwrap()).collect();
        evaluate(&cards)
    }

    #[test]
    fn builder_defaults() {
        let config = TableConfig::new().build().unwrap();
        assert_eq!(config, TableConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = TableConfig::new()
            .num_decks(1)
            .reshuffle_threshold(None)
            .dealer_hits_soft_17(false)
            .build()
            .unwrap();
        assert_eq!(config.num_decks, 1);
        assert_eq!(config.reshuffle_threshold, None);
        assert!(!config.dealer_hits_soft_17);
        assert!(config.dealer_peeks);
    }

    #[test]
    fn builder_rejects_bad_deck_counts() {
        assert!(TableConfig::new().num_decks(0).build().is_err());
        assert!(TableConfig::new().num_decks(9).build().is_err());
    }

    #[test]
    fn dealer_drawing_rule() {
        let h17 = TableConfig::default();
        let s17 = TableConfig::new().dealer_hits_soft_17(false).build().unwrap();

        assert!(h17.dealer_should_hit(&total(&["10S", "6H"])));
        assert!(!h17.dealer_should_hit(&total(&["10S", "7H"])));
        assert!(h17.dealer_should_hit(&total(&["AS", "6H"])));
        assert!(!h17.dealer_should_hit(&total(&["AS", "7H"])));

        assert!(!s17.dealer_should_hit(&total(&["AS", "6H"])));
        assert!(s17.dealer_should_hit(&total(&["AS", "5H"])));
        // soft ace demoted, hard 17
        assert!(!h17.dealer_should_hit(&total(&["AS", "6H", "10C"])));
    }
}
