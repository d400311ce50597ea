use crate::round::{PlayerAction, RoundState};
use thiserror::Error;

/// Errors raised by the engine. All of them are recoverable, and none of them leave a round or a
/// shoe half-mutated: an operation that fails is rolled back before the error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackjackError {
    /// The action token was not one of the recognized hit/stand spellings.
    #[error("invalid action `{0}`, expected \"H\" (hit) or \"S\" (stand)")]
    InvalidAction(String),

    /// A hit or stand was requested while the round was not waiting on the player.
    #[error("cannot {action} {}", describe_state(.state))]
    IllegalState {
        action: PlayerAction,
        state: Option<RoundState>,
    },

    /// A draw was attempted on an exhausted shoe that has no reshuffle policy.
    #[error("the shoe is empty and no reshuffle policy applies")]
    EmptyShoe,

    #[error("invalid table configuration: {0}")]
    InvalidConfig(String),
}

fn describe_state(state: &Option<RoundState>) -> String {
    match state {
        None => "before a round has been dealt".to_string(),
        Some(RoundState::Settled) => "once the round is over, start a new round".to_string(),
        Some(s) => format!("while the round is in the {} state", s),
    }
}
