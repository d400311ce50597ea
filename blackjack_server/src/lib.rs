//! HTTP front end of the blackjack trainer: per-player sessions kept behind a cookie, JSON snapshots of the
//! round, and the process configuration.

pub mod api;
pub mod config;
pub mod registry;
pub mod session;
pub mod snapshot;

pub mod prelude {
    pub use super::{
        api::{configure, AppState, UserError},
        config::{Cli, ConfigError, GameConfig, ServerConfig},
        registry::{SessionRegistry, SESSION_COOKIE},
        session::BlackjackSession,
        snapshot::Snapshot,
    };
}
