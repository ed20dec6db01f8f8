//! Tournament driver: thin orchestration over the round state machine.
//!
//! Repeats rounds, accumulates chips and round points, eliminates busted
//! players, and decides what a deck exhaustion means for the tournament.

pub mod driver;
pub mod models;

pub use driver::{TournamentDriver, TournamentError, TournamentResult};
pub use models::{ExhaustionPolicy, Standing, TournamentConfig, TournamentSummary};
