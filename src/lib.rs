//! # Mod Poker
//!
//! A poker-variant engine where each hand mixes real playing cards (two
//! jokers wild) with "mod" cards that alter round mechanics. The core is
//! implemented as a type-safe finite state machine using `enum_dispatch`
//! for zero-cost trait dispatch, paired with a pure hand evaluator that
//! ranks pools of up to 8 cards against standard and exotic categories.
//!
//! ## Architecture
//!
//! A round advances through eight phases:
//!
//! - **Dealing**: the guaranteed mod card plus real cards for every seat
//! - **ModEffects**: immediate-on-deal mods resolve (extra draws, swaps)
//! - **Betting**: external collaborator trigger point; folds land here
//! - **Abilities**: external collaborator trigger point for hand mutations
//! - **Showdown**: non-folded hands are evaluated and compared
//! - **Payout**: pot split, dividends, round points
//! - **Redistribution**: end-of-round mod draws by fold/win status
//! - **DeckCycle**: discards return and mod circulation rebalances
//!
//! ## Core Modules
//!
//! - [`game`]: Round state machine, entities, evaluator, and mod registry
//! - [`bot`]: Betting collaborator boundary with default strategies
//! - [`tournament`]: Driver repeating rounds and tracking standings
//!
//! ## Example
//!
//! ```
//! use mod_poker::game::entities::{User, Username};
//! use mod_poker::game::mods::standard_mod_set;
//! use mod_poker::game::{GameSettings, RoundData, RoundPhase};
//!
//! let users = vec![
//!     User { name: Username::new("alice"), chips: 100 },
//!     User { name: Username::new("bob"), chips: 100 },
//! ];
//! let data = RoundData::seeded(users, GameSettings::default(), standard_mod_set(), 7);
//! let round = RoundPhase::new(data);
//! assert_eq!(round.phase_name(), "dealing");
//! ```

/// Betting collaborator boundary and default strategies.
pub mod bot;
pub use bot::{BettingContext, BettingStrategy};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameSettings, RoundError, RoundPhase,
    constants::{self, MAX_PLAYERS, TOTAL_HAND_SIZE},
    entities::{self, DEFAULT_ANTE, DEFAULT_STARTING_CHIPS},
    functional,
};

/// Tournament driver over the round state machine.
pub mod tournament;
pub use tournament::{TournamentConfig, TournamentDriver, TournamentSummary};
