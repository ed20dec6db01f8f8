//! Round engine - core FSM and game logic.
//!
//! This module provides the foundational round implementation including:
//! - Type-safe finite state machine over the round phases
//! - Card, deck, and hand-pool entities with the mod-card economy
//! - Hand evaluation over standard and exotic categories
//! - Event generation and table views

// Submodules
pub mod abilities;
pub mod constants;
pub mod entities;
pub mod functional;
pub mod mods;
pub mod state_machine;
pub mod states;

pub use state_machine::{
    ForcedResolution, GameSettings, Round, RoundAbort, RoundData, RoundError, RoundEvent,
    RoundPhase, RoundSnapshot, RoundStateManagement, ShowdownOutcome,
};
