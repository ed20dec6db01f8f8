//! Betting collaborator boundary and default strategies.
//!
//! The round state machine never reasons about betting; it hands a
//! [`BettingContext`] to whatever [`BettingStrategy`] sits behind this
//! boundary and consumes the action that comes back.

pub mod decision;

pub use decision::{
    BettingContext, BettingStrategy, ScriptedStrategy, ThresholdConfig, ThresholdStrategy,
};
