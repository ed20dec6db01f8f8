//! Betting decision-making behind the collaborator boundary.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::VecDeque;

use crate::game::entities::{Action, Chips};

/// Everything a strategy sees when asked to act. The round state machine
/// consumes the returned action; the reasoning behind it stays here.
#[derive(Clone, Copy, Debug)]
pub struct BettingContext {
    /// Evaluator-derived strength of the acting hand, in `[0, 1]`.
    pub hand_strength: f32,
    pub chips_remaining: Chips,
    pub pot_size: Chips,
    pub to_call: Chips,
    /// Held mod cards; extra options are worth a little extra patience.
    pub num_mod_cards: usize,
}

pub trait BettingStrategy {
    fn act(&mut self, ctx: &BettingContext) -> Action;
}

/// Threshold tuning for [`ThresholdStrategy`].
///
/// All thresholds are hand strengths in `[0.0, 1.0]`; higher means
/// tighter play.
#[derive(Clone, Debug)]
pub struct ThresholdConfig {
    /// Fold when facing a call with strength below this.
    ///
    /// **Range**: 0.10-0.30 (typical: 0.18)
    pub fold_threshold: f32,

    /// Bet or raise with strength above this.
    ///
    /// **Range**: 0.40-0.70 (typical: 0.55)
    pub raise_threshold: f32,

    /// Raise size as a fraction of the current pot.
    ///
    /// **Range**: 0.25-1.0 (typical: 0.5)
    pub raise_pot_fraction: f32,

    /// Probability of actually raising once over the raise threshold;
    /// the rest of the time the strategy flat-calls to vary its play.
    ///
    /// **Range**: 0.5-1.0 (typical: 0.8)
    pub raise_probability: f32,

    /// Strength bonus per held mod card.
    ///
    /// **Range**: 0.0-0.05 (typical: 0.02)
    pub mod_bonus: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            fold_threshold: 0.18,
            raise_threshold: 0.55,
            raise_pot_fraction: 0.5,
            raise_probability: 0.8,
            mod_bonus: 0.02,
        }
    }
}

/// Default betting collaborator: folds weak hands facing pressure, raises
/// strong ones, checks or calls the middle.
pub struct ThresholdStrategy {
    config: ThresholdConfig,
    rng: StdRng,
}

impl ThresholdStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ThresholdConfig::default(), StdRng::from_os_rng())
    }

    /// Reproducible strategy for tests and simulations.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_config(ThresholdConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_config(config: ThresholdConfig, rng: StdRng) -> Self {
        Self { config, rng }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BettingStrategy for ThresholdStrategy {
    fn act(&mut self, ctx: &BettingContext) -> Action {
        let strength =
            (ctx.hand_strength + ctx.num_mod_cards as f32 * self.config.mod_bonus).min(1.0);

        if ctx.to_call >= ctx.chips_remaining {
            // Priced in for the whole stack; continue only with a real hand.
            return if strength >= self.config.raise_threshold {
                Action::AllIn
            } else {
                Action::Fold
            };
        }
        if ctx.to_call > 0 && strength < self.config.fold_threshold {
            return Action::Fold;
        }
        if strength >= self.config.raise_threshold {
            let sized = (ctx.pot_size as f32 * self.config.raise_pot_fraction) as Chips;
            let amount = sized.max(1).min(ctx.chips_remaining - ctx.to_call);
            if amount > 0 && self.rng.random::<f32>() < self.config.raise_probability {
                return if ctx.to_call == 0 {
                    Action::Bet(amount)
                } else {
                    Action::Raise(amount)
                };
            }
        }
        if ctx.to_call == 0 {
            Action::Check
        } else {
            Action::Call
        }
    }
}

/// Deterministic strategy for tests: plays a fixed script, then checks or
/// calls forever.
#[derive(Debug, Default)]
pub struct ScriptedStrategy {
    script: VecDeque<Action>,
}

impl ScriptedStrategy {
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            script: actions.into_iter().collect(),
        }
    }
}

impl BettingStrategy for ScriptedStrategy {
    fn act(&mut self, ctx: &BettingContext) -> Action {
        self.script.pop_front().unwrap_or(if ctx.to_call == 0 {
            Action::Check
        } else {
            Action::Call
        })
    }
}
