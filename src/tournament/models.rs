//! Tournament data models.

use serde::{Deserialize, Serialize};

use crate::game::entities::{Chips, Username};
use crate::game::state_machine::GameSettings;

/// What the driver does when a round aborts on an exhausted deck.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ExhaustionPolicy {
    /// Wind the tournament down where it stands.
    EndTournament,
    /// Reclaim every dealt card, reshuffle, and retry the round once.
    ReshuffleAndRetry,
}

/// Tournament configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Per-round game settings (stacks, ante)
    pub settings: GameSettings,
    /// Rounds to play unless the table empties first
    pub num_rounds: usize,
    /// First player to reach this many round points ends the tournament
    pub target_points: Option<u32>,
    /// Deck-exhaustion policy
    pub exhaustion_policy: ExhaustionPolicy,
    /// Seed for reproducible decks and default bots
    pub seed: Option<u64>,
}

impl TournamentConfig {
    /// Standard configuration: entropy-seeded, retry on exhaustion.
    #[must_use]
    pub fn standard(name: &str, num_rounds: usize) -> Self {
        Self {
            name: name.to_string(),
            settings: GameSettings::default(),
            num_rounds,
            target_points: None,
            exhaustion_policy: ExhaustionPolicy::ReshuffleAndRetry,
            seed: None,
        }
    }

    /// Reproducible configuration for tests and simulations.
    #[must_use]
    pub fn seeded(name: &str, num_rounds: usize, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::standard(name, num_rounds)
        }
    }
}

/// One player's tournament ledger entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Standing {
    pub name: Username,
    pub chips: Chips,
    pub points: u32,
    pub eliminated: bool,
    /// Final placing, 1-indexed; assigned on elimination or at the end.
    pub finish_position: Option<usize>,
}

impl Standing {
    #[must_use]
    pub fn new(name: Username, chips: Chips) -> Self {
        Self {
            name,
            chips,
            points: 0,
            eliminated: false,
            finish_position: None,
        }
    }
}

/// Final tournament report.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TournamentSummary {
    pub rounds_played: usize,
    /// Standings sorted best placing first.
    pub standings: Vec<Standing>,
    pub champion: Option<Username>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config() {
        let config = TournamentConfig::standard("Friday Night", 10);
        assert_eq!(config.num_rounds, 10);
        assert_eq!(config.exhaustion_policy, ExhaustionPolicy::ReshuffleAndRetry);
        assert!(config.seed.is_none());
        assert!(config.target_points.is_none());
    }

    #[test]
    fn test_seeded_config() {
        let config = TournamentConfig::seeded("Rerun", 5, 99);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.num_rounds, 5);
    }

    #[test]
    fn test_standing_starts_clean() {
        let standing = Standing::new(Username::new("alice"), 100);
        assert_eq!(standing.points, 0);
        assert!(!standing.eliminated);
        assert!(standing.finish_position.is_none());
    }
}
