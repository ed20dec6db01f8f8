//! Tournament driver.
//!
//! Owns the standings ledger and loops the round state machine: build a
//! round, ferry collaborator input into it, absorb the outcome, eliminate
//! busted players, and decide what a deck exhaustion means for the
//! tournament as a whole.

use anyhow::ensure;
use log::{error, info, warn};
use thiserror::Error;

use super::models::{ExhaustionPolicy, Standing, TournamentConfig, TournamentSummary};
use crate::bot::{BettingContext, BettingStrategy, ThresholdStrategy};
use crate::game::abilities::{AbilityCollaborator, NoAbilities};
use crate::game::constants::MAX_PLAYERS;
use crate::game::entities::{Action, SeatIndex, User, Username};
use crate::game::functional;
use crate::game::mods::standard_mod_set;
use crate::game::state_machine::{
    Round, RoundAbort, RoundData, RoundEvent, RoundPhase, RoundStateManagement,
};
use crate::game::states::Betting;

/// Tournament errors.
#[derive(Debug, Error, PartialEq)]
pub enum TournamentError {
    #[error("need at least 2 players, got {0}")]
    InsufficientPlayers(usize),

    #[error("table is full: {got} > {max}")]
    TooManyPlayers { got: usize, max: usize },

    #[error("player {0} already registered")]
    DuplicatePlayer(Username),

    #[error("strategy count {strategies} does not match player count {players}")]
    StrategyMismatch { strategies: usize, players: usize },
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament driver.
pub struct TournamentDriver {
    config: TournamentConfig,
    standings: Vec<Standing>,
    events: Vec<RoundEvent>,
}

impl TournamentDriver {
    pub fn new(config: TournamentConfig, players: Vec<Username>) -> TournamentResult<Self> {
        if players.len() < 2 {
            return Err(TournamentError::InsufficientPlayers(players.len()));
        }
        if players.len() > MAX_PLAYERS {
            return Err(TournamentError::TooManyPlayers {
                got: players.len(),
                max: MAX_PLAYERS,
            });
        }
        let mut standings: Vec<Standing> = Vec::with_capacity(players.len());
        for name in players {
            if standings.iter().any(|s| s.name == name) {
                return Err(TournamentError::DuplicatePlayer(name));
            }
            standings.push(Standing::new(name, config.settings.starting_chips));
        }
        Ok(Self {
            config,
            standings,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Full audit trail of round events across the tournament.
    #[must_use]
    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    /// Run the tournament with the default threshold bots behind the
    /// betting boundary and no ability collaborator.
    pub fn run_with_default_bots(&mut self) -> anyhow::Result<TournamentSummary> {
        let mut strategies: Vec<Box<dyn BettingStrategy>> = (0..self.standings.len())
            .map(|i| match self.config.seed {
                Some(seed) => Box::new(ThresholdStrategy::seeded(seed.wrapping_add(i as u64)))
                    as Box<dyn BettingStrategy>,
                None => Box::new(ThresholdStrategy::new()) as Box<dyn BettingStrategy>,
            })
            .collect();
        self.run(&mut strategies, &mut NoAbilities)
    }

    /// Run the tournament to completion. `strategies` pairs with the
    /// registered players by index.
    pub fn run(
        &mut self,
        strategies: &mut [Box<dyn BettingStrategy>],
        abilities: &mut dyn AbilityCollaborator,
    ) -> anyhow::Result<TournamentSummary> {
        ensure!(
            strategies.len() == self.standings.len(),
            TournamentError::StrategyMismatch {
                strategies: strategies.len(),
                players: self.standings.len(),
            }
        );

        let mut data = self.initial_round_data();
        let mut rounds_played = 0;
        let mut retried = false;
        let mut next_position = self.standings.len();

        while rounds_played < self.config.num_rounds && data.seated() > 1 {
            match self.drive_round(data, strategies, abilities) {
                Ok(completed) => {
                    rounds_played += 1;
                    retried = false;
                    self.absorb(&completed);

                    let mut next = completed.into_next_round();
                    for user in next.remove_busted() {
                        info!("{} eliminated", user.name);
                        if let Some(standing) = self.standing_mut(&user.name) {
                            standing.eliminated = true;
                            standing.finish_position = Some(next_position);
                            next_position -= 1;
                        }
                    }
                    data = next;

                    let target_reached = self
                        .config
                        .target_points
                        .is_some_and(|target| self.standings.iter().any(|s| s.points >= target));
                    if target_reached {
                        info!("point target reached after round {rounds_played}");
                        break;
                    }
                }
                Err(abort) => match self.config.exhaustion_policy {
                    ExhaustionPolicy::EndTournament => {
                        error!("round aborted ({}); ending tournament", abort.error);
                        break;
                    }
                    ExhaustionPolicy::ReshuffleAndRetry => {
                        if retried {
                            error!(
                                "round aborted again after retry ({}); ending tournament",
                                abort.error
                            );
                            break;
                        }
                        warn!("round aborted ({}); reshuffling and retrying", abort.error);
                        retried = true;
                        let mut recovered = abort.data;
                        recovered.reclaim_cards();
                        data = recovered;
                    }
                },
            }
        }

        Ok(self.finalize(rounds_played))
    }

    /// Drive one round through the FSM, ferrying betting actions and
    /// ability mutations across their boundaries.
    fn drive_round(
        &mut self,
        data: RoundData,
        strategies: &mut [Box<dyn BettingStrategy>],
        abilities: &mut dyn AbilityCollaborator,
    ) -> Result<RoundData, RoundAbort> {
        let mut phase = RoundPhase::new(data);
        loop {
            phase = match phase {
                RoundPhase::Betting(mut round) => {
                    while let Some(seat) = round.next_to_act() {
                        let action = self.consult(&round, seat, strategies);
                        if let Err(err) = round.act(seat, action) {
                            // A collaborator misfire resolves to a
                            // deterministic default before control returns.
                            warn!("seat {seat} offered illegal {action}: {err}; taking default");
                            let fallback = if round.to_call(seat) == 0 {
                                Action::Check
                            } else {
                                Action::Call
                            };
                            round
                                .act(seat, fallback)
                                .expect("check or call is always legal for the acting seat");
                        }
                    }
                    RoundPhase::Betting(round).step()?
                }
                RoundPhase::Abilities(mut round) => {
                    let view = round.get_view();
                    if let Err(err) = round.apply(abilities.mutations(&view)) {
                        warn!("ability mutations rejected: {err}");
                    }
                    RoundPhase::Abilities(round).step()?
                }
                RoundPhase::Complete(mut round) => {
                    self.events.extend(round.drain_events());
                    return Ok(round.data);
                }
                other => other.step()?,
            };
            self.events.extend(phase.drain_events());
        }
    }

    /// Build the betting context for a seat and ask its strategy to act.
    fn consult(
        &self,
        round: &Round<Betting>,
        seat: SeatIndex,
        strategies: &mut [Box<dyn BettingStrategy>],
    ) -> Action {
        let player = &round.data.players[seat];
        let hand_strength = match functional::eval(&player.hand.reals) {
            Ok(result) => functional::hand_strength(&result),
            Err(err) => {
                warn!("no hand strength for seat {seat}: {err}");
                0.0
            }
        };
        let ctx = BettingContext {
            hand_strength,
            chips_remaining: player.user.chips,
            pot_size: round.data.pot.size(),
            to_call: round.to_call(seat),
            num_mod_cards: player.hand.mod_count(),
        };
        match self
            .standings
            .iter()
            .position(|s| s.name == player.user.name)
        {
            Some(idx) => strategies[idx].act(&ctx),
            None => {
                error!("no strategy registered for {}; folding", player.user.name);
                Action::Fold
            }
        }
    }

    fn initial_round_data(&self) -> RoundData {
        let users: Vec<User> = self
            .standings
            .iter()
            .filter(|s| !s.eliminated)
            .map(|s| User {
                name: s.name.clone(),
                chips: s.chips,
            })
            .collect();
        match self.config.seed {
            Some(seed) => {
                RoundData::seeded(users, self.config.settings, standard_mod_set(), seed)
            }
            None => RoundData::new(users, self.config.settings, standard_mod_set()),
        }
    }

    /// Pull chips and round points from a completed round into the ledger.
    fn absorb(&mut self, data: &RoundData) {
        for player in &data.players {
            let chips = player.user.chips;
            if let Some(standing) = self.standing_mut(&player.user.name) {
                standing.chips = chips;
            }
        }
        if let Some(outcome) = &data.outcome {
            for &(seat, points) in &outcome.points {
                let Some(player) = data.players.get(seat) else {
                    continue;
                };
                let name = player.user.name.clone();
                if let Some(standing) = self.standing_mut(&name) {
                    standing.points += points;
                }
            }
        }
    }

    fn standing_mut(&mut self, name: &Username) -> Option<&mut Standing> {
        self.standings.iter_mut().find(|s| s.name == *name)
    }

    /// Assign final placings to the survivors and produce the summary.
    fn finalize(&mut self, rounds_played: usize) -> TournamentSummary {
        let mut remaining: Vec<usize> = (0..self.standings.len())
            .filter(|&i| !self.standings[i].eliminated)
            .collect();
        remaining.sort_by(|&a, &b| {
            let sa = &self.standings[a];
            let sb = &self.standings[b];
            sb.points.cmp(&sa.points).then(sb.chips.cmp(&sa.chips))
        });
        for (rank, &idx) in remaining.iter().enumerate() {
            self.standings[idx].finish_position = Some(rank + 1);
        }

        let mut standings = self.standings.clone();
        standings.sort_by_key(|s| s.finish_position.unwrap_or(usize::MAX));
        let champion = standings
            .first()
            .filter(|s| !s.eliminated)
            .map(|s| s.name.clone());
        TournamentSummary {
            rounds_played,
            standings,
            champion,
        }
    }
}
