//! Round state machine.
//!
//! A round advances `Dealing → ModEffects → Betting → Abilities → Showdown
//! → Payout → Redistribution → DeckCycle → Complete`. Each phase is a
//! typestate wrapped in [`Round`]; legal transitions are `From`
//! conversions and [`RoundPhase::step`] drives them, so every transition is
//! a pure function of the current state plus the events delivered into it.
//!
//! Betting and Abilities are the external trigger points: `step` leaves
//! the machine parked there until the collaborator input arrives (player
//! actions, mod plays, hand mutations). Everything else advances
//! unconditionally. The machine exclusively owns the deck and arbitrates
//! every card transfer between deck, hand pools, and discard.

use enum_dispatch::enum_dispatch;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::abilities::HandMutation;
use super::constants::{
    ACTIVE_MOD_DRAWS, GUARANTEED_MOD_DEAL, HIGH_TIER_WIN_POINTS, MAX_PLAYERS, MAX_REAL_CARDS,
    MIN_REAL_CARDS, REAL_DECK_SIZE, TOTAL_HAND_SIZE, WIN_POINTS, WINNER_MOD_DRAWS,
    mod_circulation_target,
};
use super::entities::{
    Action, Card, Chips, DEFAULT_ANTE, DEFAULT_STARTING_CHIPS, Deck, DeckError, DeckSnapshot,
    PlayerRound, Pot, SeatIndex, SeatView, TableView, User, Username,
};
use super::functional::{self, EvalError, HandCategory, HandResult};
use super::mods::{ModCard, ModEffect, ModKind, TriggerPhase};
use super::states::{
    Abilities, Betting, Complete, DeckCycle, Dealing, ModEffects, Payout, Redistribution, Showdown,
};

/// Errors that can occur while driving a round.
#[derive(Debug, Error, PartialEq)]
pub enum RoundError {
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("seat {0} out of bounds")]
    InvalidSeat(SeatIndex),
    #[error("not seat {0}'s turn")]
    OutOfTurnAction(SeatIndex),
    #[error("betting is closed")]
    BettingClosed,
    #[error("invalid {action} with {to_call} to call")]
    InvalidAction { action: Action, to_call: Chips },
    #[error("illegal bet of {amount}")]
    InvalidBet { amount: Chips },
    #[error("seat {seat} holds no playable {kind}")]
    ModNotHeld { seat: SeatIndex, kind: ModKind },
    #[error("{kind} does not trigger on play")]
    ModNotPlayable { kind: ModKind },
    #[error("invalid hand mutation {0:?}")]
    InvalidMutation(HandMutation),
    #[error("unknown phase {0:?} in snapshot")]
    UnknownPhase(String),
}

/// A round abort: the error plus the recovered round data, so the deck and
/// chip stacks survive for the tournament driver to decide what happens
/// next.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RoundAbort {
    pub error: RoundError,
    pub data: RoundData,
}

/// Events that occur during a round, drained by callers for display or
/// audit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum RoundEvent {
    AnteCollected(Username, Chips),
    Dealt(Username),
    ModResolved(Username, ModKind),
    ModPlayed(Username, ModKind),
    ModBurned(ModKind),
    CardSwapped(Username, Username),
    TookAction(Username, Action),
    ForcedShowdown,
    ForcedPayout,
    HandScored(Username, HandResult),
    SplitPot(Username, Chips),
    DividendPaid(Username, Chips),
    PointsAwarded(Username, u32),
    PotRefunded(Username, Chips),
    ModShortfall { requested: usize, drawn: usize },
    DeckCycled { returned: usize, replenished: usize, retired: usize },
}

impl fmt::Display for RoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::AnteCollected(username, amount) => format!("{username} antes {amount}"),
            Self::Dealt(username) => format!("{username} dealt in"),
            Self::ModResolved(username, kind) => format!("{username}'s {kind} resolves"),
            Self::ModPlayed(username, kind) => format!("{username} plays {kind}"),
            Self::ModBurned(kind) => format!("{kind} burns unplayed"),
            Self::CardSwapped(username, target) => {
                format!("{username} swaps a card with {target}")
            }
            Self::TookAction(username, action) => format!("{username} {action}"),
            Self::ForcedShowdown => "showdown forced".to_string(),
            Self::ForcedPayout => "payout forced".to_string(),
            Self::HandScored(username, result) => format!("{username} shows {result}"),
            Self::SplitPot(username, amount) => format!("{username} won {amount}"),
            Self::DividendPaid(username, amount) => {
                format!("{username} collects a {amount} chip dividend")
            }
            Self::PointsAwarded(username, points) => {
                format!("{username} scores {points} point(s)")
            }
            Self::PotRefunded(username, amount) => {
                format!("{username} refunded {amount} from the pot")
            }
            Self::ModShortfall { requested, drawn } => {
                format!("mod draw shortfall: {drawn} of {requested}")
            }
            Self::DeckCycled {
                returned,
                replenished,
                retired,
            } => {
                format!(
                    "deck cycled: {returned} mods returned, {replenished} replenished, {retired} retired"
                )
            }
        };
        write!(f, "{repr}")
    }
}

/// Game configuration settings.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_chips: Chips,
    pub ante: Chips,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_CHIPS, DEFAULT_ANTE)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(starting_chips: Chips, ante: Chips) -> Self {
        Self {
            starting_chips,
            ante,
        }
    }
}

/// A Knight or Queen play, terminating betting and pre-empting abilities.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ForcedResolution {
    Showdown,
    Payout,
}

/// Showdown result: winning seats (ascending; several means a split), the
/// scored hands, and the round points granted at payout.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ShowdownOutcome {
    pub winners: Vec<SeatIndex>,
    pub results: Vec<(SeatIndex, HandResult)>,
    pub points: Vec<(SeatIndex, u32)>,
}

/// Burn/discard piles for the round.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Discard {
    pub mods: Vec<ModCard>,
    pub reals: Vec<Card>,
}

/// Mutable round data shared across all states.
#[derive(Debug)]
pub struct RoundData {
    /// The deck. Instantiated once, reshuffled each deal, and owned
    /// exclusively by the state machine.
    deck: Deck,
    pub players: Vec<PlayerRound>,
    pub pot: Pot,
    discard: Discard,
    forced: Option<ForcedResolution>,
    pub outcome: Option<ShowdownOutcome>,
    events: VecDeque<RoundEvent>,
    settings: GameSettings,
}

impl RoundData {
    /// Round data over an entropy-seeded deck.
    #[must_use]
    pub fn new(users: Vec<User>, settings: GameSettings, mod_set: Vec<ModCard>) -> Self {
        Self::with_deck(users, settings, Deck::new(mod_set))
    }

    /// Round data over a reproducible deck.
    #[must_use]
    pub fn seeded(
        users: Vec<User>,
        settings: GameSettings,
        mod_set: Vec<ModCard>,
        seed: u64,
    ) -> Self {
        Self::with_deck(users, settings, Deck::seeded(mod_set, seed))
    }

    #[must_use]
    pub fn with_deck(users: Vec<User>, settings: GameSettings, mut deck: Deck) -> Self {
        debug_assert!(users.len() <= MAX_PLAYERS);
        let players = users
            .into_iter()
            .enumerate()
            .map(|(seat_idx, user)| PlayerRound::new(user, seat_idx))
            .collect::<Vec<_>>();
        deck.balance_mods(mod_circulation_target(players.len()));
        Self {
            deck,
            players,
            pot: Pot::default(),
            discard: Discard::default(),
            forced: None,
            outcome: None,
            events: VecDeque::new(),
            settings,
        }
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn forced(&self) -> Option<ForcedResolution> {
        self.forced
    }

    #[must_use]
    pub fn discarded_mods(&self) -> usize {
        self.discard.mods.len()
    }

    #[must_use]
    pub fn seated(&self) -> usize {
        self.players.len()
    }

    /// Seats still in the hand, ascending.
    #[must_use]
    pub fn active_seats(&self) -> Vec<SeatIndex> {
        self.players
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.seat_idx)
            .collect()
    }

    /// Mod cards held across all hands.
    #[must_use]
    pub fn held_mods(&self) -> usize {
        self.players.iter().map(|p| p.hand.mod_count()).sum()
    }

    #[must_use]
    pub fn table_view(&self) -> TableView {
        let seats = self
            .players
            .iter()
            .map(|p| SeatView {
                user: p.user.clone(),
                folded: p.folded,
                ability_on_cooldown: p.ability_on_cooldown,
                real_count: p.hand.real_count(),
                mod_count: p.hand.mod_count(),
                revealed: p
                    .revealed
                    .iter()
                    .filter_map(|&i| p.hand.reals.get(i).copied())
                    .collect(),
            })
            .collect();
        TableView {
            seats,
            pot_size: self.pot.size(),
        }
    }

    /// Roll the data into the next round: folds become one round of
    /// ability cooldown, per-round state clears, the deck carries over.
    #[must_use]
    pub fn into_next_round(mut self) -> Self {
        for player in &mut self.players {
            player.advance_round();
        }
        self.pot = Pot::default();
        self.discard = Discard::default();
        self.forced = None;
        self.outcome = None;
        self.events.clear();
        self
    }

    /// Remove players with empty stacks, returning their users. Their held
    /// cards go back to the deck and the remaining seats close ranks.
    pub fn remove_busted(&mut self) -> Vec<User> {
        let mut busted = Vec::new();
        let mut kept = Vec::new();
        for mut player in std::mem::take(&mut self.players) {
            if player.user.chips == 0 {
                self.deck.return_reals(player.hand.drain_reals());
                self.deck.return_mods(player.hand.drain_mods());
                busted.push(player.user);
            } else {
                kept.push(player);
            }
        }
        for (seat_idx, player) in kept.iter_mut().enumerate() {
            player.seat_idx = seat_idx;
        }
        self.players = kept;
        busted
    }

    /// Return every dealt card, refund pot investments, and clear
    /// per-round flags, leaving the deck whole. Used after an abort before
    /// retrying or winding down: the aborted round never happened.
    pub fn reclaim_cards(&mut self) {
        for seat in 0..self.players.len() {
            let reals = self.players[seat].hand.drain_reals();
            self.deck.return_reals(reals);
            let mods = self.players[seat].hand.drain_mods();
            self.deck.return_mods(mods);
            self.players[seat].folded = false;
            self.players[seat].revealed.clear();
        }
        self.forced = None;
        self.outcome = None;
        self.deck.return_reals(self.discard.reals.drain(..));
        self.deck.return_mods(self.discard.mods.drain(..));
        for (seat, amount) in std::mem::take(&mut self.pot.investments) {
            if let Some(player) = self.players.get_mut(seat) {
                player.user.chips += amount;
            }
        }
        self.deck.shuffle();
    }

    fn player_mut(&mut self, seat: SeatIndex) -> Result<&mut PlayerRound, RoundError> {
        self.players
            .get_mut(seat)
            .ok_or(RoundError::InvalidSeat(seat))
    }

    /// Burn every unconsumed held mod of the given kind into discard.
    fn burn_held(&mut self, kind: ModKind) {
        for seat in 0..self.players.len() {
            while let Some(mut card) = self.players[seat].hand.take_mod(kind) {
                card.burn();
                self.discard.mods.push(card);
                self.events.push_back(RoundEvent::ModBurned(kind));
            }
        }
    }
}

/// A single round with data and its current phase.
#[derive(Debug)]
pub struct Round<T> {
    pub data: RoundData,
    pub state: T,
}

/// Trait for reading round state (events, views), shared by every phase.
#[enum_dispatch]
pub trait RoundStateManagement {
    fn drain_events(&mut self) -> VecDeque<RoundEvent>;

    #[must_use]
    fn get_view(&self) -> TableView;
}

impl<T> RoundStateManagement for Round<T> {
    fn drain_events(&mut self) -> VecDeque<RoundEvent> {
        std::mem::take(&mut self.data.events)
    }

    fn get_view(&self) -> TableView {
        self.data.table_view()
    }
}

macro_rules! transition {
    ($from:ty => $to:ident) => {
        impl From<Round<$from>> for Round<$to> {
            fn from(value: Round<$from>) -> Self {
                Self {
                    data: value.data,
                    state: $to::default(),
                }
            }
        }
    };
}

transition!(Dealing => ModEffects);
transition!(Betting => Abilities);
transition!(Betting => Showdown);
transition!(Abilities => Showdown);
transition!(Showdown => Payout);
transition!(Payout => Redistribution);
transition!(Redistribution => DeckCycle);
transition!(DeckCycle => Complete);

impl From<Round<ModEffects>> for Round<Betting> {
    fn from(value: Round<ModEffects>) -> Self {
        let queue = value.data.active_seats().into();
        Self {
            data: value.data,
            state: Betting { queue },
        }
    }
}

impl Round<Dealing> {
    /// Deal each seated player the guaranteed mod plus real cards filling
    /// their hand, and collect the ante. Strict draws: an exhausted deck
    /// aborts the round.
    fn deal(&mut self) -> Result<(), RoundError> {
        let data = &mut self.data;
        data.deck.shuffle();
        let ante = data.settings.ante;
        for seat in 0..data.players.len() {
            let mods = data.deck.draw_mods(GUARANTEED_MOD_DEAL)?;
            data.players[seat].hand.mods.extend(mods);

            let reals_needed = (TOTAL_HAND_SIZE
                .saturating_sub(data.players[seat].hand.mod_count()))
            .clamp(MIN_REAL_CARDS, MAX_REAL_CARDS);
            let reals = data.deck.draw_reals(reals_needed)?;
            data.players[seat].hand.reals.extend(reals);

            let player = &mut data.players[seat];
            let paid = ante.min(player.user.chips);
            player.user.chips -= paid;
            let name = player.user.name.clone();
            data.pot.bet(seat, paid);
            data.events.push_back(RoundEvent::AnteCollected(name.clone(), paid));
            data.events.push_back(RoundEvent::Dealt(name));
        }
        Ok(())
    }
}

impl Round<ModEffects> {
    /// Resolve immediate-on-deal mods: all draws first, then all swaps, in
    /// seat order, so no swap can hand off a card that was never drawn.
    fn resolve_deal_mods(&mut self) {
        let data = &mut self.data;
        for seat in 0..data.players.len() {
            while let Some(mut card) = data.players[seat].hand.take_mod(ModKind::ExtraDraw) {
                match data.deck.draw_reals(1) {
                    Ok(drawn) => {
                        data.players[seat].hand.reals.extend(drawn);
                        let name = data.players[seat].user.name.clone();
                        data.events
                            .push_back(RoundEvent::ModResolved(name, ModKind::ExtraDraw));
                    }
                    Err(err) => {
                        warn!("extra draw fizzled for seat {seat}: {err}");
                    }
                }
                card.burn();
                data.discard.mods.push(card);
            }
        }
        for seat in 0..data.players.len() {
            while let Some(mut card) = data.players[seat].hand.take_mod(ModKind::SneakySwap) {
                card.burn();
                data.discard.mods.push(card);
                let targets: Vec<SeatIndex> = data
                    .players
                    .iter()
                    .filter(|p| p.seat_idx != seat && p.hand.real_count() > 0)
                    .map(|p| p.seat_idx)
                    .collect();
                if targets.is_empty() || data.players[seat].hand.real_count() == 0 {
                    continue;
                }
                let target = targets[data.deck.roll(targets.len())];
                let own_idx = data.deck.roll(data.players[seat].hand.real_count());
                let their_idx = data.deck.roll(data.players[target].hand.real_count());
                let own = data.players[seat].hand.reals[own_idx];
                let theirs = data.players[target].hand.reals[their_idx];
                data.players[seat].hand.reals[own_idx] = theirs;
                data.players[target].hand.reals[their_idx] = own;
                let name = data.players[seat].user.name.clone();
                let target_name = data.players[target].user.name.clone();
                data.events
                    .push_back(RoundEvent::CardSwapped(name, target_name));
            }
        }
    }
}

impl Round<Betting> {
    /// The seat owing the next betting response, if any.
    #[must_use]
    pub fn next_to_act(&self) -> Option<SeatIndex> {
        self.state.queue.front().copied()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.queue.is_empty() || self.data.forced.is_some()
    }

    /// Amount the seat must put in to stay in the hand.
    #[must_use]
    pub fn to_call(&self, seat: SeatIndex) -> Chips {
        self.data.pot.call_amount(seat)
    }

    /// Deliver a betting action for the seat at the front of the queue.
    pub fn act(&mut self, seat: SeatIndex, action: Action) -> Result<(), RoundError> {
        if self.is_over() {
            return Err(RoundError::BettingClosed);
        }
        if self.next_to_act() != Some(seat) {
            return Err(RoundError::OutOfTurnAction(seat));
        }
        let to_call = self.data.pot.call_amount(seat);
        let chips = self.data.players[seat].user.chips;
        match action {
            Action::Fold => {
                self.state.queue.pop_front();
                self.data.players[seat].folded = true;
                if self.data.active_seats().len() <= 1 {
                    // Hand is uncontested; no further responses owed.
                    self.state.queue.clear();
                }
            }
            Action::Check => {
                if to_call != 0 {
                    return Err(RoundError::InvalidAction { action, to_call });
                }
                self.state.queue.pop_front();
            }
            Action::Call => {
                // A short stack calls for whatever it has left.
                self.state.queue.pop_front();
                self.pay(seat, to_call.min(chips));
            }
            Action::Bet(amount) | Action::Raise(amount) => {
                if amount == 0 || to_call + amount > chips {
                    return Err(RoundError::InvalidBet { amount });
                }
                self.state.queue.pop_front();
                self.pay(seat, to_call + amount);
                self.reopen(seat);
            }
            Action::AllIn => {
                self.state.queue.pop_front();
                self.pay(seat, chips);
                if chips > to_call {
                    self.reopen(seat);
                }
            }
        }
        let name = self.data.players[seat].user.name.clone();
        self.data
            .events
            .push_back(RoundEvent::TookAction(name, action));
        Ok(())
    }

    /// Play a held Knight or Queen: the mod burns, betting terminates, and
    /// the round resolves under the force flag.
    pub fn play_mod(&mut self, seat: SeatIndex, kind: ModKind) -> Result<(), RoundError> {
        let spec = kind.spec();
        if spec.trigger != TriggerPhase::OnPlay {
            return Err(RoundError::ModNotPlayable { kind });
        }
        let player = self.data.player_mut(seat)?;
        let mut card = player
            .hand
            .take_mod(kind)
            .ok_or(RoundError::ModNotHeld { seat, kind })?;
        card.burn();
        let name = player.user.name.clone();
        self.data.discard.mods.push(card);
        match spec.effect {
            ModEffect::ForceShowdown => {
                self.data.forced = Some(ForcedResolution::Showdown);
                self.data.events.push_back(RoundEvent::ForcedShowdown);
            }
            ModEffect::ForcePayout => {
                self.data.forced = Some(ForcedResolution::Payout);
                self.data.events.push_back(RoundEvent::ForcedPayout);
            }
            _ => {}
        }
        self.data
            .events
            .push_back(RoundEvent::ModPlayed(name, kind));
        self.state.queue.clear();
        Ok(())
    }

    fn pay(&mut self, seat: SeatIndex, amount: Chips) {
        self.data.players[seat].user.chips -= amount;
        self.data.pot.bet(seat, amount);
    }

    /// After a raise, every other live seat owes a response, rotating from
    /// the raiser.
    fn reopen(&mut self, raiser: SeatIndex) {
        let n = self.data.players.len();
        let mut queue = VecDeque::with_capacity(n);
        for offset in 1..n {
            let seat = (raiser + offset) % n;
            let player = &self.data.players[seat];
            if player.is_active() && player.user.chips > 0 {
                queue.push_back(seat);
            }
        }
        self.state.queue = queue;
    }
}

impl Round<Abilities> {
    /// Apply the ability collaborator's mutations. The machine validates
    /// indices and nothing else; rationale is the collaborator's business.
    pub fn apply(&mut self, mutations: Vec<HandMutation>) -> Result<(), RoundError> {
        for mutation in mutations {
            match mutation {
                HandMutation::Transfer { from, to, card_idx } => {
                    if from == to
                        || from >= self.data.players.len()
                        || to >= self.data.players.len()
                        || card_idx >= self.data.players[from].hand.real_count()
                    {
                        return Err(RoundError::InvalidMutation(mutation));
                    }
                    let card = self.data.players[from].hand.reals.remove(card_idx);
                    self.data.players[to].hand.reals.push(card);
                }
                HandMutation::Reveal { seat, card_idx } => {
                    let player = self.data.player_mut(seat)?;
                    if card_idx >= player.hand.real_count() {
                        return Err(RoundError::InvalidMutation(mutation));
                    }
                    player.revealed.insert(card_idx);
                }
            }
        }
        Ok(())
    }
}

impl Round<Showdown> {
    /// Evaluate every non-folded hand and record the winner(s). Unplayed
    /// Knights burn on entry.
    fn resolve(&mut self) -> Result<(), RoundError> {
        self.data.burn_held(ModKind::Knight);
        let mut results = Vec::new();
        for seat in self.data.active_seats() {
            let result = functional::eval(&self.data.players[seat].hand.reals)?;
            let name = self.data.players[seat].user.name.clone();
            self.data
                .events
                .push_back(RoundEvent::HandScored(name, result.clone()));
            results.push((seat, result));
        }
        let ranked: Vec<HandResult> = results.iter().map(|(_, r)| r.clone()).collect();
        let winners = functional::argmax(&ranked)
            .into_iter()
            .map(|i| results[i].0)
            .collect();
        self.data.outcome = Some(ShowdownOutcome {
            winners,
            results,
            points: Vec::new(),
        });
        Ok(())
    }
}

impl Round<Payout> {
    /// Split the pot among the winners (floor split, remainder to the
    /// earliest-position winner), pay dividends, award round points, and
    /// move every still-held mod to discard — by now each has had its
    /// trigger window. Unplayed Queens burn on entry.
    fn resolve(&mut self) {
        self.data.burn_held(ModKind::Queen);
        let outcome = self.data.outcome.clone();
        let winners = outcome.as_ref().map(|o| o.winners.clone()).unwrap_or_default();

        if winners.is_empty() {
            // Everyone folded out; investments go home.
            for (seat, amount) in std::mem::take(&mut self.data.pot.investments) {
                if let Some(player) = self.data.players.get_mut(seat) {
                    player.user.chips += amount;
                    let name = player.user.name.clone();
                    self.data
                        .events
                        .push_back(RoundEvent::PotRefunded(name, amount));
                }
            }
        } else {
            let total = self.data.pot.take();
            let share = total / winners.len() as Chips;
            let remainder = total % winners.len() as Chips;
            let mut points = Vec::with_capacity(winners.len());
            for (i, &seat) in winners.iter().enumerate() {
                let amount = share + if i == 0 { remainder } else { 0 };
                let player = &mut self.data.players[seat];
                player.user.chips += amount;
                let name = player.user.name.clone();
                self.data
                    .events
                    .push_back(RoundEvent::SplitPot(name, amount));

                while let Some(mut card) =
                    self.data.players[seat].hand.take_mod(ModKind::RoyalDividend)
                {
                    card.burn();
                    if let ModEffect::GainChips(dividend) = card.kind.spec().effect {
                        self.data.players[seat].user.chips += dividend;
                        let name = self.data.players[seat].user.name.clone();
                        self.data
                            .events
                            .push_back(RoundEvent::DividendPaid(name, dividend));
                    }
                    self.data.discard.mods.push(card);
                }

                let category = outcome
                    .as_ref()
                    .and_then(|o| o.results.iter().find(|(s, _)| *s == seat))
                    .map(|(_, r)| r.category);
                let awarded = match category {
                    Some(HandCategory::FiveOfAKind | HandCategory::FlushFive) => {
                        HIGH_TIER_WIN_POINTS
                    }
                    _ => WIN_POINTS,
                };
                points.push((seat, awarded));
                let name = self.data.players[seat].user.name.clone();
                self.data
                    .events
                    .push_back(RoundEvent::PointsAwarded(name, awarded));
            }
            if let Some(o) = self.data.outcome.as_mut() {
                o.points = points;
            }
        }

        for seat in 0..self.data.players.len() {
            let mods = self.data.players[seat].hand.drain_mods();
            self.data.discard.mods.extend(mods);
        }
    }
}

impl Round<Redistribution> {
    /// End-of-round mod draws: each winner takes two, every other
    /// non-folded player one, folded players none. Draws fail closed; a
    /// short deck is logged and the round proceeds.
    fn resolve(&mut self) {
        let winners = self
            .data
            .outcome
            .as_ref()
            .map(|o| o.winners.clone())
            .unwrap_or_default();
        for seat in 0..self.data.players.len() {
            let entitlement = if !self.data.players[seat].is_active() {
                0
            } else if winners.contains(&seat) {
                WINNER_MOD_DRAWS
            } else {
                ACTIVE_MOD_DRAWS
            };
            if entitlement == 0 {
                continue;
            }
            let drawn = self.data.deck.draw_mods_up_to(entitlement);
            if drawn.len() < entitlement {
                warn!(
                    "mod redistribution shortfall: seat {seat} entitled to {entitlement}, drew {}",
                    drawn.len()
                );
                self.data.events.push_back(RoundEvent::ModShortfall {
                    requested: entitlement,
                    drawn: drawn.len(),
                });
            }
            self.data.players[seat].hand.mods.extend(drawn);
        }
    }
}

impl Round<DeckCycle> {
    /// Return every real card and discarded mod to the deck, rebalance mod
    /// circulation to the seated-player target, and reshuffle.
    fn resolve(&mut self) {
        let data = &mut self.data;
        for seat in 0..data.players.len() {
            let reals = data.players[seat].hand.drain_reals();
            data.deck.return_reals(reals);
        }
        data.deck.return_reals(data.discard.reals.drain(..));

        let returned = data.discard.mods.len();
        data.deck.return_mods(data.discard.mods.drain(..));

        // The pile is restored to the seated-player ratio; mods carried in
        // hands from redistribution ride on top of it.
        let target = mod_circulation_target(data.seated());
        let (replenished, retired) = data.deck.balance_mods(target);
        data.deck.shuffle();

        if data.deck.reals_remaining() != REAL_DECK_SIZE {
            error!(
                "real-card count drifted: {} in deck after cycle",
                data.deck.reals_remaining()
            );
        }
        debug_assert_eq!(data.deck.reals_remaining(), REAL_DECK_SIZE);

        data.events.push_back(RoundEvent::DeckCycled {
            returned,
            replenished,
            retired,
        });
    }
}

/// The round FSM: one variant per phase.
#[enum_dispatch(RoundStateManagement)]
#[derive(Debug)]
pub enum RoundPhase {
    Dealing(Round<Dealing>),
    ModEffects(Round<ModEffects>),
    Betting(Round<Betting>),
    Abilities(Round<Abilities>),
    Showdown(Round<Showdown>),
    Payout(Round<Payout>),
    Redistribution(Round<Redistribution>),
    DeckCycle(Round<DeckCycle>),
    Complete(Round<Complete>),
}

impl RoundPhase {
    #[must_use]
    pub fn new(data: RoundData) -> Self {
        Round {
            data,
            state: Dealing::default(),
        }
        .into()
    }

    /// Advance one phase. Betting parks until the collaborator input
    /// arrives; a deck or evaluator failure aborts with the data
    /// recovered.
    pub fn step(self) -> Result<Self, RoundAbort> {
        match self {
            Self::Dealing(mut round) => match round.deal() {
                Ok(()) => Ok(Round::<ModEffects>::from(round).into()),
                Err(error) => Err(RoundAbort {
                    error,
                    data: round.data,
                }),
            },
            Self::ModEffects(mut round) => {
                round.resolve_deal_mods();
                Ok(Round::<Betting>::from(round).into())
            }
            Self::Betting(round) => {
                if !round.is_over() {
                    return Ok(Self::Betting(round));
                }
                if round.data.forced.is_some() {
                    Ok(Round::<Showdown>::from(round).into())
                } else {
                    Ok(Round::<Abilities>::from(round).into())
                }
            }
            Self::Abilities(round) => Ok(Round::<Showdown>::from(round).into()),
            Self::Showdown(mut round) => match round.resolve() {
                Ok(()) => Ok(Round::<Payout>::from(round).into()),
                Err(error) => Err(RoundAbort {
                    error,
                    data: round.data,
                }),
            },
            Self::Payout(mut round) => {
                round.resolve();
                Ok(Round::<Redistribution>::from(round).into())
            }
            Self::Redistribution(mut round) => {
                round.resolve();
                Ok(Round::<DeckCycle>::from(round).into())
            }
            Self::DeckCycle(mut round) => {
                round.resolve();
                Ok(Round::<Complete>::from(round).into())
            }
            Self::Complete(round) => Ok(Self::Complete(round)),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    #[must_use]
    pub fn phase_name(&self) -> &'static str {
        match self {
            Self::Dealing(_) => "dealing",
            Self::ModEffects(_) => "mod_effects",
            Self::Betting(_) => "betting",
            Self::Abilities(_) => "abilities",
            Self::Showdown(_) => "showdown",
            Self::Payout(_) => "payout",
            Self::Redistribution(_) => "redistribution",
            Self::DeckCycle(_) => "deck_cycle",
            Self::Complete(_) => "complete",
        }
    }

    #[must_use]
    pub fn data(&self) -> &RoundData {
        match self {
            Self::Dealing(r) => &r.data,
            Self::ModEffects(r) => &r.data,
            Self::Betting(r) => &r.data,
            Self::Abilities(r) => &r.data,
            Self::Showdown(r) => &r.data,
            Self::Payout(r) => &r.data,
            Self::Redistribution(r) => &r.data,
            Self::DeckCycle(r) => &r.data,
            Self::Complete(r) => &r.data,
        }
    }

    #[must_use]
    pub fn into_data(self) -> RoundData {
        match self {
            Self::Dealing(r) => r.data,
            Self::ModEffects(r) => r.data,
            Self::Betting(r) => r.data,
            Self::Abilities(r) => r.data,
            Self::Showdown(r) => r.data,
            Self::Payout(r) => r.data,
            Self::Redistribution(r) => r.data,
            Self::DeckCycle(r) => r.data,
            Self::Complete(r) => r.data,
        }
    }

    /// Serializable snapshot: deck contents, hand pools, flags, and the
    /// phase label — enough to resume deterministically with a fresh seed.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        let data = self.data();
        RoundSnapshot {
            phase: self.phase_name().to_string(),
            deck: data.deck.snapshot(),
            players: data.players.clone(),
            pot: data.pot.clone(),
            discard: data.discard.clone(),
            forced: data.forced,
            outcome: data.outcome.clone(),
            settings: data.settings,
        }
    }
}

/// Serializable round state for session persistence.
#[derive(Debug, Deserialize, Serialize)]
pub struct RoundSnapshot {
    pub phase: String,
    pub deck: DeckSnapshot,
    pub players: Vec<PlayerRound>,
    pub pot: Pot,
    pub discard: Discard,
    pub forced: Option<ForcedResolution>,
    pub outcome: Option<ShowdownOutcome>,
    pub settings: GameSettings,
}

impl RoundSnapshot {
    /// Rebuild the round at the snapshotted phase. Betting resumes at the
    /// top of its rotation.
    pub fn restore(self, seed: u64) -> Result<RoundPhase, RoundError> {
        let data = RoundData {
            deck: self.deck.restore(seed),
            players: self.players,
            pot: self.pot,
            discard: self.discard,
            forced: self.forced,
            outcome: self.outcome,
            events: VecDeque::new(),
            settings: self.settings,
        };
        let phase = match self.phase.as_str() {
            "dealing" => Round {
                data,
                state: Dealing::default(),
            }
            .into(),
            "mod_effects" => Round {
                data,
                state: ModEffects::default(),
            }
            .into(),
            "betting" => {
                let queue = data.active_seats().into();
                Round {
                    data,
                    state: Betting { queue },
                }
                .into()
            }
            "abilities" => Round {
                data,
                state: Abilities::default(),
            }
            .into(),
            "showdown" => Round {
                data,
                state: Showdown::default(),
            }
            .into(),
            "payout" => Round {
                data,
                state: Payout::default(),
            }
            .into(),
            "redistribution" => Round {
                data,
                state: Redistribution::default(),
            }
            .into(),
            "deck_cycle" => Round {
                data,
                state: DeckCycle::default(),
            }
            .into(),
            "complete" => Round {
                data,
                state: Complete::default(),
            }
            .into(),
            _ => return Err(RoundError::UnknownPhase(self.phase.clone())),
        };
        Ok(phase)
    }
}
