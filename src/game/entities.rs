use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeSet, collections::HashMap, fmt};
use thiserror::Error;

use super::constants::{self, JOKERS_PER_DECK, REAL_DECK_SIZE};
use super::mods::{ModCard, ModKind};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
    // Wild is the joker's suit; a joker settles on a concrete suit only
    // during evaluation.
    Wild,
}

impl Suit {
    pub const REAL: [Self; 4] = [Self::Club, Self::Spade, Self::Diamond, Self::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Wild => "w",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// Value reserved for jokers.
pub const JOKER_VALUE: Value = 0;

/// A card is a tuple of a uInt8 value (two=2u8 ... ace=14u8) and a suit.
/// A joker is depicted as 0u8 with the wild suit; it carries no rank or
/// suit of its own until evaluation resolves it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub const JOKER: Self = Self(JOKER_VALUE, Suit::Wild);

    #[must_use]
    pub const fn is_joker(&self) -> bool {
        self.0 == JOKER_VALUE
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            JOKER_VALUE => "Jo",
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Type alias for whole chips. All antes, bets, and player stacks are
/// represented as whole chips.
pub type Chips = u32;

pub const DEFAULT_STARTING_CHIPS: Chips = 100;
pub const DEFAULT_ANTE: Chips = 2;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        username.truncate(constants::MAX_USERNAME_LENGTH);
        Self(username)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Type alias for seat positions during a round.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub name: Username,
    pub chips: Chips,
}

/// Betting actions delivered into the round state machine from the betting
/// collaborator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    AllIn,
    Bet(Chips),
    Call,
    Check,
    Fold,
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-ins".to_string(),
            Self::Bet(amount) => format!("bets {amount}"),
            Self::Call => "calls".to_string(),
            Self::Check => "checks".to_string(),
            Self::Fold => "folds".to_string(),
            Self::Raise(amount) => format!("raises {amount}"),
        };
        write!(f, "{repr}")
    }
}

/// A player's hand for the round: real cards eligible for evaluation plus
/// held mod cards. Both occupy the same 8 slots at the deal.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct HandPool {
    pub reals: Vec<Card>,
    pub mods: Vec<ModCard>,
}

impl HandPool {
    #[must_use]
    pub fn real_count(&self) -> usize {
        self.reals.len()
    }

    #[must_use]
    pub fn mod_count(&self) -> usize {
        self.mods.len()
    }

    #[must_use]
    pub fn holds(&self, kind: ModKind) -> bool {
        self.mods.iter().any(|m| m.kind == kind && !m.consumed)
    }

    /// Remove and return the first unconsumed mod of the given kind.
    pub fn take_mod(&mut self, kind: ModKind) -> Option<ModCard> {
        let idx = self
            .mods
            .iter()
            .position(|m| m.kind == kind && !m.consumed)?;
        Some(self.mods.remove(idx))
    }

    pub fn drain_mods(&mut self) -> Vec<ModCard> {
        std::mem::take(&mut self.mods)
    }

    pub fn drain_reals(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.reals)
    }
}

/// Per-round player state. Fold and cooldown flags feed showdown,
/// redistribution, and the ability boundary.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerRound {
    pub user: User,
    pub seat_idx: SeatIndex,
    pub folded: bool,
    /// Set for exactly the round after a fold; collaborators read it
    /// through the table view.
    pub ability_on_cooldown: bool,
    pub hand: HandPool,
    /// Indices into `hand.reals` revealed by ability mutations.
    pub revealed: BTreeSet<usize>,
}

impl PlayerRound {
    #[must_use]
    pub fn new(user: User, seat_idx: SeatIndex) -> Self {
        Self {
            user,
            seat_idx,
            folded: false,
            ability_on_cooldown: false,
            hand: HandPool::default(),
            revealed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.folded
    }

    /// Roll this player into the next round: a fold becomes one round of
    /// ability cooldown, then clears.
    pub fn advance_round(&mut self) {
        self.ability_on_cooldown = self.folded;
        self.folded = false;
        self.revealed.clear();
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pot {
    // Map seat indices to their investment in the pot.
    pub investments: HashMap<SeatIndex, Chips>,
}

impl Default for Pot {
    fn default() -> Self {
        Self::new(constants::MAX_PLAYERS)
    }
}

impl Pot {
    #[must_use]
    pub fn new(max_players: usize) -> Self {
        Self {
            investments: HashMap::with_capacity(max_players),
        }
    }

    pub fn bet(&mut self, seat_idx: SeatIndex, amount: Chips) {
        let investment = self.investments.entry(seat_idx).or_default();
        *investment += amount;
    }

    #[must_use]
    pub fn get_call(&self) -> Chips {
        *self.investments.values().max().unwrap_or(&0)
    }

    /// Amount the seat must still put in to match the highest investment.
    #[must_use]
    pub fn call_amount(&self, seat_idx: SeatIndex) -> Chips {
        self.get_call() - self.investment(seat_idx)
    }

    #[must_use]
    pub fn investment(&self, seat_idx: SeatIndex) -> Chips {
        *self.investments.get(&seat_idx).unwrap_or(&0)
    }

    #[must_use]
    pub fn size(&self) -> Chips {
        self.investments.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Empty the pot for payout, returning its total.
    pub fn take(&mut self) -> Chips {
        let total = self.size();
        self.investments.clear();
        total
    }
}

#[derive(Debug, Deserialize, Error, Eq, PartialEq, Serialize)]
pub enum DeckError {
    #[error("deck exhausted: requested {requested}, {available} available")]
    Exhausted { requested: usize, available: usize },
}

/// The deck: a real-card pile (constant 54-card composition), a mod pile,
/// and an out-of-circulation mod reserve that deck cycling draws from.
///
/// The deck owns the round's random source. Construction with
/// [`Deck::seeded`] makes every shuffle and roll reproducible.
#[derive(Debug)]
pub struct Deck {
    reals: Vec<Card>,
    mods: Vec<ModCard>,
    reserve: Vec<ModCard>,
    rng: StdRng,
}

impl Deck {
    /// Fresh deck with an entropy-seeded random source. All mods start in
    /// the reserve; the round state machine balances them into circulation.
    #[must_use]
    pub fn new(mod_set: Vec<ModCard>) -> Self {
        Self::with_rng(mod_set, StdRng::from_os_rng())
    }

    /// Fresh deck with a reproducible random source.
    #[must_use]
    pub fn seeded(mod_set: Vec<ModCard>, seed: u64) -> Self {
        Self::with_rng(mod_set, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mod_set: Vec<ModCard>, rng: StdRng) -> Self {
        Self {
            reals: Self::standard_reals(),
            mods: Vec::with_capacity(mod_set.len()),
            reserve: mod_set,
            rng,
        }
    }

    fn standard_reals() -> Vec<Card> {
        let mut cards = Vec::with_capacity(REAL_DECK_SIZE);
        for value in 2..=14u8 {
            for suit in Suit::REAL {
                cards.push(Card(value, suit));
            }
        }
        cards.extend(std::iter::repeat_n(Card::JOKER, JOKERS_PER_DECK));
        cards
    }

    pub fn shuffle(&mut self) {
        self.reals.shuffle(&mut self.rng);
        self.mods.shuffle(&mut self.rng);
    }

    /// Random index below `bound`, from the deck's own source. Used by
    /// effects that pick cards or opponents at random.
    pub(crate) fn roll(&mut self, bound: usize) -> usize {
        self.rng.random_range(0..bound)
    }

    // The top of each pile is the end of its vec.

    pub fn draw_reals(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if self.reals.len() < n {
            return Err(DeckError::Exhausted {
                requested: n,
                available: self.reals.len(),
            });
        }
        Ok(self.reals.split_off(self.reals.len() - n))
    }

    pub fn draw_mods(&mut self, n: usize) -> Result<Vec<ModCard>, DeckError> {
        if self.mods.len() < n {
            return Err(DeckError::Exhausted {
                requested: n,
                available: self.mods.len(),
            });
        }
        Ok(self.mods.split_off(self.mods.len() - n))
    }

    /// Partial-fulfillment draw used by redistribution: returns up to `n`
    /// mods, however many remain.
    pub fn draw_mods_up_to(&mut self, n: usize) -> Vec<ModCard> {
        let n = n.min(self.mods.len());
        self.mods.split_off(self.mods.len() - n)
    }

    /// Append real cards without shuffling; callers shuffle before the
    /// next draw.
    pub fn return_reals(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.reals.extend(cards);
    }

    /// Append mods without shuffling. Returned mods come back fresh.
    pub fn return_mods(&mut self, mods: impl IntoIterator<Item = ModCard>) {
        self.mods.extend(mods.into_iter().map(|mut m| {
            m.consumed = false;
            m
        }));
    }

    /// Adjust the mod pile to `target` cards by drawing from or retiring to
    /// the reserve. Returns `(replenished, retired)`.
    pub fn balance_mods(&mut self, target: usize) -> (usize, usize) {
        if self.mods.len() < target {
            let deficit = (target - self.mods.len()).min(self.reserve.len());
            let fresh = self.reserve.split_off(self.reserve.len() - deficit);
            self.mods.extend(fresh);
            (deficit, 0)
        } else {
            let surplus = self.mods.len() - target;
            let retired = self.mods.split_off(self.mods.len() - surplus);
            self.reserve.extend(retired);
            (0, surplus)
        }
    }

    #[must_use]
    pub fn reals_remaining(&self) -> usize {
        self.reals.len()
    }

    #[must_use]
    pub fn mods_remaining(&self) -> usize {
        self.mods.len()
    }

    #[must_use]
    pub fn reserve_remaining(&self) -> usize {
        self.reserve.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            reals: self.reals.clone(),
            mods: self.mods.clone(),
            reserve: self.reserve.clone(),
        }
    }
}

/// Serializable deck contents. Restoring pairs the contents with a fresh
/// seed, which is enough to resume deterministically.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeckSnapshot {
    pub reals: Vec<Card>,
    pub mods: Vec<ModCard>,
    pub reserve: Vec<ModCard>,
}

impl DeckSnapshot {
    #[must_use]
    pub fn restore(self, seed: u64) -> Deck {
        Deck {
            reals: self.reals,
            mods: self.mods,
            reserve: self.reserve,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Read-only table state handed to the ability collaborator before
/// showdown. Hidden cards stay hidden; only revealed indices surface.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TableView {
    pub seats: Vec<SeatView>,
    pub pot_size: Chips,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeatView {
    pub user: User,
    pub folded: bool,
    pub ability_on_cooldown: bool,
    pub real_count: usize,
    pub mod_count: usize,
    pub revealed: Vec<Card>,
}
