//! Mod card catalog and effect registry.
//!
//! The registry is pure data: each [`ModKind`] maps to a trigger phase, a
//! scope, and an effect description. Applying an effect (moving cards,
//! adjusting chips, forcing a phase) is the round state machine's job; the
//! registry never mutates anything.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::Chips;

/// Chips granted by Royal Dividend when its holder wins the round.
pub const ROYAL_DIVIDEND_CHIPS: Chips = 3;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ModKind {
    ExtraDraw,
    SneakySwap,
    Knight,
    Queen,
    RoyalDividend,
}

/// Phase in which a mod's effect fires.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TriggerPhase {
    /// Resolves automatically right after the deal.
    OnDeal,
    /// Must be played by its holder during betting.
    OnPlay,
    /// Resolves (or burns unplayed) upon entering showdown.
    Showdown,
    /// Resolves (or burns unplayed) upon entering payout.
    Payout,
}

/// Whether an effect touches one hand or the whole table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ModScope {
    Player,
    Table,
}

/// What the round state machine does when the mod fires.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ModEffect {
    /// Draw this many real cards into the holder's pool.
    DrawReal(usize),
    /// Swap one random real card with a random opponent card.
    SwapRandomCard,
    /// Terminate betting and enter showdown this round.
    ForceShowdown,
    /// Terminate betting and guarantee payout resolution this round.
    ForcePayout,
    /// Grant the winning holder chips at payout.
    GainChips(Chips),
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

/// Registry entry for one mod kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModSpec {
    pub trigger: TriggerPhase,
    pub scope: ModScope,
    pub effect: ModEffect,
    pub rarity: Rarity,
}

impl ModKind {
    /// Look up the registry entry for this kind.
    #[must_use]
    pub const fn spec(self) -> ModSpec {
        match self {
            Self::ExtraDraw => ModSpec {
                trigger: TriggerPhase::OnDeal,
                scope: ModScope::Player,
                effect: ModEffect::DrawReal(1),
                rarity: Rarity::Common,
            },
            Self::SneakySwap => ModSpec {
                trigger: TriggerPhase::OnDeal,
                scope: ModScope::Player,
                effect: ModEffect::SwapRandomCard,
                rarity: Rarity::Uncommon,
            },
            Self::Knight => ModSpec {
                trigger: TriggerPhase::OnPlay,
                scope: ModScope::Table,
                effect: ModEffect::ForceShowdown,
                rarity: Rarity::Rare,
            },
            Self::Queen => ModSpec {
                trigger: TriggerPhase::OnPlay,
                scope: ModScope::Table,
                effect: ModEffect::ForcePayout,
                rarity: Rarity::Rare,
            },
            Self::RoyalDividend => ModSpec {
                trigger: TriggerPhase::Payout,
                scope: ModScope::Player,
                effect: ModEffect::GainChips(ROYAL_DIVIDEND_CHIPS),
                rarity: Rarity::Uncommon,
            },
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExtraDraw => "Extra Draw",
            Self::SneakySwap => "Sneaky Swap",
            Self::Knight => "Knight",
            Self::Queen => "Queen",
            Self::RoyalDividend => "Royal Dividend",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ExtraDraw => "draw 1 card",
            Self::SneakySwap => "swap a card with an opponent",
            Self::Knight => "force showdown this round",
            Self::Queen => "force payout this round",
            Self::RoyalDividend => "gain +3 chips on winning",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::ExtraDraw,
            Self::SneakySwap,
            Self::Knight,
            Self::Queen,
            Self::RoyalDividend,
        ]
    }
}

impl fmt::Display for ModKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A mod card instance, owned by the deck, a hand pool, or the discard pile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ModCard {
    pub kind: ModKind,
    /// Set once the effect fires; cleared when the card returns to the deck.
    pub consumed: bool,
}

impl ModCard {
    #[must_use]
    pub const fn new(kind: ModKind) -> Self {
        Self {
            kind,
            consumed: false,
        }
    }

    pub const fn burn(&mut self) {
        self.consumed = true;
    }
}

impl fmt::Display for ModCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.consumed {
            write!(f, "{} (burned)", self.kind)
        } else {
            self.kind.fmt(f)
        }
    }
}

/// Default mod multiset for a full table, weighted by rarity. Large enough
/// to cover the circulation target for [`crate::constants::MAX_PLAYERS`]
/// seats with a reserve left over for deck cycling.
#[must_use]
pub fn standard_mod_set() -> Vec<ModCard> {
    let mut mods = Vec::with_capacity(14);
    for (kind, copies) in [
        (ModKind::ExtraDraw, 4),
        (ModKind::SneakySwap, 3),
        (ModKind::RoyalDividend, 3),
        (ModKind::Knight, 2),
        (ModKind::Queen, 2),
    ] {
        mods.extend(std::iter::repeat_n(ModCard::new(kind), copies));
    }
    mods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{MAX_PLAYERS, mod_circulation_target};

    #[test]
    fn test_registry_trigger_phases() {
        assert_eq!(ModKind::ExtraDraw.spec().trigger, TriggerPhase::OnDeal);
        assert_eq!(ModKind::SneakySwap.spec().trigger, TriggerPhase::OnDeal);
        assert_eq!(ModKind::Knight.spec().trigger, TriggerPhase::OnPlay);
        assert_eq!(ModKind::Queen.spec().trigger, TriggerPhase::OnPlay);
        assert_eq!(ModKind::RoyalDividend.spec().trigger, TriggerPhase::Payout);
    }

    #[test]
    fn test_registry_scopes() {
        assert_eq!(ModKind::Knight.spec().scope, ModScope::Table);
        assert_eq!(ModKind::Queen.spec().scope, ModScope::Table);
        assert_eq!(ModKind::ExtraDraw.spec().scope, ModScope::Player);
    }

    #[test]
    fn test_registry_effects() {
        assert_eq!(ModKind::ExtraDraw.spec().effect, ModEffect::DrawReal(1));
        assert_eq!(
            ModKind::RoyalDividend.spec().effect,
            ModEffect::GainChips(ROYAL_DIVIDEND_CHIPS)
        );
    }

    #[test]
    fn test_burn_sets_consumed() {
        let mut card = ModCard::new(ModKind::Knight);
        assert!(!card.consumed);
        card.burn();
        assert!(card.consumed);
    }

    #[test]
    fn test_standard_mod_set_covers_full_table() {
        let mods = standard_mod_set();
        assert!(mods.len() >= mod_circulation_target(MAX_PLAYERS));
        assert!(mods.iter().all(|m| !m.consumed));
    }

    #[test]
    fn test_standard_mod_set_contains_every_kind() {
        let mods = standard_mod_set();
        for kind in ModKind::all() {
            assert!(mods.iter().any(|m| m.kind == kind), "missing {kind}");
        }
    }

    #[test]
    fn test_mod_kind_display() {
        assert_eq!(format!("{}", ModKind::ExtraDraw), "Extra Draw");
        assert_eq!(format!("{}", ModKind::RoyalDividend), "Royal Dividend");
    }

    #[test]
    fn test_mod_card_display_burned() {
        let mut card = ModCard::new(ModKind::Queen);
        card.burn();
        assert_eq!(format!("{card}"), "Queen (burned)");
    }
}
