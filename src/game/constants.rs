//! Table, hand-size, and mod-economy constants.

/// Total slots in a player's hand, shared between real cards and mod cards.
pub const TOTAL_HAND_SIZE: usize = 8;

/// Fewest real cards a deal may leave a player holding.
pub const MIN_REAL_CARDS: usize = 5;

/// Most real cards a deal may leave a player holding.
pub const MAX_REAL_CARDS: usize = 8;

/// Cards used by the evaluator to score a hand.
pub const EVAL_HAND_SIZE: usize = 5;

/// Mod cards guaranteed to every seated player at the deal.
pub const GUARANTEED_MOD_DEAL: usize = 1;

/// Mod cards the round winner draws during redistribution.
pub const WINNER_MOD_DRAWS: usize = 2;

/// Mod cards every other non-folded player draws during redistribution.
pub const ACTIVE_MOD_DRAWS: usize = 1;

/// Seat-group granularity for the mod circulation ratio.
pub const SEAT_GROUP_SIZE: usize = 4;

/// Mod cards kept in circulation per (possibly partial) seat group.
pub const MODS_PER_SEAT_GROUP: usize = 4;

/// Jokers mixed into the real deck.
pub const JOKERS_PER_DECK: usize = 2;

/// Real cards in circulation: a standard 52-card deck plus the jokers.
pub const REAL_DECK_SIZE: usize = 52 + JOKERS_PER_DECK;

pub const MAX_PLAYERS: usize = 8;

/// Round points for winning with a top-tier hand (Five of a Kind or
/// Flush Five).
pub const HIGH_TIER_WIN_POINTS: u32 = 2;

/// Round points for any other winning hand.
pub const WIN_POINTS: u32 = 1;

pub const MAX_USERNAME_LENGTH: usize = 16;

/// Mod cards that should be circulating (deck pile + held in hands) for a
/// given seated-player count. Partial seat groups round up, so any table up
/// to [`MAX_PLAYERS`] can satisfy the guaranteed per-deal mod.
#[must_use]
pub const fn mod_circulation_target(seated_players: usize) -> usize {
    seated_players.div_ceil(SEAT_GROUP_SIZE) * MODS_PER_SEAT_GROUP
}
