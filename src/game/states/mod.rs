//! Round phase definitions for the mod-poker FSM.
//!
//! Each state represents one phase of the round lifecycle. Betting and
//! Abilities are the external trigger points: the machine waits there for
//! collaborator input before stepping on.

use std::collections::VecDeque;

use crate::game::entities::SeatIndex;

/// Dealing the guaranteed mod card and real cards to seated players
#[derive(Debug, Default)]
pub struct Dealing {}

/// Resolving immediate-on-deal mod effects (draws, then swaps)
#[derive(Debug, Default)]
pub struct ModEffects {}

/// Waiting on the betting collaborator; folds and mod plays land here
#[derive(Debug, Default)]
pub struct Betting {
    /// Seats still owing a response, front first.
    pub(crate) queue: VecDeque<SeatIndex>,
}

/// Waiting on the ability collaborator's hand-pool mutations
#[derive(Debug, Default)]
pub struct Abilities {}

/// Comparing non-folded hands; unplayed Knights burn on entry
#[derive(Debug, Default)]
pub struct Showdown {}

/// Splitting the pot among winner(s); unplayed Queens burn on entry
#[derive(Debug, Default)]
pub struct Payout {}

/// End-of-round mod draws by fold/win status
#[derive(Debug, Default)]
pub struct Redistribution {}

/// Returning discards and rebalancing mod circulation
#[derive(Debug, Default)]
pub struct DeckCycle {}

/// Round finished; data ready for extraction
#[derive(Debug, Default)]
pub struct Complete {}
