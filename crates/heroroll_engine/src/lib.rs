use std::collections::{HashMap, HashSet};

use heroroll_model::hero::{HeroName, RoleFilter, Roster};
use heroroll_model::history::PickHistory;
use heroroll_model::PlayerSlot;
use rand::seq::SliceRandom;
use rand::Rng;

mod roller;

pub use roller::{RollOutcome, RollSchedule, Roller};

/// One candidate pick per participating player, in slot order. `None` means
/// the player's pool was empty at draw time.
pub type Assignment = Vec<(PlayerSlot, Option<HeroName>)>;

fn flagged(map: &HashMap<HeroName, bool>, name: &HeroName) -> bool {
    map.get(name).copied().unwrap_or(false)
}

/// The filters shared by every player in a roll. Per-player inputs (role,
/// completion) are passed to [`EligibilityResolver::eligible`].
pub struct EligibilityResolver<'a> {
    roster: &'a Roster,
    banned: &'a HashMap<HeroName, bool>,
    challenge_mode: bool,
    no_repeat: bool,
    history: &'a PickHistory,
}

impl<'a> EligibilityResolver<'a> {
    pub fn new(
        roster: &'a Roster,
        banned: &'a HashMap<HeroName, bool>,
        challenge_mode: bool,
        no_repeat: bool,
        history: &'a PickHistory,
    ) -> Self {
        EligibilityResolver {
            roster,
            banned,
            challenge_mode,
            no_repeat,
            history,
        }
    }

    /// Heroes the player may legally receive right now, in roster order.
    /// An empty result is a normal outcome, not an error: it means the player
    /// cannot roll.
    ///
    /// The no-repeat filter relaxes itself rather than empty the pool —
    /// repeats beat "no valid hero".
    pub fn eligible(
        &self,
        filter: RoleFilter,
        completed: &HashMap<HeroName, bool>,
    ) -> Vec<HeroName> {
        let mut pool: Vec<HeroName> = self
            .roster
            .with_filter(filter)
            .map(|h| h.name.clone())
            .filter(|n| !flagged(self.banned, n))
            .collect();
        if self.challenge_mode {
            pool.retain(|n| !flagged(completed, n));
        }
        if !self.no_repeat {
            return pool;
        }
        let fresh: Vec<HeroName> = pool
            .iter()
            .filter(|n| !self.history.contains(n))
            .cloned()
            .collect();
        if fresh.is_empty() {
            pool
        } else {
            fresh
        }
    }
}

/// Draws one hero per player, uniformly at random from that player's pool.
///
/// Players draw in slot order. Heroes claimed by earlier players are avoided
/// when the remainder of the pool allows it; when it does not, the full pool
/// is reused and a collision is accepted.
pub fn candidate_assignment<R: Rng>(
    pools: &[(PlayerSlot, Vec<HeroName>)],
    rng: &mut R,
) -> Assignment {
    let mut claimed: HashSet<&HeroName> = HashSet::new();
    let mut assignment = Vec::with_capacity(pools.len());
    for (slot, pool) in pools {
        let free: Vec<&HeroName> = pool.iter().filter(|n| !claimed.contains(*n)).collect();
        let pick = if free.is_empty() {
            pool.choose(rng)
        } else {
            free.choose(rng).copied()
        };
        if let Some(name) = pick {
            claimed.insert(name);
        }
        assignment.push((*slot, pick.cloned()));
    }
    assignment
}
