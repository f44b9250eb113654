use std::time::Duration;

use heroroll_model::hero::HeroName;
use heroroll_model::{PlayerSlot, RollPhase};
use log::debug;
use rand::Rng;

use crate::{candidate_assignment, Assignment};

/// Cadence of the cosmetic shuffle phase. The engine itself never sleeps;
/// the caller drives [`Roller::tick`] on this schedule (or as fast as it
/// likes in tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollSchedule {
    pub tick_interval: Duration,
    pub duration: Duration,
}

impl RollSchedule {
    pub fn new(tick_interval: Duration, duration: Duration) -> Self {
        RollSchedule {
            tick_interval,
            duration,
        }
    }

    /// Number of candidate assignments generated before the commit, at
    /// least 1 so a degenerate schedule still produces a result.
    pub fn ticks(&self) -> u32 {
        let interval = self.tick_interval.as_millis().max(1);
        let ticks = self.duration.as_millis().div_ceil(interval);
        (ticks as u32).max(1)
    }
}

impl Default for RollSchedule {
    fn default() -> Self {
        RollSchedule {
            tick_interval: Duration::from_millis(60),
            duration: Duration::from_millis(900),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    /// Transient shuffle state, for display only.
    Candidate(Assignment),
    /// The final tick's assignment; the caller records it into history.
    Committed(Assignment),
}

/// One in-flight roll. Pools are resolved once at start and stay fixed for
/// the whole animation; every tick redraws a candidate assignment from them.
pub struct Roller {
    pools: Vec<(PlayerSlot, Vec<HeroName>)>,
    remaining: u32,
    phase: RollPhase,
}

impl Roller {
    /// Refuses to start when every participating pool is empty; the caller
    /// clears the current picks and moves on (no error).
    pub fn start(pools: Vec<(PlayerSlot, Vec<HeroName>)>, schedule: RollSchedule) -> Option<Roller> {
        if pools.iter().all(|(_, pool)| pool.is_empty()) {
            debug!("Roll not started: all pools empty");
            return None;
        }
        Some(Roller {
            pools,
            remaining: schedule.ticks(),
            phase: RollPhase::Rolling,
        })
    }

    pub fn phase(&self) -> RollPhase {
        self.phase
    }

    pub fn pools(&self) -> &[(PlayerSlot, Vec<HeroName>)] {
        &self.pools
    }

    /// Draws the next candidate assignment. The last scheduled tick returns
    /// [`RollOutcome::Committed`] and moves the roller to `Committing`;
    /// further ticks keep committing the same way (the caller is expected to
    /// stop).
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> RollOutcome {
        let assignment = candidate_assignment(&self.pools, rng);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = RollPhase::Committing;
            RollOutcome::Committed(assignment)
        } else {
            RollOutcome::Candidate(assignment)
        }
    }

    /// Runs the remaining ticks back to back and returns the committed
    /// assignment. Used where the shuffle animation is pointless (CLI,
    /// tests).
    pub fn run_to_commit<R: Rng>(mut self, rng: &mut R) -> Assignment {
        loop {
            if let RollOutcome::Committed(assignment) = self.tick(rng) {
                return assignment;
            }
        }
    }
}
