use std::collections::HashMap;
use std::error::Error;
use std::io::Write as _;

use clap::Parser;
use clio::{Input, Output};
use heroroll_engine::{EligibilityResolver, RollSchedule, Roller};
use heroroll_model::hero::{HeroName, RoleFilter, Roster};
use heroroll_model::history::PickHistory;
use heroroll_model::PlayerSlot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

/// CLI for rolling random heroes from a saved session snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File containing the session snapshot (roles, bans, completion, history)
    #[clap(long, short, value_parser, default_value = "-")]
    input: Input,

    /// File to write output
    #[clap(long, short, value_parser, default_value = "-")]
    output: Output,

    /// RNG seed for a reproducible roll
    #[clap(long)]
    seed: Option<u64>,

    /// Only print per-player pool sizes, without rolling
    #[clap(long)]
    dry_run: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionSnapshot {
    #[serde(default = "default_player_count")]
    player_count: u8,
    #[serde(default)]
    roles: HashMap<PlayerSlot, RoleFilter>,
    #[serde(default)]
    excluded: HashMap<HeroName, bool>,
    #[serde(default = "default_challenge_mode")]
    challenge_mode: bool,
    #[serde(default)]
    no_repeat: bool,
    #[serde(default)]
    completed_by_player: HashMap<PlayerSlot, HashMap<HeroName, bool>>,
    #[serde(default)]
    history: PickHistory,
}

fn default_player_count() -> u8 {
    2
}

fn default_challenge_mode() -> bool {
    true
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = Args::parse();
    let snapshot: SessionSnapshot = serde_yaml::from_reader(args.input)?;

    let roster = Roster::standard();
    let resolver = EligibilityResolver::new(
        &roster,
        &snapshot.excluded,
        snapshot.challenge_mode,
        snapshot.no_repeat,
        &snapshot.history,
    );
    let empty = HashMap::new();
    let pools: Vec<(PlayerSlot, Vec<HeroName>)> = PlayerSlot::active(snapshot.player_count)
        .map(|slot| {
            let role = snapshot.roles.get(&slot).copied().unwrap_or_default();
            let completed = snapshot.completed_by_player.get(&slot).unwrap_or(&empty);
            (slot, resolver.eligible(role, completed))
        })
        .collect();

    for (slot, pool) in &pools {
        writeln!(args.output, "Player {slot}: {} eligible", pool.len())?;
    }
    if args.dry_run {
        return Ok(());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let Some(roller) = Roller::start(pools, RollSchedule::default()) else {
        writeln!(args.output, "Nothing to roll: every pool is empty")?;
        return Ok(());
    };
    let assignment = roller.run_to_commit(&mut rng);

    let name_col_width = assignment
        .iter()
        .filter_map(|(_, pick)| pick.as_ref().map(|n| n.as_str().len()))
        .max()
        .unwrap_or(0);
    for (slot, pick) in assignment {
        match pick {
            Some(name) => writeln!(args.output, "Player {slot}: {name:>name_col_width$}")?,
            None => writeln!(args.output, "Player {slot}: {:>name_col_width$}", "-")?,
        }
    }
    Ok(())
}
