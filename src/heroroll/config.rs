use std::path::PathBuf;
use std::time::Duration;

use heroroll_engine::RollSchedule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Cap on the shared recent-picks list.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Cap on each player's own recent-picks list.
    #[serde(default = "default_player_history_limit")]
    pub player_history_limit: usize,

    /// Maximum number of banned heroes. 0 means no cap.
    #[serde(default)]
    pub max_bans: usize,

    /// Total length of the shuffle animation.
    #[serde(default = "default_roll_duration_ms")]
    pub roll_duration_ms: u64,

    /// Cadence of candidate updates during the shuffle animation.
    #[serde(default = "default_roll_interval_ms")]
    pub roll_interval_ms: u64,

    #[serde(default = "default_static_serving_dir")]
    pub static_serving_dir: PathBuf,

    #[serde(default = "default_serving_addr")]
    pub serving_addr: String,
}

fn default_history_limit() -> usize {
    20
}

fn default_player_history_limit() -> usize {
    10
}

fn default_roll_duration_ms() -> u64 {
    900
}

fn default_roll_interval_ms() -> u64 {
    60
}

fn default_static_serving_dir() -> PathBuf {
    "ui/dist".into()
}

fn default_serving_addr() -> String {
    "0.0.0.0:3000".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            player_history_limit: default_player_history_limit(),
            max_bans: 0,
            roll_duration_ms: default_roll_duration_ms(),
            roll_interval_ms: default_roll_interval_ms(),
            static_serving_dir: default_static_serving_dir(),
            serving_addr: default_serving_addr(),
        }
    }
}

impl Config {
    pub fn roll_schedule(&self) -> RollSchedule {
        RollSchedule::new(
            Duration::from_millis(self.roll_interval_ms),
            Duration::from_millis(self.roll_duration_ms),
        )
    }
}
