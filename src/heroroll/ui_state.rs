use heroroll_model::hero::{Hero, HeroName, RoleFilter};
use heroroll_model::{PlayerSlot, RollPhase};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPlayer {
    pub slot: PlayerSlot,
    pub name: String,
    pub role: RoleFilter,
    pub pick: Option<HeroName>,
    pub eligible_count: usize,
    pub completed: Vec<HeroName>,
    pub recent_picks: Vec<HeroName>,
}

/// Full snapshot the frontend renders from. Published on the message bus
/// after every command and on every animation tick of a roll.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub roster: Vec<Hero>,

    pub player_count: u8,
    pub players: Vec<UiPlayer>,

    pub list_role: RoleFilter,
    pub banned: Vec<HeroName>,
    pub challenge_mode: bool,
    pub no_repeat: bool,

    pub roll_phase: RollPhase,
    pub history: Vec<HeroName>,

    /// Heroes under the current list-role tab, total and not banned.
    pub pool_total: usize,
    pub pool_available: usize,
}
