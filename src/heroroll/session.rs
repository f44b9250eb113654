use std::collections::HashMap;

use heroroll_model::hero::{HeroName, RoleFilter};
use heroroll_model::history::PickHistory;
use heroroll_model::{PlayerSlot, RollPhase};

use super::store::SettingsStore;

/// Settings-store keys, one per persisted concern.
pub mod keys {
    pub const PLAYER_COUNT: &str = "player_count";
    pub const ROLES: &str = "roles";
    pub const PLAYER_NAMES: &str = "player_names";
    pub const LIST_ROLE: &str = "list_role";
    pub const EXCLUDED: &str = "excluded";
    pub const CHALLENGE_MODE: &str = "challenge_mode";
    pub const NO_REPEAT: &str = "no_repeat";
    pub const COMPLETED_BY_PLAYER: &str = "completed_by_player";
    pub const HISTORY: &str = "history";
    pub const HISTORY_BY_PLAYER: &str = "history_by_player";
}

const DEFAULT_PLAYER_COUNT: u8 = 2;

/// Everything the user can change, in one place. The persisted fields are
/// written through to the settings store after every mutation; `picks` and
/// `roll_phase` live only for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub player_count: u8,
    pub roles: HashMap<PlayerSlot, RoleFilter>,
    pub player_names: HashMap<PlayerSlot, String>,
    pub list_role: RoleFilter,
    pub banned: HashMap<HeroName, bool>,
    pub challenge_mode: bool,
    pub no_repeat: bool,
    pub completed: HashMap<PlayerSlot, HashMap<HeroName, bool>>,
    pub history: PickHistory,
    pub player_history: HashMap<PlayerSlot, PickHistory>,

    // Not persisted.
    pub picks: HashMap<PlayerSlot, HeroName>,
    pub roll_phase: RollPhase,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            player_count: DEFAULT_PLAYER_COUNT,
            roles: Default::default(),
            player_names: Default::default(),
            list_role: Default::default(),
            banned: Default::default(),
            challenge_mode: true,
            no_repeat: false,
            completed: Default::default(),
            history: Default::default(),
            player_history: Default::default(),
            picks: Default::default(),
            roll_phase: Default::default(),
        }
    }
}

impl Session {
    pub fn load(store: &SettingsStore) -> Session {
        let player_count: u8 = store.load_or(keys::PLAYER_COUNT, DEFAULT_PLAYER_COUNT);
        Session {
            player_count: player_count.clamp(1, heroroll_model::MAX_PLAYERS),
            roles: store.load(keys::ROLES),
            player_names: store.load(keys::PLAYER_NAMES),
            list_role: store.load(keys::LIST_ROLE),
            banned: store.load(keys::EXCLUDED),
            challenge_mode: store.load_or(keys::CHALLENGE_MODE, true),
            no_repeat: store.load(keys::NO_REPEAT),
            completed: store.load(keys::COMPLETED_BY_PLAYER),
            history: store.load(keys::HISTORY),
            player_history: store.load(keys::HISTORY_BY_PLAYER),
            picks: Default::default(),
            roll_phase: Default::default(),
        }
    }

    pub fn save_all(&self, store: &SettingsStore) -> anyhow::Result<()> {
        store.store(keys::PLAYER_COUNT, &self.player_count)?;
        store.store(keys::ROLES, &self.roles)?;
        store.store(keys::PLAYER_NAMES, &self.player_names)?;
        store.store(keys::LIST_ROLE, &self.list_role)?;
        store.store(keys::EXCLUDED, &self.banned)?;
        store.store(keys::CHALLENGE_MODE, &self.challenge_mode)?;
        store.store(keys::NO_REPEAT, &self.no_repeat)?;
        store.store(keys::COMPLETED_BY_PLAYER, &self.completed)?;
        store.store(keys::HISTORY, &self.history)?;
        store.store(keys::HISTORY_BY_PLAYER, &self.player_history)?;
        Ok(())
    }

    pub fn active_slots(&self) -> impl Iterator<Item = PlayerSlot> {
        PlayerSlot::active(self.player_count)
    }

    pub fn role_of(&self, slot: PlayerSlot) -> RoleFilter {
        self.roles.get(&slot).copied().unwrap_or_default()
    }

    pub fn display_name(&self, slot: PlayerSlot) -> String {
        self.player_names
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| format!("Player {slot}"))
    }

    pub fn ban_count(&self) -> usize {
        self.banned.values().filter(|v| **v).count()
    }

    pub fn is_banned(&self, name: &HeroName) -> bool {
        self.banned.get(name).copied().unwrap_or(false)
    }
}
