use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{StreamExt as _, TryStreamExt as _};
use heroroll_engine::{Assignment, EligibilityResolver, RollOutcome, Roller};
use heroroll_model::hero::{HeroName, RoleFilter, Roster};
use heroroll_model::{PlayerSlot, RollPhase, MAX_PLAYERS};
use itertools::Itertools;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::utils::{print_err, ResultExt as _};
use config::Config;
use message_bus::{MessageBus, UiCommand};
use session::{keys, Session};
use store::SettingsStore;
use ui_state::{UiPlayer, UiState};

pub(crate) mod config;
pub(crate) mod message_bus;
pub(crate) mod session;
pub(crate) mod store;
pub(crate) mod ui_state;

pub struct HeroRoll {
    roster: Roster,
    session: Session,
    config: Config,
    settings: SettingsStore,
    message_bus: MessageBus,
    rng: StdRng,
}

impl HeroRoll {
    pub fn new(config: Config, settings: SettingsStore, message_bus: MessageBus) -> Self {
        let session = Session::load(&settings);
        info!(
            "Session loaded: {} players, {} bans, {} history entries",
            session.player_count,
            session.ban_count(),
            session.history.len()
        );
        HeroRoll {
            roster: Roster::standard(),
            session,
            config,
            settings,
            message_bus,
            rng: StdRng::from_entropy(),
        }
    }

    pub async fn dispatch_ui_command(&mut self, ui_command: UiCommand) {
        match ui_command {
            UiCommand::InitializeUi => {}
            UiCommand::SetPlayerCount(count) => self.set_player_count(count),
            UiCommand::SetPlayerRole(slot, role) => self.set_player_role(slot, role),
            UiCommand::SetPlayerName(slot, name) => self.set_player_name(slot, name),
            UiCommand::SetListRole(role) => self.set_list_role(role),
            UiCommand::SetChallengeMode(on) => self.set_challenge_mode(on),
            UiCommand::SetNoRepeat(on) => self.set_no_repeat(on),
            UiCommand::ToggleBan(hero) => self.toggle_ban(hero),
            UiCommand::SetAllBanned { heroes, banned } => self.set_all_banned(heroes, banned),
            UiCommand::Roll => self.roll().await,
            UiCommand::ClearPicks => self.clear_picks(),
            UiCommand::ClearHistory => self.clear_history(),
            UiCommand::MarkComplete { slot, hero } => self.mark_complete(slot, hero),
            UiCommand::MarkAllComplete => self.mark_all_complete(),
            UiCommand::UndoComplete { slot, hero } => self.undo_complete(slot, hero),
            UiCommand::ClearFilters => self.clear_filters(),
            UiCommand::ResetChallenge => self.reset_challenge(),
            UiCommand::FactoryReset => self.factory_reset(),
            UiCommand::CloseApplication => {
                if let Err(e) = self.session.save_all(&self.settings) {
                    error!("store_state failed: {}", e);
                } else {
                    info!("State stored.");
                }
            }
        }
    }

    pub async fn dispatch_ui_commands(mut self, message_bus: MessageBus) {
        let mut ui_command_stream = message_bus.subscribe().ui_command_stream().boxed();
        loop {
            match ui_command_stream.try_next().await {
                Ok(Some(command @ UiCommand::CloseApplication)) => {
                    self.dispatch_ui_command(command).await;
                    break;
                }
                Ok(Some(command)) => {
                    self.dispatch_ui_command(command).await;
                }
                Ok(None) => {
                    break;
                }
                Err(e) => {
                    print_err(&e);
                    break;
                }
            }
            message_bus.send(self.ui_state().into())
        }
    }

    pub fn ui_state(&self) -> UiState {
        let players = self
            .session
            .active_slots()
            .map(|slot| self.build_ui_player(slot))
            .collect();
        let pool_total = self.roster.with_filter(self.session.list_role).count();
        let pool_available = self
            .roster
            .with_filter(self.session.list_role)
            .filter(|h| !self.session.is_banned(&h.name))
            .count();
        UiState {
            roster: self.roster.heroes().to_vec(),
            player_count: self.session.player_count,
            players,
            list_role: self.session.list_role,
            banned: self
                .session
                .banned
                .iter()
                .filter(|(_, banned)| **banned)
                .map(|(name, _)| name.clone())
                .sorted()
                .collect(),
            challenge_mode: self.session.challenge_mode,
            no_repeat: self.session.no_repeat,
            roll_phase: self.session.roll_phase,
            history: self.session.history.names().to_vec(),
            pool_total,
            pool_available,
        }
    }

    fn build_ui_player(&self, slot: PlayerSlot) -> UiPlayer {
        let empty = HashMap::new();
        let completed = self.session.completed.get(&slot).unwrap_or(&empty);
        UiPlayer {
            slot,
            name: self.session.display_name(slot),
            role: self.session.role_of(slot),
            pick: self.session.picks.get(&slot).cloned(),
            eligible_count: self.eligible_for(slot).len(),
            completed: completed
                .iter()
                .filter(|(_, done)| **done)
                .map(|(name, _)| name.clone())
                .sorted()
                .collect(),
            recent_picks: self
                .session
                .player_history
                .get(&slot)
                .map(|h| h.names().to_vec())
                .unwrap_or_default(),
        }
    }

    fn resolver(&self) -> EligibilityResolver<'_> {
        EligibilityResolver::new(
            &self.roster,
            &self.session.banned,
            self.session.challenge_mode,
            self.session.no_repeat,
            &self.session.history,
        )
    }

    fn eligible_for(&self, slot: PlayerSlot) -> Vec<HeroName> {
        let empty = HashMap::new();
        let completed = self.session.completed.get(&slot).unwrap_or(&empty);
        self.resolver().eligible(self.session.role_of(slot), completed)
    }

    fn eligible_pools(&self) -> Vec<(PlayerSlot, Vec<HeroName>)> {
        self.session
            .active_slots()
            .map(|slot| (slot, self.eligible_for(slot)))
            .collect()
    }

    fn set_player_count(&mut self, count: u8) {
        if !(1..=MAX_PLAYERS).contains(&count) {
            warn!("Ignoring player count out of range: {count}");
            return;
        }
        self.session.player_count = count;
        self.settings.store(keys::PLAYER_COUNT, &count).print_err();
    }

    fn set_player_role(&mut self, slot: PlayerSlot, role: RoleFilter) {
        self.session.roles.insert(slot, role);
        self.settings.store(keys::ROLES, &self.session.roles).print_err();
    }

    fn set_player_name(&mut self, slot: PlayerSlot, name: String) {
        self.session.player_names.insert(slot, name);
        self.settings
            .store(keys::PLAYER_NAMES, &self.session.player_names)
            .print_err();
    }

    fn set_list_role(&mut self, role: RoleFilter) {
        self.session.list_role = role;
        self.settings.store(keys::LIST_ROLE, &role).print_err();
    }

    fn set_challenge_mode(&mut self, on: bool) {
        self.session.challenge_mode = on;
        self.settings.store(keys::CHALLENGE_MODE, &on).print_err();
    }

    fn set_no_repeat(&mut self, on: bool) {
        self.session.no_repeat = on;
        self.settings.store(keys::NO_REPEAT, &on).print_err();
    }

    fn ban_cap_reached(&self) -> bool {
        self.config.max_bans > 0 && self.session.ban_count() >= self.config.max_bans
    }

    fn toggle_ban(&mut self, hero: HeroName) {
        if !self.roster.contains(&hero) {
            warn!("Ignoring ban toggle for unknown hero: {hero}");
            return;
        }
        let banned = self.session.is_banned(&hero);
        if !banned && self.ban_cap_reached() {
            warn!(
                "Ban limit of {} reached, not banning {hero}",
                self.config.max_bans
            );
            return;
        }
        self.session.banned.insert(hero, !banned);
        self.settings.store(keys::EXCLUDED, &self.session.banned).print_err();
    }

    /// Applies one ban value to the heroes the presentation currently shows
    /// (its role tab plus search filter). Heroes outside the given list are
    /// untouched.
    fn set_all_banned(&mut self, heroes: Vec<HeroName>, banned: bool) {
        for hero in heroes {
            if !self.roster.contains(&hero) {
                warn!("Ignoring ban update for unknown hero: {hero}");
                continue;
            }
            if banned && !self.session.is_banned(&hero) && self.ban_cap_reached() {
                warn!("Ban limit of {} reached", self.config.max_bans);
                break;
            }
            self.session.banned.insert(hero, banned);
        }
        self.settings.store(keys::EXCLUDED, &self.session.banned).print_err();
    }

    async fn roll(&mut self) {
        let schedule = self.config.roll_schedule();
        let Some(mut roller) = Roller::start(self.eligible_pools(), schedule) else {
            info!("Roll aborted: every active player's pool is empty");
            self.session.picks.clear();
            return;
        };
        self.session.roll_phase = RollPhase::Rolling;
        // interval() panics on a zero period; a broken config still rolls.
        let mut ticker =
            tokio::time::interval(schedule.tick_interval.max(Duration::from_millis(1)));
        loop {
            ticker.tick().await;
            match roller.tick(&mut self.rng) {
                RollOutcome::Candidate(assignment) => {
                    self.apply_assignment(&assignment);
                    self.message_bus.send(self.ui_state().into());
                }
                RollOutcome::Committed(assignment) => {
                    self.session.roll_phase = RollPhase::Committing;
                    self.apply_assignment(&assignment);
                    self.commit_roll(&assignment);
                    break;
                }
            }
        }
        self.session.roll_phase = RollPhase::Idle;
    }

    fn apply_assignment(&mut self, assignment: &Assignment) {
        for (slot, pick) in assignment {
            match pick {
                Some(name) => self.session.picks.insert(*slot, name.clone()),
                None => self.session.picks.remove(slot),
            };
        }
    }

    fn commit_roll(&mut self, assignment: &Assignment) {
        let names: Vec<HeroName> = assignment
            .iter()
            .filter_map(|(_, pick)| pick.clone())
            .collect();
        if names.is_empty() {
            return;
        }
        info!(
            "Roll committed: {}",
            assignment
                .iter()
                .map(|(slot, pick)| match pick {
                    Some(name) => format!("P{slot}={name}"),
                    None => format!("P{slot}=-"),
                })
                .join(", ")
        );
        self.session.history.record(&names, self.config.history_limit);
        for (slot, pick) in assignment {
            if let Some(name) = pick {
                self.session
                    .player_history
                    .entry(*slot)
                    .or_default()
                    .record(std::slice::from_ref(name), self.config.player_history_limit);
            }
        }
        self.settings.store(keys::HISTORY, &self.session.history).print_err();
        self.settings
            .store(keys::HISTORY_BY_PLAYER, &self.session.player_history)
            .print_err();
    }

    fn clear_picks(&mut self) {
        self.session.picks.clear();
    }

    fn clear_history(&mut self) {
        self.session.history.clear();
        self.session.player_history.clear();
        self.settings.store(keys::HISTORY, &self.session.history).print_err();
        self.settings
            .store(keys::HISTORY_BY_PLAYER, &self.session.player_history)
            .print_err();
    }

    /// `hero` is the manual-entry escape hatch: `None` marks the player's
    /// current pick, `Some` marks any roster hero without requiring a roll.
    fn mark_complete(&mut self, slot: PlayerSlot, hero: Option<HeroName>) {
        let Some(name) = hero.or_else(|| self.session.picks.get(&slot).cloned()) else {
            debug!("mark_complete: player {slot} has no pick");
            return;
        };
        if !self.roster.contains(&name) {
            warn!("Ignoring completion for unknown hero: {name}");
            return;
        }
        self.session
            .completed
            .entry(slot)
            .or_default()
            .insert(name, true);
        self.session.picks.remove(&slot);
        self.settings
            .store(keys::COMPLETED_BY_PLAYER, &self.session.completed)
            .print_err();
    }

    fn mark_all_complete(&mut self) {
        let slots: Vec<PlayerSlot> = self.session.active_slots().collect();
        for slot in slots {
            let Some(name) = self.session.picks.remove(&slot) else {
                continue;
            };
            self.session
                .completed
                .entry(slot)
                .or_default()
                .insert(name, true);
        }
        self.settings
            .store(keys::COMPLETED_BY_PLAYER, &self.session.completed)
            .print_err();
    }

    fn undo_complete(&mut self, slot: PlayerSlot, hero: HeroName) {
        self.session
            .completed
            .entry(slot)
            .or_default()
            .insert(hero, false);
        self.settings
            .store(keys::COMPLETED_BY_PLAYER, &self.session.completed)
            .print_err();
    }

    fn clear_filters(&mut self) {
        self.session.banned.clear();
        self.session.history.clear();
        self.session.player_history.clear();
        self.session.picks.clear();
        self.settings.store(keys::EXCLUDED, &self.session.banned).print_err();
        self.settings.store(keys::HISTORY, &self.session.history).print_err();
        self.settings
            .store(keys::HISTORY_BY_PLAYER, &self.session.player_history)
            .print_err();
    }

    fn reset_challenge(&mut self) {
        self.session.completed.clear();
        self.session.picks.clear();
        self.settings
            .store(keys::COMPLETED_BY_PLAYER, &self.session.completed)
            .print_err();
    }

    /// The union of `clear_filters` and `reset_challenge`. The confirmation
    /// prompt is the presentation layer's job.
    fn factory_reset(&mut self) {
        self.clear_filters();
        self.reset_challenge();
    }
}

#[cfg(test)]
mod test {
    use heroroll_model::hero::Role;
    use tempdir::TempDir;

    use super::*;

    fn slot(n: u8) -> PlayerSlot {
        PlayerSlot::try_from(n).unwrap()
    }

    fn quick_config() -> Config {
        Config {
            roll_duration_ms: 2,
            roll_interval_ms: 1,
            ..Config::default()
        }
    }

    fn heroroll(dir: &TempDir, config: Config) -> HeroRoll {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut app = HeroRoll::new(
            config,
            SettingsStore::at(dir.path().to_owned()),
            MessageBus::new(),
        );
        app.rng = StdRng::seed_from_u64(7);
        app
    }

    #[tokio::test]
    async fn roll_respects_role_locks() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::SetPlayerRole(slot(1), RoleFilter::Tank))
            .await;
        app.dispatch_ui_command(UiCommand::SetPlayerRole(slot(2), RoleFilter::Damage))
            .await;
        for _ in 0..20 {
            app.dispatch_ui_command(UiCommand::Roll).await;
            let p1 = app.session.picks.get(&slot(1)).unwrap();
            let p2 = app.session.picks.get(&slot(2)).unwrap();
            assert_eq!(app.roster.get(p1).unwrap().role, Role::Tank);
            assert_eq!(app.roster.get(p2).unwrap().role, Role::Damage);
        }
        assert_eq!(app.session.roll_phase, RollPhase::Idle);
        assert!(!app.session.history.is_empty());
    }

    #[tokio::test]
    async fn roll_with_all_pools_empty_clears_picks() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.session.picks.insert(slot(1), HeroName::from("Ana"));
        for hero in app.roster.heroes().to_vec() {
            app.session.banned.insert(hero.name, true);
        }
        app.dispatch_ui_command(UiCommand::Roll).await;
        assert!(app.session.picks.is_empty());
        assert!(app.session.history.is_empty());
    }

    #[tokio::test]
    async fn completion_excludes_and_undo_restores() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::MarkComplete {
            slot: slot(1),
            hero: Some(HeroName::from("Mercy")),
        })
        .await;
        assert!(!app.eligible_for(slot(1)).contains(&HeroName::from("Mercy")));

        app.dispatch_ui_command(UiCommand::UndoComplete {
            slot: slot(1),
            hero: HeroName::from("Mercy"),
        })
        .await;
        assert!(app.eligible_for(slot(1)).contains(&HeroName::from("Mercy")));
    }

    #[tokio::test]
    async fn mark_all_complete_skips_players_without_picks() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.session.picks.insert(slot(1), HeroName::from("Genji"));
        app.dispatch_ui_command(UiCommand::MarkAllComplete).await;

        assert!(app.session.completed[&slot(1)][&HeroName::from("Genji")]);
        assert!(app.session.picks.get(&slot(1)).is_none());
        assert!(!app.session.completed.contains_key(&slot(2)));
    }

    #[tokio::test]
    async fn mark_complete_requires_a_pick_or_manual_hero() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::MarkComplete {
            slot: slot(1),
            hero: None,
        })
        .await;
        assert!(app.session.completed.is_empty());

        app.dispatch_ui_command(UiCommand::MarkComplete {
            slot: slot(1),
            hero: Some(HeroName::from("Pudge")),
        })
        .await;
        assert!(app.session.completed.is_empty());
    }

    #[tokio::test]
    async fn ban_cap_is_enforced_when_configured() {
        let dir = TempDir::new("heroroll").unwrap();
        let config = Config {
            max_bans: 2,
            ..quick_config()
        };
        let mut app = heroroll(&dir, config);
        for hero in ["Ana", "Mercy", "Genji"] {
            app.dispatch_ui_command(UiCommand::ToggleBan(HeroName::from(hero)))
                .await;
        }
        assert_eq!(app.session.ban_count(), 2);
        assert!(!app.session.is_banned(&HeroName::from("Genji")));

        // Unbanning is always allowed.
        app.dispatch_ui_command(UiCommand::ToggleBan(HeroName::from("Ana")))
            .await;
        assert_eq!(app.session.ban_count(), 1);
    }

    #[tokio::test]
    async fn set_all_banned_only_touches_given_heroes() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::ToggleBan(HeroName::from("Ana")))
            .await;
        app.dispatch_ui_command(UiCommand::SetAllBanned {
            heroes: vec![HeroName::from("Genji"), HeroName::from("Mercy")],
            banned: true,
        })
        .await;
        assert!(app.session.is_banned(&HeroName::from("Ana")));
        assert!(app.session.is_banned(&HeroName::from("Genji")));
        assert!(app.session.is_banned(&HeroName::from("Mercy")));

        app.dispatch_ui_command(UiCommand::SetAllBanned {
            heroes: vec![HeroName::from("Genji"), HeroName::from("Mercy")],
            banned: false,
        })
        .await;
        assert!(app.session.is_banned(&HeroName::from("Ana")));
        assert!(!app.session.is_banned(&HeroName::from("Genji")));
    }

    #[tokio::test]
    async fn clear_filters_keeps_completion() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.session.banned.insert(HeroName::from("Ana"), true);
        app.session.history.record(&[HeroName::from("Genji")], 20);
        app.session.picks.insert(slot(1), HeroName::from("Mei"));
        app.session
            .completed
            .entry(slot(1))
            .or_default()
            .insert(HeroName::from("Mercy"), true);

        app.dispatch_ui_command(UiCommand::ClearFilters).await;
        assert!(app.session.banned.is_empty());
        assert!(app.session.history.is_empty());
        assert!(app.session.picks.is_empty());
        assert!(app.session.completed[&slot(1)][&HeroName::from("Mercy")]);
    }

    #[tokio::test]
    async fn reset_challenge_keeps_bans_and_history() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.session.banned.insert(HeroName::from("Ana"), true);
        app.session.history.record(&[HeroName::from("Genji")], 20);
        app.session
            .completed
            .entry(slot(1))
            .or_default()
            .insert(HeroName::from("Mercy"), true);

        app.dispatch_ui_command(UiCommand::ResetChallenge).await;
        assert!(app.session.completed.is_empty());
        assert!(app.session.is_banned(&HeroName::from("Ana")));
        assert!(!app.session.history.is_empty());
    }

    #[tokio::test]
    async fn factory_reset_clears_everything() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.session.banned.insert(HeroName::from("Ana"), true);
        app.session.history.record(&[HeroName::from("Genji")], 20);
        app.session.picks.insert(slot(1), HeroName::from("Mei"));
        app.session
            .completed
            .entry(slot(1))
            .or_default()
            .insert(HeroName::from("Mercy"), true);

        app.dispatch_ui_command(UiCommand::FactoryReset).await;
        assert!(app.session.banned.is_empty());
        assert!(app.session.history.is_empty());
        assert!(app.session.picks.is_empty());
        assert!(app.session.completed.is_empty());
    }

    #[tokio::test]
    async fn mutations_are_written_through() {
        let dir = TempDir::new("heroroll").unwrap();
        {
            let mut app = heroroll(&dir, quick_config());
            app.dispatch_ui_command(UiCommand::SetPlayerCount(3)).await;
            app.dispatch_ui_command(UiCommand::SetPlayerRole(slot(2), RoleFilter::Support))
                .await;
            app.dispatch_ui_command(UiCommand::ToggleBan(HeroName::from("Ana")))
                .await;
            app.dispatch_ui_command(UiCommand::SetNoRepeat(true)).await;
        }
        let reloaded = Session::load(&SettingsStore::at(dir.path().to_owned()));
        assert_eq!(reloaded.player_count, 3);
        assert_eq!(reloaded.role_of(slot(2)), RoleFilter::Support);
        assert!(reloaded.is_banned(&HeroName::from("Ana")));
        assert!(reloaded.no_repeat);
    }

    #[tokio::test]
    async fn roll_commit_updates_both_histories() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::SetPlayerCount(1)).await;
        app.dispatch_ui_command(UiCommand::Roll).await;

        let pick = app.session.picks.get(&slot(1)).cloned().unwrap();
        assert_eq!(app.session.history.names()[0], pick);
        assert_eq!(app.session.player_history[&slot(1)].names()[0], pick);

        let reloaded = Session::load(&SettingsStore::at(dir.path().to_owned()));
        assert!(reloaded.history.contains(&pick));
    }

    #[tokio::test]
    async fn ui_state_reports_pools_and_players() {
        let dir = TempDir::new("heroroll").unwrap();
        let mut app = heroroll(&dir, quick_config());
        app.dispatch_ui_command(UiCommand::SetPlayerRole(slot(1), RoleFilter::Tank))
            .await;
        app.dispatch_ui_command(UiCommand::ToggleBan(HeroName::from("Zarya")))
            .await;
        app.dispatch_ui_command(UiCommand::SetListRole(RoleFilter::Tank))
            .await;

        let state = app.ui_state();
        assert_eq!(state.player_count, 2);
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.players[0].role, RoleFilter::Tank);
        assert_eq!(state.players[0].eligible_count, 12);
        assert_eq!(state.pool_total, 13);
        assert_eq!(state.pool_available, 12);
        assert_eq!(state.banned, vec![HeroName::from("Zarya")]);
    }
}
