use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hero;
pub mod history;

pub const MAX_PLAYERS: u8 = 5;

/// Where a roll currently is. `Committing` is only ever observable during the
/// final animation tick; the UI mostly sees `Idle` and `Rolling`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RollPhase {
    #[default]
    Idle,
    Rolling,
    Committing,
}

#[derive(Error, Debug)]
#[error("Invalid player slot: {0}")]
pub struct InvalidSlot(u8);

/// Player seat number, always in `1..=MAX_PLAYERS`. Slots above the
/// configured player count exist but are inactive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = PlayerSlot> {
        (1..=MAX_PLAYERS).map(PlayerSlot)
    }

    /// The first `count` slots.
    pub fn active(count: u8) -> impl Iterator<Item = PlayerSlot> {
        (1..=count.min(MAX_PLAYERS)).map(PlayerSlot)
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=MAX_PLAYERS).contains(&value) {
            Ok(PlayerSlot(value))
        } else {
            Err(InvalidSlot(value))
        }
    }
}

impl From<PlayerSlot> for u8 {
    fn from(value: PlayerSlot) -> Self {
        value.0
    }
}

impl Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::hero::RoleFilter;

    #[test]
    fn slot_bounds() {
        assert!(PlayerSlot::try_from(0).is_err());
        assert!(PlayerSlot::try_from(6).is_err());
        assert_eq!(PlayerSlot::try_from(1).unwrap().get(), 1);
        assert_eq!(PlayerSlot::try_from(5).unwrap().get(), 5);
        assert_eq!(
            &PlayerSlot::try_from(7).unwrap_err().to_string(),
            "Invalid player slot: 7"
        );
    }

    #[test]
    fn active_slots() {
        let slots: Vec<u8> = PlayerSlot::active(2).map(PlayerSlot::get).collect();
        assert_eq!(slots, vec![1, 2]);
        assert_eq!(PlayerSlot::active(9).count(), MAX_PLAYERS as usize);
    }

    #[test]
    fn slot_as_json_map_key() {
        let roles: HashMap<PlayerSlot, RoleFilter> =
            HashMap::from([(PlayerSlot::try_from(1).unwrap(), RoleFilter::Tank)]);
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"{"1":"tank"}"#);
        let back: HashMap<PlayerSlot, RoleFilter> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, roles);
    }

    #[test]
    fn slot_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<PlayerSlot>("0").is_err());
        assert!(serde_json::from_str::<PlayerSlot>("6").is_err());
        assert!(serde_json::from_str::<PlayerSlot>("3").is_ok());
    }
}
