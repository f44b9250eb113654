use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Tank,
    Damage,
    Support,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Tank => "Tank",
            Role::Damage => "Damage",
            Role::Support => "Support",
        })
    }
}

/// Per-player pool restriction. `All` means no restriction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleFilter {
    #[default]
    All,
    Tank,
    Damage,
    Support,
}

impl RoleFilter {
    pub fn matches(self, role: Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Tank => role == Role::Tank,
            RoleFilter::Damage => role == Role::Damage,
            RoleFilter::Support => role == Role::Support,
        }
    }
}

impl From<Role> for RoleFilter {
    fn from(value: Role) -> Self {
        match value {
            Role::Tank => RoleFilter::Tank,
            Role::Damage => RoleFilter::Damage,
            Role::Support => RoleFilter::Support,
        }
    }
}

impl Display for RoleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleFilter::All => f.write_str("All"),
            RoleFilter::Tank => Role::Tank.fmt(f),
            RoleFilter::Damage => Role::Damage.fmt(f),
            RoleFilter::Support => Role::Support.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeroName(String);

impl HeroName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HeroName {
    fn from(value: String) -> Self {
        HeroName(value)
    }
}

impl From<&str> for HeroName {
    fn from(value: &str) -> Self {
        HeroName(String::from(value))
    }
}

impl Display for HeroName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub name: HeroName,
    pub role: Role,
}

// Overwatch 2 launch roster, season 17.
const TANK_HEROES: &[&str] = &[
    "D.Va",
    "Doomfist",
    "Hazard",
    "Junker Queen",
    "Mauga",
    "Orisa",
    "Ramattra",
    "Reinhardt",
    "Roadhog",
    "Sigma",
    "Winston",
    "Wrecking Ball",
    "Zarya",
];

const DAMAGE_HEROES: &[&str] = &[
    "Ashe",
    "Bastion",
    "Cassidy",
    "Echo",
    "Freja",
    "Genji",
    "Hanzo",
    "Junkrat",
    "Mei",
    "Pharah",
    "Reaper",
    "Sojourn",
    "Soldier: 76",
    "Sombra",
    "Symmetra",
    "Torbjörn",
    "Tracer",
    "Venture",
    "Widowmaker",
];

const SUPPORT_HEROES: &[&str] = &[
    "Ana",
    "Baptiste",
    "Brigitte",
    "Illari",
    "Juno",
    "Kiriko",
    "Lifeweaver",
    "Lúcio",
    "Mercy",
    "Moira",
    "Wuyang",
    "Zenyatta",
];

/// The compiled-in hero roster. Static reference data, never mutated at
/// runtime.
#[derive(Debug, Clone)]
pub struct Roster {
    heroes: Vec<Hero>,
}

impl Roster {
    pub fn standard() -> Roster {
        let entry = |role: Role| {
            move |name: &&str| Hero {
                name: HeroName::from(*name),
                role,
            }
        };
        let heroes = TANK_HEROES
            .iter()
            .map(entry(Role::Tank))
            .chain(DAMAGE_HEROES.iter().map(entry(Role::Damage)))
            .chain(SUPPORT_HEROES.iter().map(entry(Role::Support)))
            .collect();
        Roster { heroes }
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    pub fn get(&self, name: &HeroName) -> Option<&Hero> {
        self.heroes.iter().find(|h| h.name == *name)
    }

    pub fn contains(&self, name: &HeroName) -> bool {
        self.get(name).is_some()
    }

    pub fn with_filter(&self, filter: RoleFilter) -> impl Iterator<Item = &Hero> {
        self.heroes.iter().filter(move |h| filter.matches(h.role))
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Roster::standard()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn roster_role_counts() {
        let roster = Roster::standard();
        assert_eq!(roster.with_filter(RoleFilter::Tank).count(), 13);
        assert_eq!(roster.with_filter(RoleFilter::Damage).count(), 19);
        assert_eq!(roster.with_filter(RoleFilter::Support).count(), 12);
        assert_eq!(roster.with_filter(RoleFilter::All).count(), roster.len());
    }

    #[test]
    fn roster_names_unique() {
        let roster = Roster::standard();
        let unique: HashSet<&HeroName> = roster.heroes().iter().map(|h| &h.name).collect();
        assert_eq!(unique.len(), roster.len());
    }

    #[test]
    fn roster_lookup() {
        let roster = Roster::standard();
        assert_eq!(roster.get(&HeroName::from("Ana")).unwrap().role, Role::Support);
        assert_eq!(roster.get(&HeroName::from("Zarya")).unwrap().role, Role::Tank);
        assert!(!roster.contains(&HeroName::from("Pudge")));
    }

    #[test]
    fn filter_matches() {
        assert!(RoleFilter::All.matches(Role::Damage));
        assert!(RoleFilter::Tank.matches(Role::Tank));
        assert!(!RoleFilter::Tank.matches(Role::Support));
        assert_eq!(RoleFilter::from(Role::Support), RoleFilter::Support);
    }
}
