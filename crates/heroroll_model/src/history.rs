use serde::{Deserialize, Serialize};

use crate::hero::HeroName;

/// Recently picked heroes, most recent first. Bounded and deduplicating:
/// re-picking a hero moves it to the front instead of adding a second entry.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickHistory(Vec<HeroName>);

impl PickHistory {
    pub fn names(&self) -> &[HeroName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &HeroName) -> bool {
        self.0.contains(name)
    }

    /// Inserts one roll's picks as a block at the front, keeping their order,
    /// then truncates to `cap`. Picks already present anywhere (including
    /// twice within `picks`, which a same-roll collision can produce) end up
    /// in the history exactly once.
    pub fn record(&mut self, picks: &[HeroName], cap: usize) {
        if picks.is_empty() {
            return;
        }
        let mut entries: Vec<HeroName> = Vec::with_capacity(self.0.len() + picks.len());
        for pick in picks {
            if !entries.contains(pick) {
                entries.push(pick.clone());
            }
        }
        entries.extend(self.0.drain(..).filter(|n| !picks.contains(n)));
        entries.truncate(cap);
        self.0 = entries;
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<HeroName> for PickHistory {
    fn from_iter<T: IntoIterator<Item = HeroName>>(iter: T) -> Self {
        PickHistory(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<HeroName> {
        raw.iter().copied().map(HeroName::from).collect()
    }

    #[test]
    fn record_moves_repeat_to_front() {
        let mut history = PickHistory::default();
        history.record(&names(&["Ana"]), 20);
        history.record(&names(&["Mercy"]), 20);
        history.record(&names(&["Ana"]), 20);
        assert_eq!(history.names(), names(&["Ana", "Mercy"]).as_slice());
    }

    #[test]
    fn record_keeps_roll_order_at_front() {
        let mut history = PickHistory::default();
        history.record(&names(&["Genji", "Ana"]), 20);
        history.record(&names(&["Mercy", "Genji"]), 20);
        assert_eq!(history.names(), names(&["Mercy", "Genji", "Ana"]).as_slice());
    }

    #[test]
    fn record_truncates_to_cap() {
        let mut history = PickHistory::default();
        for name in ["Ana", "Mercy", "Genji", "Echo", "Mei"] {
            history.record(&names(&[name]), 3);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.names(), names(&["Mei", "Echo", "Genji"]).as_slice());
    }

    #[test]
    fn record_dedups_collision_within_one_roll() {
        let mut history = PickHistory::default();
        history.record(&names(&["Ana", "Ana"]), 20);
        assert_eq!(history.names(), names(&["Ana"]).as_slice());
    }

    #[test]
    fn record_empty_roll_is_noop() {
        let mut history = PickHistory::default();
        history.record(&names(&["Ana"]), 20);
        history.record(&[], 20);
        assert_eq!(history.names(), names(&["Ana"]).as_slice());
    }

    #[test]
    fn most_recent_is_first() {
        let mut history = PickHistory::default();
        history.record(&names(&["Ana"]), 20);
        history.record(&names(&["Mercy"]), 20);
        assert_eq!(history.names()[0], HeroName::from("Mercy"));
    }
}
