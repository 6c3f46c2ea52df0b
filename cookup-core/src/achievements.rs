//! Achievement catalog and evaluator.
//!
//! Definitions are static; only the set of unlocked identifiers is persisted.
//! Evaluation is monotonic: identifiers are added, never removed, including
//! identifiers this build does not know about.
use std::collections::BTreeSet;

use serde_json::Value;

use crate::completion::{CompletionCounters, Counter};
use crate::constants::KEY_ACHIEVEMENTS;
use crate::profile::Profile;
use crate::store::{StorageBackend, Store};

pub type UnlockPredicate = fn(&Profile, &CompletionCounters) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub reward_xp: u64,
    pub unlock: UnlockPredicate,
}

impl PartialEq for AchievementDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AchievementDefinition {}

fn first_flame(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::RecipesCompleted) >= 1
}

fn kitchen_novice(profile: &Profile, _: &CompletionCounters) -> bool {
    profile.level >= 1
}

fn breakfast_champion(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::BreakfastRecipesCompleted) >= 3
}

fn home_cook(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::RecipesCompleted) >= 10
}

fn mission_regular(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::DailyMissionsCompleted) >= 5
}

fn world_palate(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::UniqueCuisinesCooked) >= 5
}

fn boss_slayer(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::CuisineBossesDefeated) >= 1
}

fn kitchen_crown(profile: &Profile, _: &CompletionCounters) -> bool {
    profile.level >= 5
}

fn grand_master(_: &Profile, counters: &CompletionCounters) -> bool {
    counters.get(Counter::CuisineBossesDefeated) >= 5
}

pub static CATALOG: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "first-flame",
        title: "First Flame",
        description: "Cook your first recipe",
        reward_xp: 100,
        unlock: first_flame,
    },
    AchievementDefinition {
        id: "kitchen-novice",
        title: "Kitchen Novice",
        description: "Start your culinary journey",
        reward_xp: 0,
        unlock: kitchen_novice,
    },
    AchievementDefinition {
        id: "breakfast-champion",
        title: "Breakfast Champion",
        description: "Cook three breakfast recipes",
        reward_xp: 300,
        unlock: breakfast_champion,
    },
    AchievementDefinition {
        id: "home-cook",
        title: "Home Cook",
        description: "Cook ten different recipes",
        reward_xp: 250,
        unlock: home_cook,
    },
    AchievementDefinition {
        id: "mission-regular",
        title: "Mission Regular",
        description: "Complete five daily missions",
        reward_xp: 300,
        unlock: mission_regular,
    },
    AchievementDefinition {
        id: "world-palate",
        title: "World Palate",
        description: "Cook dishes from five cuisines",
        reward_xp: 400,
        unlock: world_palate,
    },
    AchievementDefinition {
        id: "boss-slayer",
        title: "Boss Slayer",
        description: "Defeat your first cuisine boss",
        reward_xp: 500,
        unlock: boss_slayer,
    },
    AchievementDefinition {
        id: "kitchen-crown",
        title: "Kitchen Crown",
        description: "Reach level 5",
        reward_xp: 1_000,
        unlock: kitchen_crown,
    },
    AchievementDefinition {
        id: "grand-master",
        title: "Grand Master",
        description: "Defeat five cuisine bosses",
        reward_xp: 1_500,
        unlock: grand_master,
    },
];

#[must_use]
pub fn find(id: &str) -> Option<&'static AchievementDefinition> {
    CATALOG.iter().find(|def| def.id == id)
}

pub struct AchievementEvaluator<'a, B> {
    store: &'a Store<B>,
}

impl<'a, B: StorageBackend> AchievementEvaluator<'a, B> {
    pub const fn new(store: &'a Store<B>) -> Self {
        Self { store }
    }

    /// Persisted unlocked identifiers. Non-string entries are dropped.
    #[must_use]
    pub fn unlocked(&self) -> BTreeSet<String> {
        let raw: Vec<Value> = self.store.read(KEY_ACHIEVEMENTS);
        raw.into_iter()
            .filter_map(|value| match value {
                Value::String(id) => Some(id),
                other => {
                    log::debug!("ignoring non-string achievement entry {other}");
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked().contains(id)
    }

    /// Unlock every still-locked achievement whose predicate now holds.
    ///
    /// Returns only the newly unlocked definitions, in catalog order; a
    /// second call with unchanged inputs returns an empty list.
    pub fn evaluate_all(
        &self,
        profile: &Profile,
        counters: &CompletionCounters,
    ) -> Vec<&'static AchievementDefinition> {
        let mut unlocked = self.unlocked();
        let fresh: Vec<&'static AchievementDefinition> = CATALOG
            .iter()
            .filter(|def| !unlocked.contains(def.id) && (def.unlock)(profile, counters))
            .collect();
        if fresh.is_empty() {
            return fresh;
        }
        for def in &fresh {
            log::info!("achievement unlocked: {}", def.id);
            unlocked.insert(def.id.to_string());
        }
        self.persist(&unlocked);
        fresh
    }

    /// Add `ids` to the unlocked set without evaluating predicates.
    pub(crate) fn merge(&self, ids: &BTreeSet<String>) {
        let mut unlocked = self.unlocked();
        let before = unlocked.len();
        unlocked.extend(ids.iter().cloned());
        if unlocked.len() != before {
            self.persist(&unlocked);
        }
    }

    fn persist(&self, unlocked: &BTreeSet<String>) {
        if let Err(err) = self.store.write(KEY_ACHIEVEMENTS, unlocked) {
            log::warn!("achievements could not be serialized: {err}");
        }
    }
}
