//! Cuisine mastery trees: four regular meals and a gated boss meal per cuisine.
use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::constants::KEY_MASTERY;
use crate::error::LedgerError;
use crate::store::{StorageBackend, Store};

const DEFAULT_MASTERY_DATA: &str =
    include_str!("../../cookup-web/static/assets/data/mastery.json");

/// Checked flags for one cuisine, regular tiers first, boss last.
pub type TierFlags = SmallVec<[bool; 5]>;
pub type MasteryProgress = BTreeMap<String, TierFlags>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossMeal {
    pub meal: String,
    pub boss_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineTree {
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub meals: Vec<String>,
    pub boss: BossMeal,
}

impl CuisineTree {
    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.meals.len() + 1
    }

    #[must_use]
    pub fn boss_tier(&self) -> usize {
        self.meals.len()
    }

    #[must_use]
    pub fn meal_name(&self, tier: usize) -> Option<&str> {
        if tier == self.boss_tier() {
            Some(&self.boss.meal)
        } else {
            self.meals.get(tier).map(String::as_str)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MasteryCatalog {
    #[serde(default)]
    pub cuisines: Vec<CuisineTree>,
}

impl MasteryCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_MASTERY_DATA).unwrap_or_else(|err| {
            log::warn!("bundled mastery catalog rejected: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<MasteryCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a mastery catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn cuisine(&self, name: &str) -> Option<&CuisineTree> {
        self.cuisines.iter().find(|tree| tree.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierView {
    pub name: String,
    pub is_boss: bool,
    pub checked: bool,
    pub locked: bool,
}

/// Result of [`MasteryLedger::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealToggle {
    pub tier: usize,
    pub is_boss: bool,
    pub checked: bool,
    pub boss_unlocked: bool,
}

pub struct MasteryLedger<'a, B> {
    store: &'a Store<B>,
    catalog: &'a MasteryCatalog,
}

impl<'a, B: StorageBackend> MasteryLedger<'a, B> {
    pub const fn new(store: &'a Store<B>, catalog: &'a MasteryCatalog) -> Self {
        Self { store, catalog }
    }

    /// Persisted progress; non-boolean flags read as unchecked.
    #[must_use]
    pub fn progress(&self) -> MasteryProgress {
        let raw: BTreeMap<String, Value> = self.store.read(KEY_MASTERY);
        raw.into_iter()
            .filter_map(|(cuisine, flags)| match flags {
                Value::Array(items) => Some((
                    cuisine,
                    items
                        .iter()
                        .map(|flag| flag.as_bool().unwrap_or(false))
                        .collect(),
                )),
                _ => None,
            })
            .collect()
    }

    fn tree(&self, cuisine: &str) -> Result<&'a CuisineTree, LedgerError> {
        self.catalog
            .cuisine(cuisine)
            .ok_or_else(|| LedgerError::UnknownCuisine(cuisine.to_string()))
    }

    fn flags_for(&self, tree: &CuisineTree) -> TierFlags {
        let mut flags = self.progress().remove(&tree.name).unwrap_or_default();
        flags.resize(tree.tier_count(), false);
        flags
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownCuisine`] for cuisines not in the catalog.
    pub fn tiers(&self, cuisine: &str) -> Result<Vec<TierView>, LedgerError> {
        let tree = self.tree(cuisine)?;
        let flags = self.flags_for(tree);
        let boss_open = regulars_done(&flags, tree);
        Ok((0..tree.tier_count())
            .map(|tier| {
                let is_boss = tier == tree.boss_tier();
                TierView {
                    name: tree.meal_name(tier).unwrap_or_default().to_string(),
                    is_boss,
                    checked: flags[tier],
                    locked: is_boss && !boss_open,
                }
            })
            .collect())
    }

    /// Flip one tier. The boss tier can only be checked once every regular
    /// tier is; unchecking is always allowed.
    ///
    /// # Errors
    ///
    /// Unknown cuisine, tier out of range, or a locked boss tier.
    pub fn toggle(&self, cuisine: &str, tier: usize) -> Result<MealToggle, LedgerError> {
        let tree = self.tree(cuisine)?;
        if tier >= tree.tier_count() {
            return Err(LedgerError::TierOutOfRange {
                cuisine: cuisine.to_string(),
                tier,
                tiers: tree.tier_count(),
            });
        }
        let mut flags = self.flags_for(tree);
        let is_boss = tier == tree.boss_tier();
        let checking = !flags[tier];
        if is_boss && checking && !regulars_done(&flags, tree) {
            return Err(LedgerError::BossLocked(cuisine.to_string()));
        }
        flags[tier] = checking;

        let mut progress = self.progress();
        progress.insert(tree.name.clone(), flags.clone());
        self.persist(&progress);

        Ok(MealToggle {
            tier,
            is_boss,
            checked: checking,
            boss_unlocked: regulars_done(&flags, tree),
        })
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownCuisine`] for cuisines not in the catalog.
    pub fn is_mastered(&self, cuisine: &str) -> Result<bool, LedgerError> {
        let tree = self.tree(cuisine)?;
        Ok(self.flags_for(tree).iter().all(|checked| *checked))
    }

    pub(crate) fn replace(&self, progress: &MasteryProgress) {
        self.persist(progress);
    }

    fn persist(&self, progress: &MasteryProgress) {
        if let Err(err) = self.store.write(KEY_MASTERY, progress) {
            log::warn!("mastery progress could not be serialized: {err}");
        }
    }
}

fn regulars_done(flags: &[bool], tree: &CuisineTree) -> bool {
    flags.iter().take(tree.boss_tier()).all(|checked| *checked)
}
