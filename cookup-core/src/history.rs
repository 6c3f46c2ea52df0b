//! Bounded, most-recent-first cooking history.
use serde::{Deserialize, Serialize};

use crate::constants::KEY_HISTORY;
use crate::store::{StorageBackend, Store, lenient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookedRecipe {
    pub recipe_id: String,
    pub title: String,
    pub cuisine: String,
    pub xp_awarded: u64,
    pub cooked_at_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredHistory {
    #[serde(default, deserialize_with = "lenient::or_default")]
    entries: Vec<CookedRecipe>,
}

pub struct CookHistory<'a, B> {
    store: &'a Store<B>,
    limit: usize,
}

impl<'a, B: StorageBackend> CookHistory<'a, B> {
    pub const fn new(store: &'a Store<B>, limit: usize) -> Self {
        Self { store, limit }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<CookedRecipe> {
        let mut stored: StoredHistory = self.store.read(KEY_HISTORY);
        stored.entries.truncate(self.limit);
        stored.entries
    }

    /// Prepend `entry`, dropping the oldest entries beyond the limit.
    pub fn push(&self, entry: CookedRecipe) {
        let mut entries = self.entries();
        entries.insert(0, entry);
        entries.truncate(self.limit);
        if let Err(err) = self.store.write(KEY_HISTORY, &StoredHistory { entries }) {
            log::warn!("history could not be serialized: {err}");
        }
    }

    /// Overwrite the whole history; used by snapshot import.
    pub(crate) fn replace(&self, mut entries: Vec<CookedRecipe>) {
        entries.truncate(self.limit);
        if let Err(err) = self.store.write(KEY_HISTORY, &StoredHistory { entries }) {
            log::warn!("history could not be serialized: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Notifier;
    use crate::store::MemoryBackend;

    fn cooked(id: u32) -> CookedRecipe {
        CookedRecipe {
            recipe_id: id.to_string(),
            title: format!("Recipe {id}"),
            cuisine: "Thai".into(),
            xp_awarded: 40,
            cooked_at_ms: i64::from(id),
        }
    }

    #[test]
    fn newest_first_and_bounded() {
        let store = Store::new(MemoryBackend::new(), Notifier::new());
        let history = CookHistory::new(&store, 3);
        for id in 1..=5 {
            history.push(cooked(id));
        }
        let ids: Vec<_> = history
            .entries()
            .into_iter()
            .map(|e| e.recipe_id)
            .collect();
        assert_eq!(ids, vec!["5", "4", "3"]);
    }

    #[test]
    fn corrupt_history_reads_empty() {
        let backend = MemoryBackend::new();
        backend.set_item(KEY_HISTORY, r#"{"entries":7}"#).unwrap();
        let store = Store::new(backend, Notifier::new());
        assert!(CookHistory::new(&store, 10).entries().is_empty());
    }
}
