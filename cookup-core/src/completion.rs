//! Completion ledger: counts of discrete accomplishments.
//!
//! Unique counters are backed by identifier sets so that repeating the same
//! accomplishment (re-cooking a recipe, re-checking a boss) never counts
//! twice. Tally counters simply increment.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::KEY_COUNTERS;
use crate::error::LedgerError;
use crate::store::{StorageBackend, Store, lenient};

/// How a counter advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Deduplicated by identifier; count == identifier-set size.
    Unique,
    /// Unconditionally incremented.
    Tally,
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unique => "unique",
            Self::Tally => "tally",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Counter {
    RecipesCompleted,
    DailyMissionsCompleted,
    UniqueCuisinesCooked,
    CuisineBossesDefeated,
    MasteryMealsCompleted,
    BreakfastRecipesCompleted,
}

impl Counter {
    pub const ALL: [Self; 6] = [
        Self::RecipesCompleted,
        Self::DailyMissionsCompleted,
        Self::UniqueCuisinesCooked,
        Self::CuisineBossesDefeated,
        Self::MasteryMealsCompleted,
        Self::BreakfastRecipesCompleted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecipesCompleted => "recipesCompleted",
            Self::DailyMissionsCompleted => "dailyMissionsCompleted",
            Self::UniqueCuisinesCooked => "uniqueCuisinesCooked",
            Self::CuisineBossesDefeated => "cuisineBossesDefeated",
            Self::MasteryMealsCompleted => "masteryMealsCompleted",
            Self::BreakfastRecipesCompleted => "breakfastRecipesCompleted",
        }
    }

    #[must_use]
    pub const fn kind(self) -> CounterKind {
        match self {
            Self::DailyMissionsCompleted => CounterKind::Tally,
            _ => CounterKind::Unique,
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Counter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|counter| counter.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownCounter(s.to_string()))
    }
}

/// Persisted counters. Keys are counter names so records written by a newer
/// build with extra counters survive a round trip through an older one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCounters {
    #[serde(default, deserialize_with = "lenient::or_default")]
    counts: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    identifiers: BTreeMap<String, BTreeSet<String>>,
}

impl CompletionCounters {
    #[must_use]
    pub fn get(&self, counter: Counter) -> u64 {
        match counter.kind() {
            CounterKind::Unique => self
                .identifiers
                .get(counter.as_str())
                .map_or(0, |ids| u64::try_from(ids.len()).unwrap_or(u64::MAX)),
            CounterKind::Tally => self.counts.get(counter.as_str()).copied().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn contains(&self, counter: Counter, identifier: &str) -> bool {
        self.identifiers
            .get(counter.as_str())
            .is_some_and(|ids| ids.contains(identifier))
    }

    /// Identifiers recorded for a unique counter, in sorted order.
    pub fn identifiers(&self, counter: Counter) -> impl Iterator<Item = &str> {
        self.identifiers
            .get(counter.as_str())
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// Bring stored counts in line with identifier sets.
    fn normalize(&mut self) {
        for counter in Counter::ALL {
            if counter.kind() == CounterKind::Unique {
                let len = self.get(counter);
                if let Some(stored) = self.counts.get_mut(counter.as_str()) {
                    if *stored != len {
                        log::debug!("counter {counter} stored {stored}, set holds {len}");
                        *stored = len;
                    }
                } else if len > 0 {
                    self.counts.insert(counter.as_str().to_string(), len);
                }
            }
        }
    }
}

/// Result of [`CompletionLedger::record_unique_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueRecord {
    pub new_count: u64,
    pub was_new: bool,
}

pub struct CompletionLedger<'a, B> {
    store: &'a Store<B>,
}

impl<'a, B: StorageBackend> CompletionLedger<'a, B> {
    pub const fn new(store: &'a Store<B>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn counters(&self) -> CompletionCounters {
        let mut counters: CompletionCounters = self.store.read(KEY_COUNTERS);
        counters.normalize();
        counters
    }

    #[must_use]
    pub fn get_counter(&self, counter: Counter) -> u64 {
        self.counters().get(counter)
    }

    /// Add `identifier` to a unique counter; persists only when it is new.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CounterKindMismatch`] for tally counters.
    pub fn record_unique_event(
        &self,
        counter: Counter,
        identifier: &str,
    ) -> Result<UniqueRecord, LedgerError> {
        expect_kind(counter, CounterKind::Unique)?;
        let mut counters = self.counters();
        let was_new = counters
            .identifiers
            .entry(counter.as_str().to_string())
            .or_default()
            .insert(identifier.to_string());
        if was_new {
            counters.normalize();
            self.persist(&counters);
        }
        Ok(UniqueRecord {
            new_count: counters.get(counter),
            was_new,
        })
    }

    /// Unconditionally bump a tally counter and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CounterKindMismatch`] for unique counters.
    pub fn increment_counter(&self, counter: Counter) -> Result<u64, LedgerError> {
        expect_kind(counter, CounterKind::Tally)?;
        let mut counters = self.counters();
        let slot = counters
            .counts
            .entry(counter.as_str().to_string())
            .or_insert(0);
        *slot = slot.saturating_add(1);
        let new_count = *slot;
        self.persist(&counters);
        Ok(new_count)
    }

    pub(crate) fn replace(&self, counters: &CompletionCounters) {
        let mut counters = counters.clone();
        counters.normalize();
        self.persist(&counters);
    }

    fn persist(&self, counters: &CompletionCounters) {
        if let Err(err) = self.store.write(KEY_COUNTERS, counters) {
            log::warn!("counters could not be serialized: {err}");
        }
    }
}

const fn expect_kind(counter: Counter, expected: CounterKind) -> Result<(), LedgerError> {
    let actual = counter.kind();
    if matches!(
        (actual, expected),
        (CounterKind::Unique, CounterKind::Unique) | (CounterKind::Tally, CounterKind::Tally)
    ) {
        Ok(())
    } else {
        Err(LedgerError::CounterKindMismatch {
            counter: counter.as_str(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Notifier;
    use crate::store::MemoryBackend;

    fn store() -> Store<MemoryBackend> {
        Store::new(MemoryBackend::new(), Notifier::new())
    }

    #[test]
    fn unique_recording_is_idempotent() {
        let store = store();
        let ledger = CompletionLedger::new(&store);
        let first = ledger
            .record_unique_event(Counter::RecipesCompleted, "716429")
            .unwrap();
        let second = ledger
            .record_unique_event(Counter::RecipesCompleted, "716429")
            .unwrap();
        assert_eq!(first, UniqueRecord { new_count: 1, was_new: true });
        assert_eq!(second, UniqueRecord { new_count: 1, was_new: false });
        assert_eq!(ledger.get_counter(Counter::RecipesCompleted), 1);
    }

    #[test]
    fn tally_counters_always_increment() {
        let store = store();
        let ledger = CompletionLedger::new(&store);
        for expected in 1..=3 {
            assert_eq!(
                ledger
                    .increment_counter(Counter::DailyMissionsCompleted)
                    .unwrap(),
                expected
            );
        }
    }

    #[test]
    fn kind_mismatch_is_rejected_without_writing() {
        let store = store();
        let ledger = CompletionLedger::new(&store);
        assert!(matches!(
            ledger.increment_counter(Counter::UniqueCuisinesCooked),
            Err(LedgerError::CounterKindMismatch { .. })
        ));
        assert!(
            ledger
                .record_unique_event(Counter::DailyMissionsCompleted, "x")
                .is_err()
        );
        assert!(store.read_raw(KEY_COUNTERS).is_none());
    }

    #[test]
    fn unknown_counter_names_are_rejected() {
        assert_eq!(
            "recipesCompleted".parse::<Counter>(),
            Ok(Counter::RecipesCompleted)
        );
        assert_eq!(
            "spicyDishes".parse::<Counter>(),
            Err(LedgerError::UnknownCounter("spicyDishes".into()))
        );
    }

    #[test]
    fn stored_counts_follow_identifier_sets() {
        let backend = MemoryBackend::new();
        backend
            .set_item(
                KEY_COUNTERS,
                r#"{"counts":{"uniqueCuisinesCooked":9,"futureCounter":4},"identifiers":{"uniqueCuisinesCooked":["Thai","Greek"]}}"#,
            )
            .unwrap();
        let store = Store::new(backend, Notifier::new());
        let counters = CompletionLedger::new(&store).counters();
        assert_eq!(counters.get(Counter::UniqueCuisinesCooked), 2);
        assert_eq!(counters.counts.get("futureCounter"), Some(&4));
        assert_eq!(
            counters
                .identifiers(Counter::UniqueCuisinesCooked)
                .collect::<Vec<_>>(),
            vec!["Greek", "Thai"]
        );
    }

    #[test]
    fn empty_store_reads_as_default_counters() {
        let store = store();
        let ledger = CompletionLedger::new(&store);
        assert_eq!(ledger.counters(), CompletionCounters::default());
        ledger
            .increment_counter(Counter::DailyMissionsCompleted)
            .unwrap();
        let counters = ledger.counters();
        assert_eq!(counters.counts.len(), 1);
        assert_eq!(counters.get(Counter::RecipesCompleted), 0);
    }
}
