//! Daily mission cache and calendar-date completion flag.
use std::cell::Cell;
use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{KEY_DAILY_COMPLETED, KEY_DAILY_MISSION, MISSION_CACHE_KEY};
use crate::store::{StorageBackend, Store, lenient};

/// Source of wall-clock time and the user's calendar date.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
    /// Calendar date used to scope "completed today".
    fn today(&self) -> NaiveDate;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Real time; dates follow the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Hand-driven clock for tests and the scenario runner. Dates are UTC.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<i64>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.set(self.now_ms.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms.get())
            .map_or(NaiveDate::MIN, |dt| dt.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMissionRecord<P> {
    pub cache_key: String,
    pub fetched_at: i64,
    pub payload: P,
}

/// Outcome of [`DailyMissionCache::get_or_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionLookup<P> {
    /// Served from a still-fresh cache entry.
    Cached(P),
    /// Fetched and persisted just now.
    Fetched(P),
    /// Fetch failed and nothing fresh was cached.
    Unavailable { reason: String },
}

impl<P> MissionLookup<P> {
    #[must_use]
    pub const fn payload(&self) -> Option<&P> {
        match self {
            Self::Cached(p) | Self::Fetched(p) => Some(p),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> Option<P> {
        match self {
            Self::Cached(p) | Self::Fetched(p) => Some(p),
            Self::Unavailable { .. } => None,
        }
    }
}

pub struct DailyMissionCache<'a, B, C> {
    store: &'a Store<B>,
    clock: &'a C,
    window_ms: i64,
}

impl<'a, B: StorageBackend, C: Clock> DailyMissionCache<'a, B, C> {
    pub const fn new(store: &'a Store<B>, clock: &'a C, window_ms: i64) -> Self {
        Self {
            store,
            clock,
            window_ms,
        }
    }

    /// The stored record, fresh or not.
    #[must_use]
    pub fn record<P: DeserializeOwned>(&self) -> Option<DailyMissionRecord<P>> {
        self.store
            .read_or::<Option<DailyMissionRecord<P>>>(KEY_DAILY_MISSION, || None)
    }

    /// Fresh payload, if any.
    #[must_use]
    pub fn cached<P: DeserializeOwned>(&self) -> Option<P> {
        self.record()
            .filter(|record| self.is_fresh(record))
            .map(|record| record.payload)
    }

    fn is_fresh<P>(&self, record: &DailyMissionRecord<P>) -> bool {
        if record.cache_key != MISSION_CACHE_KEY {
            return false;
        }
        let age = self.clock.now_ms().saturating_sub(record.fetched_at);
        (0..self.window_ms).contains(&age)
    }

    /// Serve the cached mission or fetch a new one.
    ///
    /// The store is re-read after the fetch completes; a failed fetch leaves
    /// whatever is stored untouched.
    pub async fn get_or_fetch<P, E, F, Fut>(&self, fetcher: F) -> MissionLookup<P>
    where
        P: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        if let Some(payload) = self.cached() {
            return MissionLookup::Cached(payload);
        }
        match fetcher().await {
            Ok(payload) => {
                // Another surface may have filled the cache while we waited.
                if let Some(existing) = self.cached() {
                    log::debug!("daily mission cached during fetch, keeping stored entry");
                    return MissionLookup::Cached(existing);
                }
                let record = DailyMissionRecord {
                    cache_key: MISSION_CACHE_KEY.to_string(),
                    fetched_at: self.clock.now_ms(),
                    payload,
                };
                if let Err(err) = self.store.write(KEY_DAILY_MISSION, &record) {
                    log::warn!("daily mission could not be serialized: {err}");
                }
                MissionLookup::Fetched(record.payload)
            }
            Err(err) => {
                log::warn!("daily mission fetch failed: {err}");
                MissionLookup::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCompletion {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub completed: bool,
}

pub struct DailyCompletionFlag<'a, B, C> {
    store: &'a Store<B>,
    clock: &'a C,
}

impl<'a, B: StorageBackend, C: Clock> DailyCompletionFlag<'a, B, C> {
    pub const fn new(store: &'a Store<B>, clock: &'a C) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub fn is_completed_today(&self) -> bool {
        let stored: DailyCompletion = self.store.read(KEY_DAILY_COMPLETED);
        stored.completed && stored.date == Some(self.clock.today())
    }

    /// Mark today complete. Returns `false` if it already was.
    pub fn mark_completed_today(&self) -> bool {
        if self.is_completed_today() {
            return false;
        }
        let flag = DailyCompletion {
            date: Some(self.clock.today()),
            completed: true,
        };
        if let Err(err) = self.store.write(KEY_DAILY_COMPLETED, &flag) {
            log::warn!("daily completion could not be serialized: {err}");
        }
        true
    }
}
