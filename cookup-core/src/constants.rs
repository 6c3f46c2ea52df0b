//! Centralized persistence keys and progression tuning defaults.
//!
//! Keeping these together means a storage layout or balance change is a
//! single reviewed edit rather than a hunt through call sites.

// Persisted keys -----------------------------------------------------------
pub const KEY_NAMESPACE: &str = "cookup.";
pub const KEY_PROFILE: &str = "cookup.profile";
pub const KEY_COUNTERS: &str = "cookup.counters";
pub const KEY_ACHIEVEMENTS: &str = "cookup.achievements";
pub const KEY_DAILY_MISSION: &str = "cookup.daily.mission";
pub const KEY_DAILY_COMPLETED: &str = "cookup.daily.completed";
pub const KEY_MASTERY: &str = "cookup.mastery";
pub const KEY_HISTORY: &str = "cookup.history";

// Level curve --------------------------------------------------------------
pub(crate) const DEFAULT_BASE_XP: u64 = 400;
pub(crate) const DEFAULT_MAX_LEVEL: u32 = 50;
/// `base_xp * 2^(MAX_LEVEL_CAP - 1)` must fit in a u64 for any sane base.
pub(crate) const MAX_LEVEL_CAP: u32 = 50;

// Rewards ------------------------------------------------------------------
pub(crate) const DEFAULT_DAILY_MISSION_XP: u64 = 150;
pub(crate) const DEFAULT_MASTERY_MEAL_XP: u64 = 50;
pub(crate) const DEFAULT_MASTERY_BOSS_XP: u64 = 250;
pub(crate) const XP_PER_PREP_MINUTE: u64 = 2;

// Daily mission cache ------------------------------------------------------
pub(crate) const DEFAULT_MISSION_FRESHNESS_HOURS: u32 = 24;
pub(crate) const MISSION_CACHE_KEY: &str = "daily-mission.v1";
pub(crate) const MS_PER_HOUR: i64 = 3_600_000;

// History ------------------------------------------------------------------
pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 50;

// Recipes ------------------------------------------------------------------
pub(crate) const EASY_MAX_MINUTES: u32 = 25;
pub(crate) const MEDIUM_MAX_MINUTES: u32 = 45;
pub(crate) const HARD_MAX_MINUTES: u32 = 90;
pub(crate) const DEFAULT_RATING: f64 = 4.5;
pub(crate) const SCORE_PER_RATING_POINT: f64 = 20.0;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 120;
pub(crate) const FALLBACK_CUISINE: &str = "Global";

// Snapshots ----------------------------------------------------------------
pub(crate) const SNAPSHOT_VERSION: u32 = 1;
