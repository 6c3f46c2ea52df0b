//! CookUp progression core
//!
//! Platform-agnostic progression ledger for the CookUp Kitchen cooking game:
//! experience and levels, completion counters, achievements, the daily
//! mission cache and cuisine mastery trees. This crate performs no I/O of
//! its own; storage and the recipe provider are injected by the platform.

pub mod achievements;
pub mod completion;
pub mod config;
pub mod constants;
pub mod daily;
pub mod error;
pub mod history;
pub mod ledger;
pub mod level;
pub mod mastery;
pub mod notifier;
pub mod numbers;
pub mod profile;
pub mod provider;
pub mod recipes;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use achievements::{AchievementDefinition, AchievementEvaluator, CATALOG as ACHIEVEMENTS};
pub use completion::{CompletionCounters, CompletionLedger, Counter, CounterKind, UniqueRecord};
pub use config::{AchievementRewardPolicy, ConfigError, ConfigLoadError, ProgressionConfig};
pub use daily::{
    Clock, DailyCompletion, DailyCompletionFlag, DailyMissionCache, DailyMissionRecord,
    ManualClock, MissionLookup, SystemClock,
};
pub use error::LedgerError;
pub use history::{CookHistory, CookedRecipe};
pub use ledger::{CookOutcome, LedgerOutcome, MasteryOutcome, ProgressionLedger};
pub use level::{LevelCurve, title_for};
pub use mastery::{
    BossMeal, CuisineTree, MasteryCatalog, MasteryLedger, MasteryProgress, MealToggle, TierView,
};
pub use notifier::{Notifier, NotifyBatch, Subscription, Topic};
pub use profile::{Profile, ProfileLedger, RewardOutcome, XpAmount};
pub use provider::{
    FixtureProvider, Ingredient, InstructionStep, ProviderError, RecipeDetail, RecipeProvider,
    SearchPage, SearchQuery, SpoonacularEndpoints,
};
pub use recipes::{CUISINE_FILTERS, Difficulty, RecipeSummary};
pub use snapshot::LedgerSnapshot;
pub use store::{
    ExternalBridge, MediumContext, MemoryBackend, SharedMedium, StorageBackend, Store, StoreError,
};
