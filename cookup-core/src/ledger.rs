//! The progression façade every UI surface talks to.
//!
//! Each operation runs inside one notifier batch: it re-reads the ledgers
//! from the store, records completion events, applies the reward, evaluates
//! achievements, and only then lets observers see the topics it touched.
use std::collections::BTreeSet;

use crate::achievements::{AchievementDefinition, AchievementEvaluator, CATALOG};
use crate::completion::{CompletionCounters, CompletionLedger, Counter};
use crate::config::{AchievementRewardPolicy, ProgressionConfig};
use crate::daily::{Clock, DailyCompletionFlag, DailyMissionCache, MissionLookup, SystemClock};
use crate::error::LedgerError;
use crate::history::{CookHistory, CookedRecipe};
use crate::level::title_for;
use crate::mastery::{MasteryCatalog, MasteryLedger, MealToggle};
use crate::notifier::{Notifier, Subscription, Topic};
use crate::profile::{Profile, ProfileLedger, XpAmount};
use crate::provider::RecipeProvider;
use crate::recipes::RecipeSummary;
use crate::snapshot::LedgerSnapshot;
use crate::store::{ExternalBridge, StorageBackend, Store};

/// What a ledger operation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOutcome {
    /// Total XP added, achievement rewards included.
    pub xp_awarded: u64,
    pub levels_gained: u32,
    pub profile: Profile,
    pub unlocked: Vec<&'static AchievementDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookOutcome {
    pub first_time: bool,
    pub new_cuisine: bool,
    pub outcome: LedgerOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryOutcome {
    pub toggle: MealToggle,
    pub outcome: LedgerOutcome,
}

pub struct ProgressionLedger<B, C = SystemClock> {
    store: Store<B>,
    clock: C,
    config: ProgressionConfig,
    catalog: MasteryCatalog,
    _bridge: Option<ExternalBridge>,
}

impl<B: StorageBackend> ProgressionLedger<B, SystemClock> {
    /// Ledger over `backend` with the bundled configuration and catalog.
    pub fn new(backend: B) -> Self {
        Self::with_parts(
            backend,
            SystemClock,
            ProgressionConfig::load_from_static(),
            MasteryCatalog::default_catalog().clone(),
        )
    }
}

impl<B: StorageBackend, C: Clock> ProgressionLedger<B, C> {
    pub fn with_parts(
        backend: B,
        clock: C,
        config: ProgressionConfig,
        catalog: MasteryCatalog,
    ) -> Self {
        let notifier = Notifier::new();
        let bridge = backend.bridge_external(&notifier);
        Self {
            store: Store::new(backend, notifier),
            clock,
            config,
            catalog,
            _bridge: bridge,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store<B> {
        &self.store
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        self.store.notifier()
    }

    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &MasteryCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, topic: Topic, handler: impl Fn() + 'static) -> Subscription {
        self.store.subscribe(topic, handler)
    }

    fn profiles(&self) -> ProfileLedger<'_, B> {
        ProfileLedger::new(&self.store, &self.config.level_curve)
    }

    fn completion(&self) -> CompletionLedger<'_, B> {
        CompletionLedger::new(&self.store)
    }

    fn achievements(&self) -> AchievementEvaluator<'_, B> {
        AchievementEvaluator::new(&self.store)
    }

    fn cook_history(&self) -> CookHistory<'_, B> {
        CookHistory::new(&self.store, self.config.history_limit)
    }

    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profiles().get_profile()
    }

    #[must_use]
    pub fn level_title(&self) -> &str {
        title_for(&self.config.level_titles, self.profile().level)
    }

    #[must_use]
    pub fn progress_pct(&self) -> u8 {
        let profile = self.profile();
        self.config
            .level_curve
            .progress_pct(profile.level, profile.experience_points)
    }

    #[must_use]
    pub fn counters(&self) -> CompletionCounters {
        self.completion().counters()
    }

    #[must_use]
    pub fn unlocked_achievements(&self) -> BTreeSet<String> {
        self.achievements().unlocked()
    }

    #[must_use]
    pub fn history(&self) -> Vec<CookedRecipe> {
        self.cook_history().entries()
    }

    #[must_use]
    pub fn mastery(&self) -> MasteryLedger<'_, B> {
        MasteryLedger::new(&self.store, &self.catalog)
    }

    #[must_use]
    pub fn daily(&self) -> DailyMissionCache<'_, B, C> {
        DailyMissionCache::new(&self.store, &self.clock, self.config.mission_freshness_ms())
    }

    #[must_use]
    pub fn daily_completion(&self) -> DailyCompletionFlag<'_, B, C> {
        DailyCompletionFlag::new(&self.store, &self.clock)
    }

    /// Today's mission from the cache, or from `provider` when stale.
    pub async fn daily_mission<P>(&self, provider: &P) -> MissionLookup<RecipeSummary>
    where
        P: RecipeProvider + ?Sized,
    {
        self.daily()
            .get_or_fetch(|| provider.random_recipe())
            .await
    }

    /// Award XP outside any recorded accomplishment.
    pub fn grant_xp(&self, amount: XpAmount) -> LedgerOutcome {
        let _batch = self.notifier().hold();
        let before = self.profile();
        self.settle(before, amount)
    }

    /// Finish cooking `recipe`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::RecipeLocked`] when the profile level is below the
    /// recipe's difficulty tier; nothing is recorded in that case.
    pub fn cook_recipe(&self, recipe: &RecipeSummary) -> Result<CookOutcome, LedgerError> {
        let _batch = self.notifier().hold();
        let before = self.profile();
        let difficulty = recipe.difficulty();
        if recipe.is_locked_for(before.level) {
            return Err(LedgerError::RecipeLocked {
                difficulty,
                required: difficulty.unlock_level(),
                level: before.level,
            });
        }

        let recipe_id = recipe.id.to_string();
        let cuisine = recipe.primary_cuisine().to_string();
        let completion = self.completion();
        let cooked = completion.record_unique_event(Counter::RecipesCompleted, &recipe_id)?;
        let new_cuisine = completion
            .record_unique_event(Counter::UniqueCuisinesCooked, &cuisine)?
            .was_new;
        if recipe.is_breakfast() {
            completion.record_unique_event(Counter::BreakfastRecipesCompleted, &recipe_id)?;
        }

        let reward = if cooked.was_new || self.config.repeat_cook_rewards {
            recipe.xp_reward()
        } else {
            XpAmount::ZERO
        };
        self.cook_history().push(CookedRecipe {
            recipe_id,
            title: recipe.title.clone(),
            cuisine,
            xp_awarded: reward.get(),
            cooked_at_ms: self.clock.now_ms(),
        });

        Ok(CookOutcome {
            first_time: cooked.was_new,
            new_cuisine,
            outcome: self.settle(before, reward),
        })
    }

    /// Complete today's mission. `None` if it was already completed today.
    ///
    /// # Errors
    ///
    /// Only on an internal counter misconfiguration.
    pub fn complete_daily_mission(&self) -> Result<Option<LedgerOutcome>, LedgerError> {
        let _batch = self.notifier().hold();
        let before = self.profile();
        if !self.daily_completion().mark_completed_today() {
            log::debug!("daily mission already completed today");
            return Ok(None);
        }
        self.completion()
            .increment_counter(Counter::DailyMissionsCompleted)?;
        Ok(Some(
            self.settle(before, XpAmount::new(self.config.daily_mission_xp)),
        ))
    }

    /// Check or uncheck one mastery tier. Only the first check of a tier
    /// ever pays out or counts.
    ///
    /// # Errors
    ///
    /// Unknown cuisine, tier out of range, or a locked boss tier.
    pub fn toggle_mastery_meal(
        &self,
        cuisine: &str,
        tier: usize,
    ) -> Result<MasteryOutcome, LedgerError> {
        let _batch = self.notifier().hold();
        let before = self.profile();
        let toggle = self.mastery().toggle(cuisine, tier)?;
        let mut reward = XpAmount::ZERO;
        if toggle.checked {
            let completion = self.completion();
            let meal = completion
                .record_unique_event(Counter::MasteryMealsCompleted, &format!("{cuisine}#{tier}"))?;
            if toggle.is_boss {
                let boss = completion.record_unique_event(Counter::CuisineBossesDefeated, cuisine)?;
                if boss.was_new {
                    log::info!("cuisine boss defeated: {cuisine}");
                    reward = XpAmount::new(self.config.mastery_boss_xp);
                }
            } else if meal.was_new {
                reward = XpAmount::new(self.config.mastery_meal_xp);
            }
        }
        Ok(MasteryOutcome {
            toggle,
            outcome: self.settle(before, reward),
        })
    }

    /// Erase every persisted record in the application namespace.
    pub fn reset(&self) {
        log::info!("resetting progression data");
        self.store.clear_namespace();
    }

    #[must_use]
    pub fn export_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(
            self.profile(),
            self.counters(),
            self.unlocked_achievements(),
            self.mastery().progress(),
            self.history(),
        )
    }

    /// Replace all progression data with `snapshot`.
    ///
    /// # Errors
    ///
    /// Version or digest mismatch; nothing is written in that case.
    pub fn import_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<Profile, LedgerError> {
        snapshot.verify()?;
        let _batch = self.notifier().hold();
        self.store.clear_namespace();
        let profile = self.profiles().replace(snapshot.profile.experience_points);
        self.completion().replace(&snapshot.counters);
        self.achievements().merge(&snapshot.achievements);
        self.mastery().replace(&snapshot.mastery);
        self.cook_history().replace(snapshot.history.clone());
        log::info!(
            "imported snapshot: level {}, {} achievements",
            profile.level,
            snapshot.achievements.len()
        );
        Ok(profile)
    }

    /// Apply `reward`, then unlock achievements until nothing changes.
    fn settle(&self, before: Profile, reward: XpAmount) -> LedgerOutcome {
        let profiles = self.profiles();
        let evaluator = self.achievements();
        let mut awarded = reward.get();
        let mut profile = if reward == XpAmount::ZERO {
            before
        } else {
            profiles.apply_reward(reward).profile
        };
        let mut unlocked = Vec::new();

        // Each pass unlocks at least one entry or stops.
        for _ in 0..=CATALOG.len() {
            let fresh = evaluator.evaluate_all(&profile, &self.counters());
            if fresh.is_empty() {
                break;
            }
            let bonus: u64 = fresh.iter().map(|def| def.reward_xp).sum();
            unlocked.extend(fresh);
            if self.config.achievement_rewards == AchievementRewardPolicy::Withhold || bonus == 0 {
                continue;
            }
            awarded = awarded.saturating_add(bonus);
            profile = profiles.apply_reward(XpAmount::new(bonus)).profile;
        }

        LedgerOutcome {
            xp_awarded: awarded,
            levels_gained: profile.level.saturating_sub(before.level),
            profile,
            unlocked,
        }
    }
}
