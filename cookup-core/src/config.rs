//! Progression tuning loaded from the bundled `progression.json` asset.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_DAILY_MISSION_XP, DEFAULT_HISTORY_LIMIT, DEFAULT_MASTERY_BOSS_XP,
    DEFAULT_MASTERY_MEAL_XP, DEFAULT_MISSION_FRESHNESS_HOURS, MAX_LEVEL_CAP, MS_PER_HOUR,
};
use crate::level::LevelCurve;

const DEFAULT_PROGRESSION_DATA: &str =
    include_str!("../../cookup-web/static/assets/data/progression.json");

/// Whether achievement rewards feed back into the profile's XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementRewardPolicy {
    /// Unlocks apply their XP reward, which may cascade into further unlocks.
    #[default]
    Grant,
    /// Unlocks are recorded but never change XP.
    Withhold,
}

/// Errors raised when progression configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("level curve base_xp must be positive")]
    ZeroBaseXp,
    #[error("max_level must be between 2 and {cap} (got {value})")]
    MaxLevelRange { cap: u32, value: u32 },
    #[error("level curve overflows before level {0}")]
    CurveOverflow(u32),
    #[error("mission freshness window must be at least one hour")]
    ZeroFreshness,
    #[error("at least one level title is required")]
    NoTitles,
    #[error("history limit must be positive")]
    ZeroHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub level_curve: LevelCurve,
    #[serde(default = "ProgressionConfig::default_level_titles")]
    pub level_titles: Vec<String>,
    #[serde(default = "ProgressionConfig::default_daily_mission_xp")]
    pub daily_mission_xp: u64,
    #[serde(default = "ProgressionConfig::default_mission_freshness_hours")]
    pub mission_freshness_hours: u32,
    #[serde(default = "ProgressionConfig::default_mastery_meal_xp")]
    pub mastery_meal_xp: u64,
    #[serde(default = "ProgressionConfig::default_mastery_boss_xp")]
    pub mastery_boss_xp: u64,
    #[serde(default)]
    pub achievement_rewards: AchievementRewardPolicy,
    #[serde(default = "ProgressionConfig::default_repeat_cook_rewards")]
    pub repeat_cook_rewards: bool,
    #[serde(default = "ProgressionConfig::default_history_limit")]
    pub history_limit: usize,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_curve: LevelCurve::default(),
            level_titles: Self::default_level_titles(),
            daily_mission_xp: Self::default_daily_mission_xp(),
            mission_freshness_hours: Self::default_mission_freshness_hours(),
            mastery_meal_xp: Self::default_mastery_meal_xp(),
            mastery_boss_xp: Self::default_mastery_boss_xp(),
            achievement_rewards: AchievementRewardPolicy::default(),
            repeat_cook_rewards: Self::default_repeat_cook_rewards(),
            history_limit: Self::default_history_limit(),
        }
    }
}

impl ProgressionConfig {
    fn default_level_titles() -> Vec<String> {
        [
            "Prep Cook",
            "Knife Rookie",
            "Spice Trainee",
            "Flavor Architect",
            "Culinary Boss",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    const fn default_daily_mission_xp() -> u64 {
        DEFAULT_DAILY_MISSION_XP
    }

    const fn default_mission_freshness_hours() -> u32 {
        DEFAULT_MISSION_FRESHNESS_HOURS
    }

    const fn default_mastery_meal_xp() -> u64 {
        DEFAULT_MASTERY_MEAL_XP
    }

    const fn default_mastery_boss_xp() -> u64 {
        DEFAULT_MASTERY_BOSS_XP
    }

    const fn default_repeat_cook_rewards() -> bool {
        true
    }

    const fn default_history_limit() -> usize {
        DEFAULT_HISTORY_LIMIT
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the document cannot be parsed, or the
    /// violated invariant when it parses but is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Bundled configuration, or built-in defaults if the asset is unusable.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_PROGRESSION_DATA).unwrap_or_else(|err| {
            log::warn!("bundled progression config rejected, using defaults: {err}");
            Self::default()
        })
    }

    /// Check the invariants every ledger relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let curve = &self.level_curve;
        if curve.base_xp == 0 {
            return Err(ConfigError::ZeroBaseXp);
        }
        if !(2..=MAX_LEVEL_CAP).contains(&curve.max_level) {
            return Err(ConfigError::MaxLevelRange {
                cap: MAX_LEVEL_CAP,
                value: curve.max_level,
            });
        }
        if curve.checked_threshold(curve.max_level).is_none() {
            return Err(ConfigError::CurveOverflow(curve.max_level));
        }
        if self.mission_freshness_hours == 0 {
            return Err(ConfigError::ZeroFreshness);
        }
        if self.level_titles.is_empty() {
            return Err(ConfigError::NoTitles);
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        Ok(())
    }

    /// Freshness window of the daily-mission cache in milliseconds.
    #[must_use]
    pub fn mission_freshness_ms(&self) -> i64 {
        i64::from(self.mission_freshness_hours).saturating_mul(MS_PER_HOUR)
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
