//! Level curve: cumulative XP required per level.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_XP, DEFAULT_MAX_LEVEL};
use crate::numbers::percent_of;

/// Deterministic, strictly increasing map from level to cumulative XP.
///
/// `threshold(level) = base_xp * (2^(level - 1) - 1)`, so with the default
/// base of 400 the roadmap reads 0, 400, 1200, 2800, 6000 ... Levels stop at
/// `max_level`; a profile there has nothing left to earn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCurve {
    #[serde(default = "LevelCurve::default_base_xp")]
    pub base_xp: u64,
    #[serde(default = "LevelCurve::default_max_level")]
    pub max_level: u32,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_xp: Self::default_base_xp(),
            max_level: Self::default_max_level(),
        }
    }
}

impl LevelCurve {
    const fn default_base_xp() -> u64 {
        DEFAULT_BASE_XP
    }

    const fn default_max_level() -> u32 {
        DEFAULT_MAX_LEVEL
    }

    #[must_use]
    pub const fn new(base_xp: u64, max_level: u32) -> Self {
        Self { base_xp, max_level }
    }

    /// Cumulative XP needed to reach `level`, saturating on overflow.
    #[must_use]
    pub fn threshold(&self, level: u32) -> u64 {
        let level = level.clamp(1, self.max_level.max(1));
        let steps = 1_u64
            .checked_shl(level - 1)
            .map_or(u64::MAX, |pow| pow - 1);
        self.base_xp.saturating_mul(steps)
    }

    /// Checked variant used by configuration validation.
    #[must_use]
    pub fn checked_threshold(&self, level: u32) -> Option<u64> {
        let pow = 1_u64.checked_shl(level.checked_sub(1)?)?;
        self.base_xp.checked_mul(pow - 1)
    }

    /// Largest level whose threshold does not exceed `xp`.
    #[must_use]
    pub fn level_for(&self, xp: u64) -> u32 {
        let mut level = 1;
        while level < self.max_level && self.threshold(level + 1) <= xp {
            level += 1;
        }
        level
    }

    /// XP still missing before `level + 1`; zero once `max_level` is reached.
    #[must_use]
    pub fn xp_to_next(&self, level: u32, xp: u64) -> u64 {
        if level >= self.max_level {
            return 0;
        }
        self.threshold(level + 1).saturating_sub(xp)
    }

    /// Progress through the current level band as a 0..=100 percentage.
    #[must_use]
    pub fn progress_pct(&self, level: u32, xp: u64) -> u8 {
        if level >= self.max_level {
            return 100;
        }
        let floor = self.threshold(level);
        let ceiling = self.threshold(level + 1);
        percent_of(xp.saturating_sub(floor), ceiling.saturating_sub(floor))
    }
}

/// Display title for `level`; levels past the table reuse the last title.
#[must_use]
pub fn title_for(titles: &[String], level: u32) -> &str {
    let idx = usize::try_from(level.saturating_sub(1)).unwrap_or(usize::MAX);
    titles
        .get(idx)
        .or_else(|| titles.last())
        .map_or("", String::as_str)
}
