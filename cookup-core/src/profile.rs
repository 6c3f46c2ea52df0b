//! Profile ledger: experience points and level.
use serde::{Deserialize, Serialize};

use crate::constants::KEY_PROFILE;
use crate::error::LedgerError;
use crate::level::LevelCurve;
use crate::numbers::whole_f64_to_u64;
use crate::store::{StorageBackend, Store, lenient};

/// The user's progression snapshot.
///
/// `level` and `experience_to_next_level` are derived from
/// `experience_points` through the [`LevelCurve`]; they are persisted for
/// readers that only display them but re-derived on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub experience_points: u64,
    pub level: u32,
    pub experience_to_next_level: u64,
}

impl Profile {
    /// Profile derived purely from an XP total.
    #[must_use]
    pub fn from_xp(xp: u64, curve: &LevelCurve) -> Self {
        let level = curve.level_for(xp);
        Self {
            experience_points: xp,
            level,
            experience_to_next_level: curve.xp_to_next(level, xp),
        }
    }

    /// Fresh profile: `{0, 1, threshold(2)}`.
    #[must_use]
    pub fn fresh(curve: &LevelCurve) -> Self {
        Self::from_xp(0, curve)
    }
}

/// Persisted shape; only the XP total is trusted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    #[serde(default, deserialize_with = "lenient::or_default")]
    experience_points: u64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    level: Option<u32>,
}

/// A validated, non-negative XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct XpAmount(u64);

impl XpAmount {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u32> for XpAmount {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl TryFrom<i64> for XpAmount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| LedgerError::InvalidReward {
                value: value.to_string(),
            })
    }
}

impl TryFrom<f64> for XpAmount {
    type Error = LedgerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        whole_f64_to_u64(value)
            .map(Self)
            .ok_or_else(|| LedgerError::InvalidReward {
                value: value.to_string(),
            })
    }
}

/// Result of [`ProfileLedger::apply_reward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardOutcome {
    pub profile: Profile,
    pub levels_gained: u32,
}

/// Read and reward access to the persisted profile.
pub struct ProfileLedger<'a, B> {
    store: &'a Store<B>,
    curve: &'a LevelCurve,
}

impl<'a, B: StorageBackend> ProfileLedger<'a, B> {
    pub const fn new(store: &'a Store<B>, curve: &'a LevelCurve) -> Self {
        Self { store, curve }
    }

    /// Current profile; malformed or missing fields fall back to a fresh
    /// profile and derived fields are recomputed from XP.
    #[must_use]
    pub fn get_profile(&self) -> Profile {
        let stored: StoredProfile = self.store.read(KEY_PROFILE);
        let profile = Profile::from_xp(stored.experience_points, self.curve);
        if stored.level.is_some_and(|level| level != profile.level) {
            log::debug!(
                "stored level {:?} disagrees with {} XP, using level {}",
                stored.level,
                profile.experience_points,
                profile.level
            );
        }
        profile
    }

    /// Add `amount` XP, level up as many times as the curve allows, persist.
    pub fn apply_reward(&self, amount: XpAmount) -> RewardOutcome {
        let before = self.get_profile();
        let xp = before.experience_points.saturating_add(amount.get());
        let profile = Profile::from_xp(xp, self.curve);
        if let Err(err) = self.store.write(KEY_PROFILE, &profile) {
            log::warn!("profile could not be serialized: {err}");
        }
        let levels_gained = profile.level.saturating_sub(before.level);
        if levels_gained > 0 {
            log::info!("level up: {} -> {}", before.level, profile.level);
        }
        RewardOutcome {
            profile,
            levels_gained,
        }
    }

    /// Overwrite the stored XP total; used by snapshot import.
    pub(crate) fn replace(&self, experience_points: u64) -> Profile {
        let profile = Profile::from_xp(experience_points, self.curve);
        if let Err(err) = self.store.write(KEY_PROFILE, &profile) {
            log::warn!("profile could not be serialized: {err}");
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Notifier;
    use crate::store::MemoryBackend;

    fn store_with(raw: Option<&str>) -> Store<MemoryBackend> {
        let backend = MemoryBackend::new();
        if let Some(raw) = raw {
            backend.set_item(KEY_PROFILE, raw).unwrap();
        }
        Store::new(backend, Notifier::new())
    }

    #[test]
    fn fresh_profile_defaults() {
        let store = store_with(None);
        let curve = LevelCurve::default();
        let profile = ProfileLedger::new(&store, &curve).get_profile();
        assert_eq!(
            profile,
            Profile {
                experience_points: 0,
                level: 1,
                experience_to_next_level: 400,
            }
        );
    }

    #[test]
    fn stale_derived_fields_are_recomputed() {
        let store = store_with(Some(
            r#"{"experiencePoints":1300,"level":1,"experienceToNextLevel":999}"#,
        ));
        let curve = LevelCurve::default();
        let profile = ProfileLedger::new(&store, &curve).get_profile();
        assert_eq!(profile.level, 3);
        assert_eq!(profile.experience_to_next_level, 1_500);
    }

    #[test]
    fn type_mismatched_fields_use_defaults() {
        let store = store_with(Some(r#"{"experiencePoints":"lots","level":"high"}"#));
        let curve = LevelCurve::default();
        assert_eq!(
            ProfileLedger::new(&store, &curve).get_profile(),
            Profile::fresh(&curve)
        );
    }

    #[test]
    fn large_reward_crosses_several_levels() {
        let store = store_with(None);
        let curve = LevelCurve::default();
        let ledger = ProfileLedger::new(&store, &curve);
        let outcome = ledger.apply_reward(XpAmount::new(3_000));
        assert_eq!(outcome.profile.level, 4);
        assert_eq!(outcome.levels_gained, 3);
        assert_eq!(outcome.profile.experience_to_next_level, 6_000 - 3_000);
        assert_eq!(ledger.get_profile(), outcome.profile);
    }

    #[test]
    fn invalid_rewards_are_rejected() {
        assert!(matches!(
            XpAmount::try_from(-5_i64),
            Err(LedgerError::InvalidReward { .. })
        ));
        assert!(XpAmount::try_from(f64::NAN).is_err());
        assert!(XpAmount::try_from(2.5_f64).is_err());
        assert_eq!(XpAmount::try_from(150.0_f64), Ok(XpAmount::new(150)));
        assert_eq!(XpAmount::try_from(0_i64), Ok(XpAmount::ZERO));
    }
}
