//! Portable export of every persisted ledger record.
//!
//! The digest covers the canonical JSON encoding of the body (all maps are
//! ordered), so any edit to an exported file is detected on import.
use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::completion::CompletionCounters;
use crate::constants::SNAPSHOT_VERSION;
use crate::error::LedgerError;
use crate::history::CookedRecipe;
use crate::mastery::MasteryProgress;
use crate::profile::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub version: u32,
    pub profile: Profile,
    pub counters: CompletionCounters,
    pub achievements: BTreeSet<String>,
    pub mastery: MasteryProgress,
    pub history: Vec<CookedRecipe>,
    pub digest: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotBody<'a> {
    version: u32,
    profile: &'a Profile,
    counters: &'a CompletionCounters,
    achievements: &'a BTreeSet<String>,
    mastery: &'a MasteryProgress,
    history: &'a [CookedRecipe],
}

impl LedgerSnapshot {
    #[must_use]
    pub fn new(
        profile: Profile,
        counters: CompletionCounters,
        achievements: BTreeSet<String>,
        mastery: MasteryProgress,
        history: Vec<CookedRecipe>,
    ) -> Self {
        let mut snapshot = Self {
            version: SNAPSHOT_VERSION,
            profile,
            counters,
            achievements,
            mastery,
            history,
            digest: String::new(),
        };
        snapshot.digest = snapshot.compute_digest();
        snapshot
    }

    /// Hex SHA-256 of the canonical body.
    #[must_use]
    pub fn compute_digest(&self) -> String {
        let body = SnapshotBody {
            version: self.version,
            profile: &self.profile,
            counters: &self.counters,
            achievements: &self.achievements,
            mastery: &self.mastery,
            history: &self.history,
        };
        // Every field is plain data with string keys; encoding cannot fail.
        let canonical = serde_json::to_vec(&body).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut hex, byte| {
                let _ = write!(hex, "{byte:02x}");
                hex
            })
    }

    /// # Errors
    ///
    /// Version or digest mismatch.
    pub fn verify(&self) -> Result<(), LedgerError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::SnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if self.digest != self.compute_digest() {
            return Err(LedgerError::SnapshotDigest);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::SnapshotDecode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|err| LedgerError::SnapshotDecode(err.to_string()))
    }

    /// Parse and verify an exported snapshot.
    ///
    /// # Errors
    ///
    /// Decode failure, unsupported version or digest mismatch.
    pub fn from_json(text: &str) -> Result<Self, LedgerError> {
        let snapshot: Self =
            serde_json::from_str(text).map_err(|err| LedgerError::SnapshotDecode(err.to_string()))?;
        snapshot.verify()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelCurve;

    fn sample() -> LedgerSnapshot {
        LedgerSnapshot::new(
            Profile::from_xp(1_300, &LevelCurve::default()),
            CompletionCounters::default(),
            BTreeSet::from(["first-flame".to_string()]),
            MasteryProgress::new(),
            Vec::new(),
        )
    }

    #[test]
    fn exported_json_verifies() {
        let snapshot = sample();
        assert_eq!(snapshot.digest.len(), 64);
        let json = snapshot.to_json().unwrap();
        assert_eq!(LedgerSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn tampering_is_detected() {
        let json = sample()
            .to_json()
            .unwrap()
            .replace("\"experiencePoints\": 1300", "\"experiencePoints\": 99999");
        assert_eq!(
            LedgerSnapshot::from_json(&json),
            Err(LedgerError::SnapshotDigest)
        );
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut snapshot = sample();
        snapshot.version = 7;
        assert!(matches!(
            snapshot.verify(),
            Err(LedgerError::SnapshotVersion { found: 7, .. })
        ));
        assert!(matches!(
            LedgerSnapshot::from_json("[]"),
            Err(LedgerError::SnapshotDecode(_))
        ));
    }
}
