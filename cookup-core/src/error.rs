//! Ledger contract violations.
use thiserror::Error;

use crate::completion::CounterKind;
use crate::recipes::Difficulty;

/// Errors raised when a caller breaks a ledger contract.
///
/// None of these are recoverable runtime conditions; ledger state is left
/// untouched whenever one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("reward must be a non-negative whole number of XP (got {value})")]
    InvalidReward { value: String },
    #[error("unknown completion counter '{0}'")]
    UnknownCounter(String),
    #[error("counter '{counter}' is a {actual} counter and cannot be used as {expected}")]
    CounterKindMismatch {
        counter: &'static str,
        expected: CounterKind,
        actual: CounterKind,
    },
    #[error("unknown cuisine '{0}'")]
    UnknownCuisine(String),
    #[error("cuisine '{cuisine}' has {tiers} tiers (got tier {tier})")]
    TierOutOfRange {
        cuisine: String,
        tier: usize,
        tiers: usize,
    },
    #[error("boss tier for '{0}' is locked until every regular meal is checked")]
    BossLocked(String),
    #[error("{difficulty} recipes unlock at level {required} (current level {level})")]
    RecipeLocked {
        difficulty: Difficulty,
        required: u32,
        level: u32,
    },
    #[error("snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
    #[error("snapshot digest mismatch: the export was modified or truncated")]
    SnapshotDigest,
    #[error("snapshot could not be decoded: {0}")]
    SnapshotDecode(String),
}
