//! Per-sink level filter

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// The set of levels a sink accepts.
///
/// A `LevelSet` is never changed in place: [`restrict_min`](Self::restrict_min)
/// and [`restrict_max`](Self::restrict_max) build a new set.
///
/// # Example
///
/// ```
/// use fanout_logger::{LevelSet, LogLevel};
///
/// let errors_only = LevelSet::new().restrict_min(LogLevel::Error);
/// assert!(errors_only.contains(LogLevel::Panic));
/// assert!(!errors_only.contains(LogLevel::Warn));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelSet {
    levels: Vec<LogLevel>,
}

impl LevelSet {
    /// All levels from trace to panic, ascending
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: LogLevel::ALL.to_vec(),
        }
    }

    /// Exactly the given levels, in the given order.
    ///
    /// The order is kept as supplied; sort explicitly if it matters for display.
    #[must_use]
    pub fn of<I: IntoIterator<Item = LogLevel>>(levels: I) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Keep only levels at or above `level`
    #[must_use]
    pub fn restrict_min(&self, level: LogLevel) -> Self {
        self.filtered(|l| l >= level)
    }

    /// Keep only levels at or below `level`
    #[must_use]
    pub fn restrict_max(&self, level: LogLevel) -> Self {
        self.filtered(|l| l <= level)
    }

    /// Keep only levels matching `keep`, preserving order
    #[must_use]
    pub fn filtered<F: Fn(LogLevel) -> bool>(&self, keep: F) -> Self {
        Self {
            levels: self.levels.iter().copied().filter(|l| keep(*l)).collect(),
        }
    }

    /// Lowest severity in the set
    pub fn min(&self) -> Option<LogLevel> {
        self.levels.iter().copied().min()
    }

    /// Highest severity in the set
    pub fn max(&self) -> Option<LogLevel> {
        self.levels.iter().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = LogLevel> + '_ {
        self.levels.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<LogLevel> for LevelSet {
    fn from_iter<I: IntoIterator<Item = LogLevel>>(iter: I) -> Self {
        Self::of(iter)
    }
}
