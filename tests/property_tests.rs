//! Property-based tests for fanout_logger using proptest

use fanout_logger::prelude::*;
use fanout_logger::MultiWriter;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
        Just(LogLevel::Panic),
    ]
}

fn any_level_set() -> impl Strategy<Value = LevelSet> {
    proptest::collection::vec(any_level(), 0..7).prop_map(LevelSet::of)
}

/// Records every level it is asked to write
struct LevelProbe {
    levels: LevelSet,
    seen: Mutex<Vec<LogLevel>>,
}

impl Sink for LevelProbe {
    fn name(&self) -> &str {
        "probe"
    }

    fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn write(&self, record: &[u8]) -> Result<usize> {
        Ok(record.len())
    }

    fn write_level(&self, level: LogLevel, record: &[u8]) -> Result<usize> {
        if self.levels.contains(level) {
            self.seen.lock().push(level);
        }
        Ok(record.len())
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
    }
}

// ============================================================================
// LevelSet Tests
// ============================================================================

proptest! {
    #[test]
    fn test_restrict_min_keeps_only_higher(set in any_level_set(), bound in any_level()) {
        let restricted = set.restrict_min(bound);
        for level in LogLevel::ALL {
            prop_assert_eq!(
                restricted.contains(level),
                set.contains(level) && level >= bound
            );
        }
    }

    #[test]
    fn test_restrict_max_keeps_only_lower(set in any_level_set(), bound in any_level()) {
        let restricted = set.restrict_max(bound);
        for level in LogLevel::ALL {
            prop_assert_eq!(
                restricted.contains(level),
                set.contains(level) && level <= bound
            );
        }
    }

    #[test]
    fn test_restrict_does_not_change_source(set in any_level_set(), bound in any_level()) {
        let before = set.clone();
        let _ = set.restrict_min(bound).restrict_max(bound);
        prop_assert_eq!(set, before);
    }

    #[test]
    fn test_min_max_bounds_members(set in any_level_set()) {
        match (set.min(), set.max()) {
            (Some(min), Some(max)) => {
                prop_assert!(min <= max);
                for level in set.iter() {
                    prop_assert!(min <= level && level <= max);
                }
            }
            (None, None) => prop_assert!(set.is_empty()),
            _ => prop_assert!(false, "min and max disagree"),
        }
    }
}

// ============================================================================
// Routing Tests
// ============================================================================

proptest! {
    #[test]
    fn test_multi_writer_routes_by_level_set(
        sets in proptest::collection::vec(any_level_set(), 1..5),
        levels in proptest::collection::vec(any_level(), 0..20),
    ) {
        let probes: Vec<Arc<LevelProbe>> = sets
            .into_iter()
            .map(|levels| Arc::new(LevelProbe { levels, seen: Mutex::new(Vec::new()) }))
            .collect();
        let writer = MultiWriter::new(
            probes.iter().map(|p| p.clone() as Arc<dyn Sink>).collect(),
        );

        for level in &levels {
            prop_assert_eq!(writer.write_level(*level, b"{}\n").unwrap(), 3);
        }

        for probe in &probes {
            let expected: Vec<LogLevel> = levels
                .iter()
                .copied()
                .filter(|l| probe.levels.contains(*l))
                .collect();
            prop_assert_eq!(&*probe.seen.lock(), &expected);
        }
    }
}
