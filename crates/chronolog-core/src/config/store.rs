use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layout of a record store on disk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One data file and one index file, growing forever (default)
    #[default]
    Indexed,

    /// A data/index pair per roll cycle, named after the cycle.
    ///
    /// Accepts `vanilla` as an alias.
    #[serde(alias = "vanilla")]
    Rolling,
}

/// Time bucket that names the active file pair of a rolling store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RollCycle {
    #[default]
    Daily,
    Hourly,
    Minutely,
}

impl RollCycle {
    fn pattern(self) -> &'static str {
        match self {
            RollCycle::Daily => "%Y%m%d",
            RollCycle::Hourly => "%Y%m%d-%H",
            RollCycle::Minutely => "%Y%m%d-%H%M",
        }
    }

    /// Name of the cycle containing `at`
    ///
    /// Names sort lexicographically in time order.
    pub fn cycle_name(self, at: DateTime<Utc>) -> String {
        at.format(self.pattern()).to_string()
    }
}

/// Options recognised when opening a record store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage layout (default: indexed)
    #[serde(default)]
    pub kind: StorageKind,

    /// Roll cycle for rolling stores (default: daily)
    #[serde(default)]
    pub roll_cycle: RollCycle,

    /// Whether every append is synced to disk before returning (default: false)
    ///
    /// When `false`, appended records reach the OS page cache immediately but
    /// may be lost on power failure.
    #[serde(default)]
    pub sync_on_append: bool,

    /// Maximum size of a single record in bytes (default: 4MB)
    #[serde(default = "default_max_record_size")]
    pub max_record_size: usize,
}

fn default_max_record_size() -> usize {
    4 * 1024 * 1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            roll_cycle: RollCycle::default(),
            sync_on_append: false,
            max_record_size: default_max_record_size(),
        }
    }
}

impl StoreConfig {
    pub fn indexed() -> Self {
        Self::default()
    }

    pub fn rolling(roll_cycle: RollCycle) -> Self {
        Self {
            kind: StorageKind::Rolling,
            roll_cycle,
            ..Self::default()
        }
    }

    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cycle_names() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        assert_eq!(RollCycle::Daily.cycle_name(at), "20240309");
        assert_eq!(RollCycle::Hourly.cycle_name(at), "20240309-07");
        assert_eq!(RollCycle::Minutely.cycle_name(at), "20240309-0705");
    }

    #[test]
    fn test_cycle_names_sort_in_time_order() {
        let a = Utc.with_ymd_and_hms(2024, 9, 30, 23, 59, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        for cycle in [RollCycle::Daily, RollCycle::Hourly, RollCycle::Minutely] {
            assert!(cycle.cycle_name(a) < cycle.cycle_name(b));
        }
    }
}
