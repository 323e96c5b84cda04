//! Resource statistics and the textual statistics report
//!
//! The report format is parsed by ground tooling; its labels and field
//! order are fixed:
//!
//! ```text
//! tasks:
//!   created: 3
//!   deleted: 1
//!   current: 2
//!
//! counting_semaphores:
//!   ...
//! ```

use core_types::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters for one resource kind
///
/// `current == created - deleted` holds for every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub created: u64,
    pub deleted: u64,
    pub current: u64,
}

impl ResourceStats {
    /// Builds a snapshot from the two monotone counters
    pub fn from_counters(created: u64, deleted: u64) -> Self {
        Self {
            created,
            deleted,
            current: created - deleted,
        }
    }

    /// Checks the counter invariant
    pub fn is_consistent(&self) -> bool {
        self.deleted <= self.created && self.current == self.created - self.deleted
    }
}

impl fmt::Display for ResourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  created: {}", self.created)?;
        writeln!(f, "  deleted: {}", self.deleted)?;
        write!(f, "  current: {}", self.current)
    }
}

/// Statistics of one kind, as listed in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub stats: ResourceStats,
}

/// Statistics of every kind, in report order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub kinds: Vec<KindStats>,
}

impl StatsReport {
    /// Creates an empty report
    pub fn new() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Builder: appends the statistics of one kind
    pub fn with_kind(mut self, kind: ResourceKind, stats: ResourceStats) -> Self {
        self.kinds.push(KindStats { kind, stats });
        self
    }

    /// Looks up the statistics of one kind
    pub fn get(&self, kind: ResourceKind) -> Option<ResourceStats> {
        self.kinds
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.stats)
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.kinds.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", entry.kind.label())?;
            writeln!(f, "{}", entry.stats)?;
        }
        Ok(())
    }
}
