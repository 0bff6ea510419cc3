//! Page replacement policies.
//!
//! A policy only ever sees page IDs. It mirrors the set of resident pages and
//! picks a victim when the pool needs room; it never touches page contents.

use crate::buffer::{ClockReplacer, FifoReplacer, LruReplacer};
use crate::error::{Result, StorageError};
use crate::types::PageId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for eviction strategies
pub trait ReplacementPolicy {
    /// Notify the policy of a cache hit on a resident page
    fn access(&mut self, page_id: PageId);

    /// Notify the policy that a page became resident
    fn add_page(&mut self, page_id: PageId);

    /// Choose a victim and stop tracking it
    ///
    /// Fails with `EmptyPolicy` when nothing is tracked.
    fn evict(&mut self) -> Result<PageId>;

    /// Number of tracked pages
    fn len(&self) -> usize;

    /// Whether no pages are tracked
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects a replacement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Least recently used
    #[default]
    Lru,
    /// First in, first out
    Fifo,
    /// Clock / second chance
    Clock,
}

impl PolicyKind {
    /// All available policies
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Lru, PolicyKind::Fifo, PolicyKind::Clock];

    /// Lowercase policy name
    pub fn name(self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Fifo => "fifo",
            Self::Clock => "clock",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "fifo" => Ok(Self::Fifo),
            "clock" => Ok(Self::Clock),
            other => Err(StorageError::invalid_config(format!(
                "unknown replacement policy '{}'",
                other
            ))),
        }
    }
}

/// Closed set of policies, dispatched without boxing
pub enum Replacer {
    Lru(LruReplacer),
    Fifo(FifoReplacer),
    Clock(ClockReplacer),
}

impl Replacer {
    /// Create a fresh policy of the given kind
    pub fn new(kind: PolicyKind, capacity: usize) -> Self {
        match kind {
            PolicyKind::Lru => Self::Lru(LruReplacer::new(capacity)),
            PolicyKind::Fifo => Self::Fifo(FifoReplacer::new(capacity)),
            PolicyKind::Clock => Self::Clock(ClockReplacer::new(capacity)),
        }
    }

    /// Which policy this is
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Lru(_) => PolicyKind::Lru,
            Self::Fifo(_) => PolicyKind::Fifo,
            Self::Clock(_) => PolicyKind::Clock,
        }
    }
}

impl ReplacementPolicy for Replacer {
    fn access(&mut self, page_id: PageId) {
        match self {
            Self::Lru(p) => p.access(page_id),
            Self::Fifo(p) => p.access(page_id),
            Self::Clock(p) => p.access(page_id),
        }
    }

    fn add_page(&mut self, page_id: PageId) {
        match self {
            Self::Lru(p) => p.add_page(page_id),
            Self::Fifo(p) => p.add_page(page_id),
            Self::Clock(p) => p.add_page(page_id),
        }
    }

    fn evict(&mut self) -> Result<PageId> {
        match self {
            Self::Lru(p) => p.evict(),
            Self::Fifo(p) => p.evict(),
            Self::Clock(p) => p.evict(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Lru(p) => p.len(),
            Self::Fifo(p) => p.len(),
            Self::Clock(p) => p.len(),
        }
    }
}
