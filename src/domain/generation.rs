// src/domain/generation.rs
//
// Generation tokens
//
// Every snapshot of a build and every listing request is stamped with a
// token taken from a monotonically increasing counter. Asynchronous results
// carry the token they were started with; a result whose token is no longer
// the latest is discarded when it arrives.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// The token no request is ever stamped with
    pub const ZERO: Generation = Generation(0);

    pub fn value(self) -> u64 {
        self.0
    }

    /// True when a result started at `self` may still be applied while
    /// `latest` is the newest issued token.
    pub fn is_current(self, latest: Generation) -> bool {
        self == latest
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues generations; never hands out the same value twice
#[derive(Debug, Default)]
pub struct GenerationCounter {
    last: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> Generation {
        Generation(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.last.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_strictly_increasing() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.latest(), Generation::ZERO);

        let first = counter.next();
        let second = counter.next();

        assert!(second > first);
        assert_eq!(counter.latest(), second);
        assert!(second.is_current(counter.latest()));
        assert!(!first.is_current(counter.latest()));
    }
}
