//! Failed-action tracker.
//!
//! A safety valve against an external decision-maker looping on a
//! hopeless action: exact repeats of a recently failed `(actor, action)`
//! pair are blocked once a threshold is hit within a rolling window. It
//! keys on the full action including parameters, so a genuinely different
//! retry is never masked. This is middleware around `submit_action`, not
//! a correctness mechanism.

use rustc_hash::FxHashMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use crate::actions::Action;
use crate::core::PlayerId;

/// Rolling-window tracker of recent action failures per player.
#[derive(Debug)]
pub struct FailedActionTracker {
    window: Duration,
    limit: usize,
    failures: FxHashMap<(PlayerId, u64), VecDeque<Instant>>,
}

impl FailedActionTracker {
    /// Create a tracker blocking after `limit` identical failures within
    /// `window`.
    #[must_use]
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            window,
            limit,
            failures: FxHashMap::default(),
        }
    }

    fn fingerprint(action: &Action) -> u64 {
        let mut hasher = DefaultHasher::new();
        action.hash(&mut hasher);
        hasher.finish()
    }

    fn prune(window: Duration, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) > window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether this exact `(actor, action)` pair is currently blocked.
    pub fn is_blocked(&mut self, actor: PlayerId, action: &Action) -> bool {
        let key = (actor, Self::fingerprint(action));
        let now = Instant::now();

        match self.failures.get_mut(&key) {
            Some(timestamps) => {
                Self::prune(self.window, timestamps, now);
                timestamps.len() >= self.limit
            }
            None => false,
        }
    }

    /// Record a failure for this pair.
    pub fn record_failure(&mut self, actor: PlayerId, action: &Action) {
        let key = (actor, Self::fingerprint(action));
        let now = Instant::now();

        let timestamps = self.failures.entry(key).or_default();
        Self::prune(self.window, timestamps, now);
        timestamps.push_back(now);
    }

    /// Forget failures for this pair after it finally succeeds.
    pub fn clear(&mut self, actor: PlayerId, action: &Action) {
        self.failures.remove(&(actor, Self::fingerprint(action)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SquareId;

    fn tracker() -> FailedActionTracker {
        FailedActionTracker::new(Duration::from_secs(60), 3)
    }

    #[test]
    fn test_blocks_after_limit() {
        let mut t = tracker();
        let actor = PlayerId::new(0);
        let action = Action::BuyProperty;

        assert!(!t.is_blocked(actor, &action));
        t.record_failure(actor, &action);
        t.record_failure(actor, &action);
        assert!(!t.is_blocked(actor, &action));
        t.record_failure(actor, &action);
        assert!(t.is_blocked(actor, &action));
    }

    #[test]
    fn test_different_params_not_conflated() {
        let mut t = tracker();
        let actor = PlayerId::new(0);

        for _ in 0..3 {
            t.record_failure(actor, &Action::Bid { amount: 50 });
        }

        assert!(t.is_blocked(actor, &Action::Bid { amount: 50 }));
        assert!(!t.is_blocked(actor, &Action::Bid { amount: 60 }));
    }

    #[test]
    fn test_different_actors_not_conflated() {
        let mut t = tracker();
        let action = Action::Mortgage { square: SquareId::new(3) };

        for _ in 0..3 {
            t.record_failure(PlayerId::new(0), &action);
        }

        assert!(t.is_blocked(PlayerId::new(0), &action));
        assert!(!t.is_blocked(PlayerId::new(1), &action));
    }

    #[test]
    fn test_clear_on_success() {
        let mut t = tracker();
        let actor = PlayerId::new(0);
        let action = Action::EndTurn;

        for _ in 0..3 {
            t.record_failure(actor, &action);
        }
        assert!(t.is_blocked(actor, &action));

        t.clear(actor, &action);
        assert!(!t.is_blocked(actor, &action));
    }

    #[test]
    fn test_window_expiry() {
        let mut t = FailedActionTracker::new(Duration::from_millis(10), 2);
        let actor = PlayerId::new(0);
        let action = Action::Wait;

        t.record_failure(actor, &action);
        t.record_failure(actor, &action);
        assert!(t.is_blocked(actor, &action));

        std::thread::sleep(Duration::from_millis(20));
        assert!(!t.is_blocked(actor, &action));
    }
}
