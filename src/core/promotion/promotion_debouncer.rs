// Promotion debouncer - one accepted announcement per (member, tier) per window.
//
// Discord tends to send several member-update events for one role change, so the
// same promotion can show up more than once within a second or two.

use crate::core::tiers::Tier;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fixed-window gate keyed by (member, tier).
///
/// Entries are never swept: an expired entry just stops suppressing and is
/// overwritten the next time that key comes through.
pub struct PromotionDebouncer {
    window: Duration,
    /// (member_id, tier) -> instant until which repeats are suppressed
    expiries: DashMap<(u64, Tier), Instant>,
}

impl PromotionDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            expiries: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` if this promotion should be announced.
    ///
    /// The read and the write happen under one entry lock and this function
    /// never awaits, so two interleaved handlers cannot both be accepted.
    pub fn try_accept(&self, member_id: u64, tier: Tier, now: Instant) -> bool {
        match self.expiries.entry((member_id, tier)) {
            Entry::Occupied(mut entry) => {
                if now < *entry.get() {
                    return false;
                }
                entry.insert(now + self.window);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now + self.window);
                true
            }
        }
    }

    /// Number of keys ever seen (expired ones included).
    pub fn tracked(&self) -> usize {
        self.expiries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(3);

    #[test]
    fn repeat_within_window_is_suppressed() {
        let debouncer = PromotionDebouncer::new(WINDOW);
        let start = Instant::now();

        assert!(debouncer.try_accept(1, Tier::T2, start));
        assert!(!debouncer.try_accept(1, Tier::T2, start + Duration::from_millis(500)));
        assert!(!debouncer.try_accept(1, Tier::T2, start + Duration::from_millis(2_999)));
    }

    #[test]
    fn event_after_window_is_accepted_again() {
        let debouncer = PromotionDebouncer::new(WINDOW);
        let start = Instant::now();

        assert!(debouncer.try_accept(1, Tier::T2, start));
        assert!(!debouncer.try_accept(1, Tier::T2, start + Duration::from_secs(1)));
        assert!(debouncer.try_accept(1, Tier::T2, start + WINDOW));
        // The window restarts from the accepted event, not the first one
        assert!(!debouncer.try_accept(1, Tier::T2, start + WINDOW + Duration::from_secs(1)));
    }

    #[test]
    fn keys_are_independent() {
        let debouncer = PromotionDebouncer::new(WINDOW);
        let now = Instant::now();

        assert!(debouncer.try_accept(1, Tier::T2, now));
        assert!(debouncer.try_accept(1, Tier::T3, now));
        assert!(debouncer.try_accept(2, Tier::T2, now));
        assert_eq!(debouncer.tracked(), 3);
    }

    #[test]
    fn concurrent_duplicates_accept_exactly_once() {
        let debouncer = Arc::new(PromotionDebouncer::new(WINDOW));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let debouncer = Arc::clone(&debouncer);
                std::thread::spawn(move || debouncer.try_accept(7, Tier::T1, now))
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
