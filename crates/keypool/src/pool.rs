//! Key state and priority-order selection
//!
//! Keys are scanned in configuration order, so the first key in the config
//! carries most of the traffic and later keys act as spares. Freeze deadlines
//! never shorten: re-freezing keeps the later of the existing and new
//! deadlines.
//!
//! The pool is touched only from the single poll-cycle context, so it keeps
//! plain owned state behind `&mut self` rather than locks.

use std::time::{Duration, Instant};

use tracing::{debug, info};

/// One pooled key: the opaque value sent upstream plus its freeze deadline.
///
/// A key is available iff `frozen_until` is absent or in the past.
#[derive(Debug, Clone)]
struct KeyEntry {
    id: String,
    frozen_until: Option<Instant>,
}

/// Pool status summary for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCounts {
    pub total: usize,
    pub available: usize,
    pub frozen: usize,
}

/// Pool of API keys with cooldown-based freezing.
pub struct KeyPool {
    keys: Vec<KeyEntry>,
}

impl KeyPool {
    /// Create a pool from the configured key list. Order is priority order.
    pub fn new(keys: Vec<String>) -> Self {
        info!(keys = keys.len(), "key pool initialized");
        Self {
            keys: keys
                .into_iter()
                .map(|id| KeyEntry {
                    id,
                    frozen_until: None,
                })
                .collect(),
        }
    }

    /// Return the first key in configuration order that is not frozen.
    ///
    /// Expired freezes are cleared here; there is no background thaw task.
    /// `None` means every key is frozen — a legitimate no-capacity state the
    /// caller skips the cycle on, not an error.
    pub fn acquire(&mut self) -> Option<String> {
        let now = Instant::now();
        for entry in &mut self.keys {
            match entry.frozen_until {
                None => return Some(entry.id.clone()),
                Some(until) if until <= now => {
                    info!(key = %entry.id, "freeze expired, key available again");
                    entry.frozen_until = None;
                    return Some(entry.id.clone());
                }
                Some(_) => {}
            }
        }
        None
    }

    /// Freeze a key for `duration` from now.
    ///
    /// Re-freezing keeps the later deadline, so a short freeze can never
    /// shorten a longer one already in effect. Unknown key ids are ignored.
    pub fn freeze(&mut self, key: &str, duration: Duration) {
        let deadline = Instant::now() + duration;
        for entry in &mut self.keys {
            if entry.id == key {
                let extended = match entry.frozen_until {
                    Some(existing) => existing.max(deadline),
                    None => deadline,
                };
                entry.frozen_until = Some(extended);
                info!(key = %entry.id, freeze_secs = duration.as_secs(), "key frozen");
                return;
            }
        }
        debug!(key = %key, "freeze requested for unknown key, ignoring");
    }

    /// Count keys by state, for the exhausted-pool log line.
    pub fn counts(&self) -> PoolCounts {
        let now = Instant::now();
        let frozen = self
            .keys
            .iter()
            .filter(|e| matches!(e.frozen_until, Some(until) if until > now))
            .count();
        PoolCounts {
            total: self.keys.len(),
            available: self.keys.len() - frozen,
            frozen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(keys: &[&str]) -> KeyPool {
        KeyPool::new(keys.iter().map(|k| k.to_string()).collect())
    }

    #[test]
    fn acquire_returns_keys_in_configuration_order() {
        let mut pool = pool(&["alpha", "beta", "gamma"]);
        // Without freezes the first key always wins
        assert_eq!(pool.acquire().as_deref(), Some("alpha"));
        assert_eq!(pool.acquire().as_deref(), Some("alpha"));
    }

    #[test]
    fn frozen_key_is_skipped() {
        let mut pool = pool(&["alpha", "beta"]);
        pool.freeze("alpha", Duration::from_secs(3600));
        assert_eq!(pool.acquire().as_deref(), Some("beta"));
    }

    #[test]
    fn all_frozen_returns_none() {
        let mut pool = pool(&["alpha", "beta"]);
        pool.freeze("alpha", Duration::from_secs(3600));
        pool.freeze("beta", Duration::from_secs(3600));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn expired_freeze_thaws_on_acquire() {
        let mut pool = pool(&["alpha"]);
        pool.freeze("alpha", Duration::from_secs(0));
        // Zero-duration freeze expires as soon as the clock advances
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(pool.acquire().as_deref(), Some("alpha"));
    }

    #[test]
    fn refreeze_keeps_later_deadline() {
        let mut pool = pool(&["alpha"]);
        pool.freeze("alpha", Duration::from_secs(3600));
        // A zero-duration re-freeze must not shorten the existing deadline
        pool.freeze("alpha", Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn refreeze_extends_to_later_deadline() {
        let mut pool = pool(&["alpha"]);
        pool.freeze("alpha", Duration::from_secs(1));
        pool.freeze("alpha", Duration::from_secs(7200));
        assert_eq!(pool.acquire(), None);
        let counts = pool.counts();
        assert_eq!(counts.frozen, 1);
    }

    #[test]
    fn freeze_unknown_key_is_ignored() {
        let mut pool = pool(&["alpha"]);
        pool.freeze("ghost", Duration::from_secs(3600));
        assert_eq!(pool.acquire().as_deref(), Some("alpha"));
    }

    #[test]
    fn freeze_of_first_key_promotes_second() {
        let mut pool = pool(&["alpha", "beta", "gamma"]);
        pool.freeze("alpha", Duration::from_secs(3600));
        pool.freeze("beta", Duration::from_secs(3600));
        assert_eq!(pool.acquire().as_deref(), Some("gamma"));
    }

    #[test]
    fn counts_reflect_frozen_state() {
        let mut pool = pool(&["alpha", "beta", "gamma"]);
        pool.freeze("beta", Duration::from_secs(3600));
        assert_eq!(
            pool.counts(),
            PoolCounts {
                total: 3,
                available: 2,
                frozen: 1
            }
        );
    }

    #[test]
    fn counts_treat_expired_freeze_as_available() {
        let mut pool = pool(&["alpha"]);
        pool.freeze("alpha", Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(pool.counts().available, 1);
    }

    #[test]
    fn empty_pool_acquire_returns_none() {
        let mut pool = KeyPool::new(vec![]);
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.counts().total, 0);
    }
}
