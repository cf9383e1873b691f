//! The poll loop
//!
//! One cycle runs to completion before the next begins: gate check, key
//! acquisition, fetch, filter, dedupe, dispatch. A 429 freezes the key that
//! made the request. Every failure is logged and the loop carries on; the
//! only way out is process termination.
//!
//! The delay between cycles is redrawn uniformly from the configured
//! `[min, max]` range after every cycle, so independent deployments do not
//! fall into lockstep with each other or with the upstream's rate limiter.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keypool::KeyPool;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::{FetchError, SlotClient, SlotRecord};
use crate::dedupe::{MatchKey, NotifiedSet};
use crate::filter::{self, Criteria};
use crate::notify::{SmsSender, format_message};
use crate::schedule::ScheduleGate;

/// Cadence and freeze settings for the loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub freeze_duration: Duration,
    pub startup_notification: bool,
}

/// Orchestrates one availability check per cycle and owns all mutable state:
/// the key pool and the notified set. Nothing here is shared, so no locks.
pub struct Poller {
    client: SlotClient,
    pool: KeyPool,
    gate: ScheduleGate,
    criteria: Criteria,
    notified: NotifiedSet,
    sender: Arc<dyn SmsSender>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        client: SlotClient,
        pool: KeyPool,
        gate: ScheduleGate,
        criteria: Criteria,
        sender: Arc<dyn SmsSender>,
        config: PollerConfig,
    ) -> Self {
        Self {
            client,
            pool,
            gate,
            criteria,
            notified: NotifiedSet::new(),
            sender,
            config,
        }
    }

    /// Run forever. Sends the optional startup notification (not gated by
    /// quiet hours), runs an immediate first check, then cycles on the
    /// jittered cadence. Only external termination ends the loop.
    pub async fn run(&mut self) {
        if self.config.startup_notification {
            match self.sender.send("slot-watcher started and polling").await {
                Ok(id) => info!(delivery_id = %id.0, "startup notification sent"),
                Err(e) => warn!(error = %e, "startup notification failed"),
            }
        }

        loop {
            self.cycle_at(Utc::now()).await;
            let delay = self.next_delay();
            debug!(delay_secs = delay.as_secs(), "sleeping until next cycle");
            sleep(delay).await;
        }
    }

    /// Run one poll cycle as of `now`. Every early return leaves all state
    /// consistent for the next cycle.
    pub async fn cycle_at(&mut self, now: DateTime<Utc>) {
        if !self.gate.is_active(now) {
            debug!("inside quiet window, skipping cycle");
            return;
        }

        let Some(key) = self.pool.acquire() else {
            let counts = self.pool.counts();
            warn!(
                total = counts.total,
                frozen = counts.frozen,
                "all API keys frozen, skipping cycle"
            );
            return;
        };

        let records = match self.client.fetch_slots(&key).await {
            Ok(records) => records,
            Err(FetchError::RateLimited) => {
                warn!(
                    key = %key,
                    freeze_secs = self.config.freeze_duration.as_secs(),
                    "rate limited, freezing key"
                );
                self.pool.freeze(&key, self.config.freeze_duration);
                return;
            }
            Err(e) => {
                warn!(error = %e, "fetch failed, retrying next cycle");
                return;
            }
        };

        let matches = filter::matching(&records, &self.criteria);
        if matches.is_empty() {
            debug!(records = records.len(), "no matching slots");
            return;
        }

        let new: Vec<SlotRecord> = matches
            .into_iter()
            .filter(|r| self.notified.is_new(&MatchKey::of(r)))
            .collect();
        if new.is_empty() {
            debug!("all matches already notified");
            return;
        }

        info!(count = new.len(), "new matching slots found");
        match self.sender.send(&format_message(&new)).await {
            Ok(id) => {
                // Mark only after confirmed delivery, so a failed send is
                // retried next cycle instead of being swallowed
                for record in &new {
                    self.notified.record(MatchKey::of(record));
                }
                info!(delivery_id = %id.0, notified_total = self.notified.len(), "notification sent");
            }
            Err(e) => {
                warn!(error = %e, "notification delivery failed, will retry next cycle");
            }
        }
    }

    /// Draw the next inter-cycle delay uniformly from `[min, max]`.
    fn next_delay(&self) -> Duration {
        let min = self.config.min_interval.as_millis() as u64;
        let max = self.config.max_interval.as_millis() as u64;
        if min >= max {
            return self.config.min_interval;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}
