//! API key pool for the polled availability API
//!
//! Several keys are held to spread rate-limit exposure. Each key is either
//! available or frozen until a deadline; a 429 from upstream freezes the key
//! that made the request. There is no unfreeze timer: staleness is resolved
//! lazily at acquire time by comparing the deadline against the clock.
//!
//! Key lifecycle:
//! 1. Keys are created at startup from configuration, in configuration order
//! 2. `acquire` returns the first key not currently frozen
//! 3. Upstream answers 429 → `freeze` suspends the key for the freeze duration
//! 4. The freeze deadline passes → the key thaws on the next `acquire`

pub mod classify;
pub mod pool;

pub use classify::{UpstreamErrorKind, classify_status};
pub use pool::{KeyPool, PoolCounts};
