//! Shared types for slotwatch

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
