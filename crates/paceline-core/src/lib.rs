//! # Paceline Core
//!
//! Shared foundation for the Paceline action scheduler: the domain
//! vocabulary (action kinds, lifecycle statuses), the configuration
//! system, and the crate-wide error type.
//!
//! Everything here is plain data — no I/O, no async. The store and
//! scheduler crates build on top of these types.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use config::PacelineConfig;
pub use error::{PacelineError, Result};
pub use types::{ActionKind, CampaignStatus, ItemStatus, SenderStatus};
