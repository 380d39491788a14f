//! Daily request quotas for Relaygate.
//!
//! Every backend gets an independent budget of answered requests per
//! calendar day. Counters live only in process memory: a restart starts every
//! backend from zero again, which is an accepted limitation of the gateway.
//!
//! # Overview
//!
//! - **QuotaConfig**: default daily limit plus per-backend overrides
//! - **QuotaStore**: the shared counters, with day-boundary reset
//! - **QuotaPermit**: a reserved slot held for the duration of one ask
//!
//! # Example
//!
//! ```ignore
//! use relaygate::backend::Backend;
//! use relaygate::quota::{QuotaConfig, QuotaStore};
//!
//! let store = QuotaStore::new(QuotaConfig::default().with_daily_limit(100), clock);
//!
//! let permit = store.reserve(Backend::Gemini)?;
//! // ... call the backend ...
//! permit.commit();
//! ```

mod config;
mod tracker;

pub use config::{QuotaConfig, DEFAULT_DAILY_LIMIT};
pub use tracker::{QuotaPermit, QuotaSnapshot, QuotaStore};
