//! Relaygate: a prompt relay for conversational backends without a public API.
//!
//! The crate is organized leaf-first:
//!
//! - [`quota`]: per-backend daily request budgets
//! - [`session`]: scraped session credentials with TTL refresh
//! - [`request`]: backend-specific request frames
//! - [`decode`]: tolerant answer extraction from raw bodies
//! - [`dispatch`]: the ask pipeline tying them together
//! - [`server`]: the HTTP routes in front of the pipeline

pub mod backend;
pub mod clock;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod quota;
pub mod request;
pub mod server;
pub mod session;
pub mod timeout;
pub mod transport;

pub use backend::Backend;
pub use config::GatewayConfig;
pub use dispatch::{AnswerResult, Dispatcher};
pub use error::{FailureKind, GatewayError, GatewayResult};
