//! The statically known conversational backends.
//!
//! Each variant carries its per-backend behavior as data: how sessions are
//! obtained, which decode strategy applies to its responses, and whether a
//! rejected or empty answer should throw away the cached session.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default lifetime of bootstrapped session credentials; see `GatewayConfig::session_ttl`.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(900);

/// A conversational backend the gateway relays prompts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Google Gemini web UI (batchexecute-style embedded JSON responses).
    Gemini,
    /// Perplexity mobile ask endpoint (server-sent event stream).
    Perplexity,
}

/// How a backend obtains the credentials its query calls need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Credentials are generated inline for every call; nothing is cached.
    PerCall,
    /// Tokens are scraped from a bootstrap page and reused until the
    /// configured session TTL lapses.
    Bootstrap,
}

/// Which decoder understands a backend's response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Line-oriented body where one line holds an envelope with a nested JSON string.
    EmbeddedStructure,
    /// `data:`-prefixed event stream whose payloads carry JSON-encoded steps.
    EventStream,
}

impl Backend {
    /// All backends, in a stable order.
    pub const ALL: [Backend; 2] = [Backend::Gemini, Backend::Perplexity];

    /// Stable lowercase identifier used in routes, JSON and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::Perplexity => "perplexity",
        }
    }

    /// Human-readable name for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Gemini => "Gemini",
            Backend::Perplexity => "Perplexity",
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        match self {
            Backend::Gemini => SessionPolicy::Bootstrap,
            Backend::Perplexity => SessionPolicy::PerCall,
        }
    }

    pub fn decode_strategy(&self) -> DecodeStrategy {
        match self {
            Backend::Gemini => DecodeStrategy::EmbeddedStructure,
            Backend::Perplexity => DecodeStrategy::EventStream,
        }
    }

    /// Whether a rejected or empty answer should drop the cached session.
    pub fn invalidates_session_on_failure(&self) -> bool {
        self.session_policy() == SessionPolicy::Bootstrap
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend: {0}")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}
