//! Per-backend session credentials.
//!
//! Bootstrapped backends hand out short-lived tokens embedded in their web
//! pages; these are scraped, cached in memory, and refreshed once they age
//! past the TTL. Backends that authenticate per call need no stored state.

mod extract;
mod store;

pub use extract::{extract_gemini_tokens, extract_token, TokenPattern, BUILD_LABEL, SESSION_ID};
pub use store::SessionStore;

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Tokens scraped from a bootstrap page.
///
/// Always replaced as a whole; a refresh never patches individual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    build_label: String,
    session_id: String,
    acquired_at: DateTime<Utc>,
}

impl SessionCredentials {
    pub fn new(
        build_label: impl Into<String>,
        session_id: impl Into<String>,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            build_label: build_label.into(),
            session_id: session_id.into(),
            acquired_at,
        }
    }

    /// Front-end build label (`bl` query parameter).
    pub fn build_label(&self) -> &str {
        &self.build_label
    }

    /// Session id (`f.sid` query parameter).
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Age at `now`; a clock that moved backwards counts as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.acquired_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Both tokens present.
    pub fn is_complete(&self) -> bool {
        !self.build_label.is_empty() && !self.session_id.is_empty()
    }

    /// Usable at `now`: complete and strictly younger than `ttl`.
    pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.is_complete() && self.age(now) < ttl
    }
}

/// What a query call authenticates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No stored session; identifiers are generated per call.
    PerCall,
    /// Cached bootstrap credentials.
    Established(SessionCredentials),
}
