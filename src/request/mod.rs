//! Backend-specific request construction.
//!
//! Builders are pure apart from the call-scoped random identifiers some
//! protocols expect; they never touch the network or the quota.

mod frame;
mod gemini;
mod perplexity;

pub use frame::{FrameBody, Method, RequestFrame};

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{GatewayError, GatewayResult};
use crate::session::Session;

/// Desktop browser user agent; both backends reject obvious bot clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Locale parameters sent to the backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Short UI language code (Gemini `hl`)
    pub language: String,
    /// IANA timezone name
    pub timezone: String,
    /// BCP 47 language tag
    pub locale_tag: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            timezone: "Asia/Tokyo".to_string(),
            locale_tag: "ja-JP".to_string(),
        }
    }
}

/// Builds request frames for every backend.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    locale: LocaleConfig,
    gemini_cookie: Option<String>,
}

impl RequestBuilder {
    pub fn new(locale: LocaleConfig) -> Self {
        Self {
            locale,
            gemini_cookie: None,
        }
    }

    /// Attach the static Gemini cookie; blank values are ignored.
    pub fn with_gemini_cookie(mut self, cookie: Option<String>) -> Self {
        self.gemini_cookie = cookie.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn locale(&self) -> &LocaleConfig {
        &self.locale
    }

    pub fn has_gemini_cookie(&self) -> bool {
        self.gemini_cookie.is_some()
    }

    /// Build the query frame for one ask.
    pub fn build(
        &self,
        backend: Backend,
        prompt: &str,
        session: &Session,
    ) -> GatewayResult<RequestFrame> {
        match backend {
            Backend::Gemini => {
                let Session::Established(credentials) = session else {
                    return Err(GatewayError::session_init(
                        backend,
                        "no session credentials available",
                    ));
                };
                Ok(gemini::query_frame(
                    prompt,
                    credentials,
                    &self.locale,
                    self.gemini_cookie.as_deref(),
                ))
            }
            Backend::Perplexity => Ok(perplexity::query_frame(prompt, &self.locale)),
        }
    }

    /// Frame that fetches fresh session tokens, for backends that need them.
    pub fn bootstrap_frame(&self, backend: Backend) -> Option<RequestFrame> {
        match backend {
            Backend::Gemini => Some(gemini::bootstrap_frame(self.gemini_cookie.as_deref())),
            Backend::Perplexity => None,
        }
    }
}
