//! Gemini web UI frames.

use serde_json::{json, Value};

use super::frame::{FrameBody, RequestFrame};
use super::{LocaleConfig, BROWSER_USER_AGENT};
use crate::session::SessionCredentials;

pub(crate) const BOOTSTRAP_URL: &str = "https://gemini.google.com/";
pub(crate) const STREAM_GENERATE_URL: &str =
    "https://gemini.google.com/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate";

pub(crate) fn bootstrap_frame(cookie: Option<&str>) -> RequestFrame {
    with_browser_headers(RequestFrame::get(BOOTSTRAP_URL), cookie)
}

pub(crate) fn query_frame(
    prompt: &str,
    credentials: &SessionCredentials,
    locale: &LocaleConfig,
    cookie: Option<&str>,
) -> RequestFrame {
    let frame = RequestFrame::post(
        STREAM_GENERATE_URL,
        FrameBody::Form(vec![("f.req".to_string(), freq_payload(prompt, locale))]),
    )
    .with_query("bl", credentials.build_label())
    .with_query("f.sid", credentials.session_id())
    .with_query("hl", locale.language.as_str())
    .with_query("rt", "c");
    with_browser_headers(frame, cookie)
}

/// The `f.req` form value: `[null, "<inner json>"]`.
///
/// The inner array is positional; slot order mirrors the web client and must
/// not change.
fn freq_payload(prompt: &str, locale: &LocaleConfig) -> String {
    let inner: Value = json!([
        [prompt, 0, null, null, null, null, 0],
        [locale.language],
        ["", "", "", null, null, null, null, null, null, ""],
        "",
        ""
    ]);
    json!([null, inner.to_string()]).to_string()
}

fn with_browser_headers(frame: RequestFrame, cookie: Option<&str>) -> RequestFrame {
    let frame = frame.with_header("User-Agent", BROWSER_USER_AGENT);
    match cookie {
        Some(cookie) => frame.with_header("Cookie", cookie),
        None => frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use chrono::Utc;

    fn credentials() -> SessionCredentials {
        SessionCredentials::new("boq_assistant-bard-web-server_20240101.00_p0", "-123456789", Utc::now())
    }

    #[test]
    fn test_query_parameters() {
        let frame = query_frame("hi", &credentials(), &LocaleConfig::default(), None);

        assert_eq!(frame.method, Method::Post);
        assert_eq!(frame.url, STREAM_GENERATE_URL);
        assert_eq!(
            frame.query_param("bl"),
            Some("boq_assistant-bard-web-server_20240101.00_p0")
        );
        assert_eq!(frame.query_param("f.sid"), Some("-123456789"));
        assert_eq!(frame.query_param("hl"), Some("ja"));
        assert_eq!(frame.query_param("rt"), Some("c"));
        assert_eq!(frame.header("user-agent"), Some(BROWSER_USER_AGENT));
    }

    #[test]
    fn test_freq_positional_shape() {
        let frame = query_frame(
            "what is \"rust\"?",
            &credentials(),
            &LocaleConfig::default(),
            None,
        );
        let freq = frame.form_field("f.req").unwrap();

        let outer: Value = serde_json::from_str(freq).unwrap();
        assert_eq!(outer.as_array().unwrap().len(), 2);
        assert!(outer[0].is_null());

        let inner: Value = serde_json::from_str(outer[1].as_str().unwrap()).unwrap();
        let slots = inner.as_array().unwrap();
        assert_eq!(slots.len(), 5);
        assert_eq!(inner[0][0], "what is \"rust\"?");
        assert_eq!(inner[0][1], 0);
        assert_eq!(inner[0].as_array().unwrap().len(), 7);
        assert_eq!(inner[1], json!(["ja"]));
        assert_eq!(inner[2].as_array().unwrap().len(), 10);
        assert_eq!(inner[3], "");
        assert_eq!(inner[4], "");
    }

    #[test]
    fn test_language_follows_locale() {
        let locale = LocaleConfig {
            language: "en".to_string(),
            ..LocaleConfig::default()
        };
        let frame = query_frame("hi", &credentials(), &locale, None);
        assert_eq!(frame.query_param("hl"), Some("en"));

        let outer: Value = serde_json::from_str(frame.form_field("f.req").unwrap()).unwrap();
        let inner: Value = serde_json::from_str(outer[1].as_str().unwrap()).unwrap();
        assert_eq!(inner[1], json!(["en"]));
    }

    #[test]
    fn test_bootstrap_frame() {
        let frame = bootstrap_frame(Some("__Secure-1PSID=x"));
        assert_eq!(frame.method, Method::Get);
        assert_eq!(frame.url, BOOTSTRAP_URL);
        assert_eq!(frame.header("cookie"), Some("__Secure-1PSID=x"));
    }
}
