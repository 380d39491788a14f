//! Perplexity ask frames.

use serde_json::json;
use uuid::Uuid;

use super::frame::{FrameBody, RequestFrame};
use super::{LocaleConfig, BROWSER_USER_AGENT};

pub(crate) const ASK_URL: &str = "https://www.perplexity.ai/rest/sse/perplexity_ask";
const ORIGIN: &str = "https://www.perplexity.ai";

const SUPPORTED_BLOCK_USE_CASES: [&str; 14] = [
    "answer_modes",
    "finance_widgets",
    "inline_assets",
    "inline_entity_cards",
    "inline_images",
    "knowledge_cards",
    "media_items",
    "place_widgets",
    "placeholder_cards",
    "search_result_widgets",
    "shopping_widgets",
    "sports_widgets",
    "prediction_market_widgets",
    "maps_preview",
];

/// Build an ask frame with fresh call-scoped identifiers.
pub(crate) fn query_frame(prompt: &str, locale: &LocaleConfig) -> RequestFrame {
    let frontend_uuid = Uuid::new_v4().to_string();
    let device_id = device_id();

    let body = json!({
        "query_str": prompt,
        "params": {
            "source": "android",
            "version": "2.17",
            "frontend_uuid": frontend_uuid,
            "android_device_id": device_id,
            "mode": "concise",
            "is_related_query": false,
            "is_voice_to_voice": false,
            "timezone": locale.timezone,
            "language": locale.locale_tag,
            "query_source": "home",
            "is_incognito": false,
            "use_schematized_api": true,
            "send_back_text_in_streaming_api": false,
            "supported_block_use_cases": SUPPORTED_BLOCK_USE_CASES,
            "sources": ["web"],
            "model_preference": "turbo"
        }
    });

    RequestFrame::post(ASK_URL, FrameBody::Json(body))
        .with_header("User-Agent", BROWSER_USER_AGENT)
        .with_header("Content-Type", "application/json")
        .with_header("Accept", "text/event-stream")
        .with_header("Origin", ORIGIN)
        .with_header("Referer", format!("{}/", ORIGIN))
}

/// 16 lowercase hex characters, like an Android device id.
fn device_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body_of(frame: &RequestFrame) -> &Value {
        match &frame.body {
            FrameBody::Json(value) => value,
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_headers() {
        let frame = query_frame("hi", &LocaleConfig::default());
        assert_eq!(frame.url, ASK_URL);
        assert_eq!(frame.header("accept"), Some("text/event-stream"));
        assert_eq!(frame.header("content-type"), Some("application/json"));
        assert_eq!(frame.header("origin"), Some("https://www.perplexity.ai"));
        assert_eq!(frame.header("referer"), Some("https://www.perplexity.ai/"));
        assert_eq!(frame.header("user-agent"), Some(BROWSER_USER_AGENT));
    }

    #[test]
    fn test_body_fields() {
        let frame = query_frame("日本の首都は？", &LocaleConfig::default());
        let body = body_of(&frame);

        assert_eq!(body["query_str"], "日本の首都は？");
        let params = &body["params"];
        assert_eq!(params["timezone"], "Asia/Tokyo");
        assert_eq!(params["language"], "ja-JP");
        assert_eq!(params["mode"], "concise");
        assert_eq!(params["sources"], json!(["web"]));
        assert_eq!(params["use_schematized_api"], true);
        assert_eq!(
            params["supported_block_use_cases"].as_array().unwrap().len(),
            14
        );

        let device = params["android_device_id"].as_str().unwrap();
        assert_eq!(device.len(), 16);
        assert!(device.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(Uuid::parse_str(params["frontend_uuid"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_identifiers_are_fresh_per_call() {
        let first = query_frame("hi", &LocaleConfig::default());
        let second = query_frame("hi", &LocaleConfig::default());

        let first = &body_of(&first)["params"];
        let second = &body_of(&second)["params"];
        assert_ne!(first["frontend_uuid"], second["frontend_uuid"]);
        assert_ne!(first["android_device_id"], second["android_device_id"]);
    }
}
