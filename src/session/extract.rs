//! Token extraction from bootstrap pages.
//!
//! Tokens appear in inline script data as `"<marker>":"<value>"` pairs. Some
//! tokens have been published under more than one marker; the markers are
//! tried in order and the first non-empty value wins.

use regex::Regex;

/// Where to look for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPattern {
    /// Name used in error messages.
    pub name: &'static str,
    /// Marker keys, primary first.
    pub markers: &'static [&'static str],
}

/// Gemini front-end build label.
pub const BUILD_LABEL: TokenPattern = TokenPattern {
    name: "build label",
    markers: &["cfb2h"],
};

/// Gemini session id; `SNlM0e` is only consulted when `FdrFJe` is absent.
pub const SESSION_ID: TokenPattern = TokenPattern {
    name: "session id",
    markers: &["FdrFJe", "SNlM0e"],
};

/// Value following `"<marker>":"` up to the next quote.
fn extract_marker(body: &str, marker: &str) -> Option<String> {
    let pattern = format!(r#""{}":"(.*?)""#, regex::escape(marker));
    let re = Regex::new(&pattern).ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

/// First non-empty value among the pattern's markers.
pub fn extract_token(body: &str, pattern: &TokenPattern) -> Option<String> {
    pattern
        .markers
        .iter()
        .find_map(|marker| extract_marker(body, marker))
}

/// Build label and session id from a Gemini bootstrap page.
///
/// The error names every missing token.
pub fn extract_gemini_tokens(body: &str) -> Result<(String, String), String> {
    let build_label = extract_token(body, &BUILD_LABEL);
    let session_id = extract_token(body, &SESSION_ID);
    match (build_label, session_id) {
        (Some(build_label), Some(session_id)) => Ok((build_label, session_id)),
        (build_label, session_id) => {
            let missing: Vec<&str> = [
                build_label.is_none().then_some(BUILD_LABEL.name),
                session_id.is_none().then_some(SESSION_ID.name),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(format!("{} not found in bootstrap page", missing.join(" and ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<script>window.WIZ_global_data = {"cfb2h":"boq_assistant-bard-web-server_20240515.08_p0","FdrFJe":"-4417208738914381843","SNlM0e":"AFWLbD2x"};</script>"#;

    #[test]
    fn test_extract_primary_markers() {
        let (bl, sid) = extract_gemini_tokens(PAGE).unwrap();
        assert_eq!(bl, "boq_assistant-bard-web-server_20240515.08_p0");
        assert_eq!(sid, "-4417208738914381843");
    }

    #[test]
    fn test_session_id_falls_back_to_secondary_marker() {
        let page = r#"{"cfb2h":"boq_build","SNlM0e":"AFWLbD2x"}"#;
        let (_, sid) = extract_gemini_tokens(page).unwrap();
        assert_eq!(sid, "AFWLbD2x");
    }

    #[test]
    fn test_empty_primary_falls_back() {
        let page = r#"{"cfb2h":"boq_build","FdrFJe":"","SNlM0e":"AFWLbD2x"}"#;
        assert_eq!(extract_token(page, &SESSION_ID).as_deref(), Some("AFWLbD2x"));
    }

    #[test]
    fn test_missing_tokens_reported() {
        let err = extract_gemini_tokens("<html>sign in</html>").unwrap_err();
        assert_eq!(err, "build label and session id not found in bootstrap page");

        let err = extract_gemini_tokens(r#"{"FdrFJe":"123"}"#).unwrap_err();
        assert_eq!(err, "build label not found in bootstrap page");
    }

    #[test]
    fn test_value_stops_at_first_quote() {
        let page = r#""cfb2h":"abc","other":"def""#;
        assert_eq!(extract_token(page, &BUILD_LABEL).as_deref(), Some("abc"));
    }
}
