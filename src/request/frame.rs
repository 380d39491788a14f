//! Outbound request frames.

use serde_json::Value;

/// HTTP method of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Body of an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Empty,
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
    Json(Value),
}

/// A fully specified outbound request, built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFrame {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: FrameBody,
}

impl RequestFrame {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: FrameBody::Empty,
        }
    }

    pub fn post(url: impl Into<String>, body: FrameBody) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First query value with the given key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    /// First form field with the given key, if the body is a form.
    pub fn form_field(&self, key: &str) -> Option<&str> {
        match &self.body {
            FrameBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}
