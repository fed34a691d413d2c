use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{
    DEFAULT_GRAPHQL_ENDPOINT, DEFAULT_HTTP_URL, DEFAULT_VARIABLES, DEFAULT_WS_URL,
};

/// Header name to value. Last write wins on duplicate names.
pub type HeaderSet = HashMap<String, String>;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::HEAD,
            HttpMethod::HEAD => HttpMethod::OPTIONS,
            HttpMethod::OPTIONS => HttpMethod::GET,
        }
    }

    /// Case-insensitive lookup; blank input means GET.
    pub fn parse(raw: &str) -> Option<HttpMethod> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Some(HttpMethod::GET);
        }
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        HttpMethod::parse(&raw).ok_or_else(|| format!("unknown HTTP method: {}", raw))
    }
}

/// Body of a GraphQL POST
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphQlPayload {
    pub query: String,
    pub variables: serde_json::Map<String, serde_json::Value>,
}

impl GraphQlPayload {
    pub fn new(query: impl Into<String>) -> Self {
        GraphQlPayload {
            query: query.into(),
            variables: serde_json::Map::new(),
        }
    }
}

/// Result of one request attempt. Built once, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub text: String,
    pub duration_ms: f64,
}

/// Persisted settings of the GraphQL tab
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphQlTabSpec {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    pub query: String,
    pub variables: String,
    pub headers: String,
    pub verify_tls: bool,
}

impl GraphQlTabSpec {
    pub const SECTION: &'static str = "graphql";
}

impl Default for GraphQlTabSpec {
    fn default() -> Self {
        GraphQlTabSpec {
            id: String::from("query"),
            title: String::from("Query"),
            endpoint: String::from(DEFAULT_GRAPHQL_ENDPOINT),
            query: String::new(),
            variables: String::from(DEFAULT_VARIABLES),
            headers: String::new(),
            verify_tls: true,
        }
    }
}

/// Persisted settings of the HTTP tab
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpTabSpec {
    pub id: String,
    pub title: String,
    pub url: String,
    pub method: HttpMethod,
    pub body: String,
    pub headers: String,
    pub verify_tls: bool,
}

impl HttpTabSpec {
    pub const SECTION: &'static str = "http";
}

impl Default for HttpTabSpec {
    fn default() -> Self {
        HttpTabSpec {
            id: String::from("http"),
            title: String::from("HTTP"),
            url: String::from(DEFAULT_HTTP_URL),
            method: HttpMethod::GET,
            body: String::new(),
            headers: String::new(),
            verify_tls: true,
        }
    }
}

/// Persisted settings of the WebSocket tab
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WsTabSpec {
    pub id: String,
    pub title: String,
    pub url: String,
    pub message: String,
    pub headers: String,
    pub verify_tls: bool,
}

impl WsTabSpec {
    pub const SECTION: &'static str = "websocket";
}

impl Default for WsTabSpec {
    fn default() -> Self {
        WsTabSpec {
            id: String::from("ws"),
            title: String::from("WebSocket"),
            url: String::from(DEFAULT_WS_URL),
            message: String::new(),
            headers: String::new(),
            verify_tls: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_normalizes_case() {
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::POST));
        assert_eq!(HttpMethod::parse("  "), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse("BREW"), None);
    }

    #[test]
    fn test_method_cycle_visits_all() {
        let mut m = HttpMethod::GET;
        for _ in 0..HttpMethod::ALL.len() {
            m = m.next();
        }
        assert_eq!(m, HttpMethod::GET);
    }

    #[test]
    fn test_method_serializes_as_name() {
        let json = serde_json::to_string(&HttpMethod::PATCH).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }

    #[test]
    fn test_method_deserializes_any_case() {
        let m: HttpMethod = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(m, HttpMethod::DELETE);
        let blank: HttpMethod = serde_json::from_str("\"\"").unwrap();
        assert_eq!(blank, HttpMethod::GET);
        assert!(serde_json::from_str::<HttpMethod>("\"BREW\"").is_err());
    }
}
