//! Request executor - validates URLs, times requests and wraps responses

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError, ValidationError};
use crate::models::{GraphQlPayload, HeaderSet, HttpMethod, ResponseEnvelope};
use crate::network::transport::{BlockingTransport, HttpTransport, RawResponse, ReqwestTransport};

/// Runs GraphQL and plain HTTP requests over one chosen transport.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    /// Pick a transport: `requester` if given, else the async reqwest client,
    /// else the blocking one.
    pub fn compose(requester: Option<Arc<dyn HttpTransport>>, timeout: Duration) -> Self {
        if let Some(transport) = requester {
            return Self::with_requester(transport);
        }
        match ReqwestTransport::new(timeout) {
            Ok(transport) => Self::with_requester(Arc::new(transport)),
            Err(e) => {
                tracing::warn!(error = %e, "Async HTTP client unavailable, using blocking client");
                Self::with_requester(Arc::new(BlockingTransport::new(timeout)))
            }
        }
    }

    pub fn with_requester(transport: Arc<dyn HttpTransport>) -> Self {
        tracing::debug!(transport = transport.name(), "HTTP transport selected");
        RequestExecutor { transport }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// POST a GraphQL payload.
    pub async fn perform_graphql_request(
        &self,
        endpoint: &str,
        headers: &HeaderSet,
        payload: &GraphQlPayload,
        verify_tls: bool,
    ) -> Result<ResponseEnvelope> {
        validate_http_url(endpoint)?;
        tracing::info!(endpoint, verify_tls, "Executing GraphQL request");
        let start = Instant::now();
        let raw = self
            .transport
            .post(endpoint, payload, headers, verify_tls)
            .await;
        finish(endpoint, start, raw)
    }

    /// Send a plain HTTP request.
    pub async fn perform_http_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        headers: &HeaderSet,
        body: Option<&str>,
        verify_tls: bool,
    ) -> Result<ResponseEnvelope> {
        validate_http_url(endpoint)?;
        tracing::info!(endpoint, method = method.as_str(), verify_tls, "Executing request");
        let start = Instant::now();
        let raw = self
            .transport
            .request(method, endpoint, body, headers, verify_tls)
            .await;
        finish(endpoint, start, raw)
    }
}

fn finish(
    endpoint: &str,
    start: Instant,
    raw: std::result::Result<RawResponse, TransportError>,
) -> Result<ResponseEnvelope> {
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    match raw {
        Ok(RawResponse { status, text }) => {
            tracing::info!(endpoint, status, duration_ms, "Request completed");
            Ok(ResponseEnvelope {
                status,
                text,
                duration_ms,
            })
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, duration_ms, "Request failed");
            Err(e.into())
        }
    }
}

/// Accept only absolute http/https URLs.
pub fn validate_http_url(raw: &str) -> std::result::Result<url::Url, ValidationError> {
    let parsed = match url::Url::parse(raw.trim()) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(ValidationError::UnsupportedScheme("missing".to_string()))
        }
        Err(url::ParseError::EmptyHost) => return Err(ValidationError::MissingHost),
        Err(e) => return Err(ValidationError::InvalidUrl(e.to_string())),
    };
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Post { url: String, query: String },
        Request { method: HttpMethod, url: String, body: Option<String> },
    }

    struct StubTransport {
        calls: Mutex<Vec<Call>>,
        reply: std::result::Result<RawResponse, TransportError>,
    }

    impl StubTransport {
        fn replying(status: u16, text: &str) -> Arc<Self> {
            Arc::new(StubTransport {
                calls: Mutex::new(Vec::new()),
                reply: Ok(RawResponse {
                    status,
                    text: text.to_string(),
                }),
            })
        }

        fn failing(error: TransportError) -> Arc<Self> {
            Arc::new(StubTransport {
                calls: Mutex::new(Vec::new()),
                reply: Err(error),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn post(
            &self,
            url: &str,
            payload: &GraphQlPayload,
            _headers: &HeaderSet,
            _verify_tls: bool,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(Call::Post {
                url: url.to_string(),
                query: payload.query.clone(),
            });
            self.reply.clone()
        }

        async fn request(
            &self,
            method: HttpMethod,
            url: &str,
            body: Option<&str>,
            _headers: &HeaderSet,
            _verify_tls: bool,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(Call::Request {
                method,
                url: url.to_string(),
                body: body.map(str::to_string),
            });
            self.reply.clone()
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_graphql_request_wraps_response() {
        let stub = StubTransport::replying(200, "ok");
        let requester: Arc<dyn HttpTransport> = stub.clone();
        let executor = RequestExecutor::compose(Some(requester), Duration::from_secs(1));
        assert_eq!(executor.transport_name(), "stub");

        let envelope = executor
            .perform_graphql_request(
                "https://example.com/graphql",
                &HeaderSet::new(),
                &GraphQlPayload::new("{ a }"),
                true,
            )
            .await
            .unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.text, "ok");
        assert!(envelope.duration_ms >= 0.0);
        assert_eq!(
            stub.calls(),
            vec![Call::Post {
                url: "https://example.com/graphql".into(),
                query: "{ a }".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_unsupported_scheme_never_reaches_transport() {
        let stub = StubTransport::replying(200, "ok");
        let executor = RequestExecutor::with_requester(stub.clone());

        let err = executor
            .perform_graphql_request(
                "ftp://example.com",
                &HeaderSet::new(),
                &GraphQlPayload::new("{ a }"),
                true,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::UnsupportedScheme("ftp".into()))
        );
        assert_eq!(err.to_string(), "Unsupported URL scheme: ftp");

        let err = executor
            .perform_http_request("example.com/path", HttpMethod::GET, &HeaderSet::new(), None, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported URL scheme: missing");
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_http_request_passes_method_and_body() {
        let stub = StubTransport::replying(404, "nope");
        let executor = RequestExecutor::with_requester(stub.clone());

        let envelope = executor
            .perform_http_request(
                "http://localhost:8080/items",
                HttpMethod::PATCH,
                &HeaderSet::new(),
                Some("{\"a\":1}"),
                false,
            )
            .await
            .unwrap();
        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.text, "nope");
        assert_eq!(
            stub.calls(),
            vec![Call::Request {
                method: HttpMethod::PATCH,
                url: "http://localhost:8080/items".into(),
                body: Some("{\"a\":1}".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let stub = StubTransport::failing(TransportError::Timeout);
        let executor = RequestExecutor::with_requester(stub);

        let err = executor
            .perform_http_request("https://slow.test", HttpMethod::GET, &HeaderSet::new(), None, true)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Transport(TransportError::Timeout));
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("https://example.com").is_ok());
        assert!(validate_http_url("  http://localhost:4000/graphql ").is_ok());
        assert_eq!(
            validate_http_url("ws://example.com").unwrap_err(),
            ValidationError::UnsupportedScheme("ws".into())
        );
        assert_eq!(
            validate_http_url("http://").unwrap_err(),
            ValidationError::MissingHost
        );
    }

    #[test]
    fn test_compose_defaults_to_reqwest() {
        let executor = RequestExecutor::compose(None, Duration::from_secs(1));
        assert_eq!(executor.transport_name(), "reqwest");
    }
}
