//! HTTP transports behind a single trait.
//!
//! `ReqwestTransport` is the regular async client. `BlockingTransport` is the
//! minimal fallback used when the async client cannot be built; it runs the
//! blocking client on the blocking pool, one client per request.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;
use crate::models::{GraphQlPayload, HeaderSet, HttpMethod};

/// Status and body text as received
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub text: String,
}

/// What the request executor needs from an HTTP client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `payload` as JSON.
    async fn post(
        &self,
        url: &str,
        payload: &GraphQlPayload,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError>;

    /// Send an arbitrary method with an optional raw body.
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
    }
}

/// Async reqwest client pair: one verifying certificates, one that does not.
pub struct ReqwestTransport {
    verified: reqwest::Client,
    insecure: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let verified = reqwest::Client::builder().timeout(timeout).build()?;
        let insecure = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(ReqwestTransport { verified, insecure })
    }

    fn client(&self, verify_tls: bool) -> &reqwest::Client {
        if verify_tls {
            &self.verified
        } else {
            &self.insecure
        }
    }
}

async fn read_response(resp: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    Ok(RawResponse { status, text })
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        payload: &GraphQlPayload,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self.client(verify_tls).post(url);
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let resp = builder.json(payload).send().await?;
        read_response(resp).await
    }

    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client(verify_tls)
            .request(to_reqwest_method(method), url);
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            builder = builder.body(body.to_string());
        }
        let resp = builder.send().await?;
        read_response(resp).await
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

/// Minimal client: blocking reqwest on the blocking thread pool.
pub struct BlockingTransport {
    timeout: Duration,
}

impl BlockingTransport {
    pub fn new(timeout: Duration) -> Self {
        BlockingTransport { timeout }
    }
}

enum BlockingBody {
    Json(GraphQlPayload),
    Raw(String),
    Empty,
}

fn blocking_send(
    method: HttpMethod,
    url: &str,
    headers: &HeaderSet,
    body: BlockingBody,
    verify_tls: bool,
    timeout: Duration,
) -> Result<RawResponse, TransportError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()?;
    let mut builder = client.request(to_reqwest_method(method), url);
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder = match body {
        BlockingBody::Json(payload) => builder.json(&payload),
        BlockingBody::Raw(text) => builder.body(text),
        BlockingBody::Empty => builder,
    };
    let resp = builder.send()?;
    let status = resp.status().as_u16();
    let text = resp.text()?;
    Ok(RawResponse { status, text })
}

impl BlockingTransport {
    async fn run(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HeaderSet,
        body: BlockingBody,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError> {
        let url = url.to_string();
        let headers = headers.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            blocking_send(method, &url, &headers, body, verify_tls, timeout)
        })
        .await
        .map_err(|e| TransportError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl HttpTransport for BlockingTransport {
    async fn post(
        &self,
        url: &str,
        payload: &GraphQlPayload,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError> {
        self.run(
            HttpMethod::POST,
            url,
            headers,
            BlockingBody::Json(payload.clone()),
            verify_tls,
        )
        .await
    }

    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> Result<RawResponse, TransportError> {
        let body = match body.filter(|b| !b.is_empty()) {
            Some(text) => BlockingBody::Raw(text.to_string()),
            None => BlockingBody::Empty,
        };
        self.run(method, url, headers, body, verify_tls).await
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP/1.1 server on localhost for transport tests.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Request line, headers and body as the server saw them
    #[derive(Debug)]
    pub struct Captured {
        pub head: String,
        pub body: String,
    }

    /// Serve one request with `status` and `body`, reporting what was received.
    pub async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break buf.len();
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let req_body = String::from_utf8_lossy(&buf[head_end..]).to_string();
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(Captured {
                head,
                body: req_body,
            });
        });
        (format!("http://{}", addr), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_reqwest_post_sends_json_and_headers() {
        let (url, captured) = serve_once(200, r#"{"data":{}}"#).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let payload = GraphQlPayload::new("{ hello }");

        let resp = transport
            .post(&url, &payload, &headers(&[("X-Api-Key", "k1")]), true)
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text, r#"{"data":{}}"#);

        let seen = captured.await.unwrap();
        assert!(seen.head.starts_with("POST / HTTP/1.1"));
        assert!(seen.head.to_lowercase().contains("x-api-key: k1"));
        let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["query"], "{ hello }");
        assert_eq!(body["variables"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_reqwest_request_uses_method_and_body() {
        let (url, captured) = serve_once(201, "created").await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let resp = transport
            .request(HttpMethod::PUT, &url, Some("payload"), &HeaderSet::new(), false)
            .await
            .unwrap();
        assert_eq!(resp, RawResponse { status: 201, text: "created".into() });

        let seen = captured.await.unwrap();
        assert!(seen.head.starts_with("PUT / HTTP/1.1"));
        assert_eq!(seen.body, "payload");
    }

    #[tokio::test]
    async fn test_reqwest_timeout_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let transport = ReqwestTransport::new(Duration::from_millis(200)).unwrap();
        let err = transport
            .request(HttpMethod::GET, &url, None, &HeaderSet::new(), true)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn test_blocking_transport_round_trip() {
        let (url, captured) = serve_once(418, "teapot").await;
        let transport = BlockingTransport::new(Duration::from_secs(5));

        let resp = transport
            .request(HttpMethod::DELETE, &url, None, &headers(&[("A", "b")]), true)
            .await
            .unwrap();
        assert_eq!(resp.status, 418);
        assert_eq!(resp.text, "teapot");

        let seen = captured.await.unwrap();
        assert!(seen.head.starts_with("DELETE / HTTP/1.1"));
        assert!(seen.body.is_empty());
    }

    #[tokio::test]
    async fn test_blocking_transport_post_json() {
        let (url, captured) = serve_once(200, "ok").await;
        let transport = BlockingTransport::new(Duration::from_secs(5));
        let mut payload = GraphQlPayload::new("query Q { a }");
        payload.variables.insert("id".into(), serde_json::json!(3));

        let resp = transport
            .post(&url, &payload, &HeaderSet::new(), true)
            .await
            .unwrap();
        assert_eq!(resp.text, "ok");

        let seen = captured.await.unwrap();
        assert!(seen.head.to_lowercase().contains("content-type: application/json"));
        let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["variables"]["id"], 3);
    }
}
