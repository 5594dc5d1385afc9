//! reqwest-backed transport.

use async_trait::async_trait;
use serde_json::Value;

use behave_core::Method;
use behave_transport::{HttpRequest, Transport, TransportError};

/// Public API endpoint.
pub const DEFAULT_API_ROOT: &str = "http://api.behave.io";

/// Header carrying the API token on every request.
pub const TOKEN_HEADER: &str = "X-Behave-Api-Token";

/// Behave API client over HTTP.
pub struct HttpTransport {
    /// API root, without trailing slash
    api_root: String,

    /// API token sent with every request
    token: String,

    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport for the public API.
    pub fn new(token: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_root(DEFAULT_API_ROOT, token)
    }

    /// Creates a transport for a specific API root.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the root or the token is empty.
    pub fn with_root(
        api_root: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let api_root = api_root.into().trim_end_matches('/').to_string();
        if api_root.is_empty() {
            return Err(TransportError::Config("API root cannot be empty".into()));
        }

        let token = token.into();
        if token.is_empty() {
            return Err(TransportError::Config("API token cannot be empty".into()));
        }

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            api_root,
            token,
            http_client,
        })
    }

    /// Full URL for a path relative to the API root.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_root, path)
        } else {
            format!("{}/{}", self.api_root, path)
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.path);

        tracing::debug!(
            target: "behave::transport",
            method = %request.method,
            url = %url,
            "Sending request"
        );

        let builder = match request.method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
            Method::Put => self.http_client.put(&url),
        };

        let mut builder = builder
            .header(TOKEN_HEADER, &self.token)
            .header("Content-Type", "application/json");

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let query = request.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::Config(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                target: "behave::transport",
                status = status.as_u16(),
                url = %url,
                "Request failed"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            TransportError::Decode(format!("{e}. Raw response: {text}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let transport = HttpTransport::new("token").unwrap();
        assert_eq!(transport.api_root(), DEFAULT_API_ROOT);
        assert_eq!(
            transport.url_for("/app/info"),
            "http://api.behave.io/app/info"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let transport = HttpTransport::with_root("http://localhost:3000/", "token").unwrap();
        assert_eq!(
            transport.url_for("/players/u1/track"),
            "http://localhost:3000/players/u1/track"
        );
        assert_eq!(
            transport.url_for("players/u1"),
            "http://localhost:3000/players/u1"
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            HttpTransport::new(""),
            Err(TransportError::Config(_))
        ));
        assert!(matches!(
            HttpTransport::with_root("", "token"),
            Err(TransportError::Config(_))
        ));
    }

    /// Accepts one connection, captures the raw request and answers with `reply`.
    async fn serve_once(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let root = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                raw.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break;
                    }
                }
                if read == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                reply.len(),
                reply
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (root, server)
    }

    #[tokio::test]
    async fn post_sends_json_body_with_token_header() {
        let (root, server) = serve_once(r#"{"data":{"ok":true},"err":null}"#).await;
        let transport = HttpTransport::with_root(root, "secret").unwrap();

        let value = transport
            .send(HttpRequest::new(
                Method::Post,
                "/players/u1/track",
                Some(serde_json::json!({ "verb": "played" })),
            ))
            .await
            .unwrap();
        assert_eq!(value["data"]["ok"], serde_json::json!(true));

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let head = head.to_lowercase();
        assert!(head.starts_with("post /players/u1/track "));
        assert!(head.contains("x-behave-api-token: secret"));
        assert_eq!(head.matches("content-type: application/json").count(), 1);
        let sent: Value = serde_json::from_str(body).unwrap();
        assert_eq!(sent, serde_json::json!({ "verb": "played" }));
    }

    #[tokio::test]
    async fn get_params_go_to_the_query_string() {
        let (root, server) = serve_once(r#"{"data":[],"err":null}"#).await;
        let transport = HttpTransport::with_root(root, "secret").unwrap();

        transport
            .send(HttpRequest::new(
                Method::Get,
                "/leaderboards/lb-1/results",
                Some(serde_json::json!({ "limit": 10 })),
            ))
            .await
            .unwrap();

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("GET /leaderboards/lb-1/results?limit=10 "));
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let transport = HttpTransport::with_root("http://127.0.0.1:9", "token").unwrap();
        let err = transport
            .send(HttpRequest::new(Method::Get, "/app/info", None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
