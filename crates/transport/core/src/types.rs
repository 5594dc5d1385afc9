//! Wire-level request and realtime message types.

use serde_json::Value;
use tokio::sync::mpsc;

use behave_core::Method;

/// A request whose path has been resolved and is ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the API root, starting with `/`.
    pub path: String,
    pub params: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            params,
        }
    }

    /// JSON body, for methods that carry one.
    pub fn body(&self) -> Option<&Value> {
        if self.method.has_body() {
            self.params.as_ref()
        } else {
            None
        }
    }

    /// Query string pairs for methods without a body.
    ///
    /// Only top-level params are encoded; strings are sent as-is and other
    /// values as their JSON text. Nulls are skipped.
    pub fn query(&self) -> Vec<(String, String)> {
        if self.method.has_body() {
            return Vec::new();
        }
        match &self.params {
            Some(Value::Object(fields)) => fields
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Message delivered on a realtime subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeMessage {
    /// A reward payload.
    Payload(Value),
    /// Error path of the subscription (unauthorized, ...).
    Error(String),
}

/// Live subscription to a realtime channel.
#[derive(Debug)]
pub struct RealtimeSubscription {
    channel: String,
    messages: mpsc::UnboundedReceiver<RealtimeMessage>,
}

impl RealtimeSubscription {
    pub fn new(channel: impl Into<String>, messages: mpsc::UnboundedReceiver<RealtimeMessage>) -> Self {
        Self {
            channel: channel.into(),
            messages,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Waits for the next message; `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<RealtimeMessage> {
        self.messages.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_params_become_the_body() {
        let request = HttpRequest::new(Method::Post, "/players/u1/track", Some(json!({ "verb": "x" })));
        assert_eq!(request.body(), Some(&json!({ "verb": "x" })));
        assert!(request.query().is_empty());
    }

    #[test]
    fn get_params_become_the_query() {
        let request = HttpRequest::new(
            Method::Get,
            "/players",
            Some(json!({ "page": 2, "q": "bob", "skip": null })),
        );
        assert_eq!(request.body(), None);
        let mut query = request.query();
        query.sort();
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "bob".to_string())
            ]
        );
    }
}
