//! In-memory transport doubles for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use behave_core::Method;

use crate::traits::{RealtimeClient, RealtimeError, Transport, TransportError};
use crate::types::{HttpRequest, RealtimeMessage, RealtimeSubscription};

type Responder = Arc<dyn Fn(&HttpRequest) -> Result<Value, TransportError> + Send + Sync>;
type RouteKey = (Method, String);

/// Wraps `data` in a success envelope.
pub fn envelope(data: Value) -> Value {
    json!({ "data": data })
}

/// Builds an envelope carrying a service error.
pub fn error_envelope(message: &str) -> Value {
    json!({ "error": message })
}

#[derive(Default)]
struct MockState {
    scripted: HashMap<RouteKey, VecDeque<Result<Value, TransportError>>>,
    responders: HashMap<RouteKey, Responder>,
    requests: Vec<HttpRequest>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Scripted transport recording every request it receives.
///
/// Responses are looked up by method and resolved path: one-shot scripted
/// responses first (FIFO), then a standing responder. Anything else fails
/// with a 404 status error.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    latency: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response, so overlapping requests would be observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answers every `method path` request with `body`.
    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.respond_with(method, path, move |_| Ok(body.clone()));
    }

    /// Answers every `method path` request with the result of `responder`.
    pub fn respond_with<F>(&self, method: Method, path: &str, responder: F)
    where
        F: Fn(&HttpRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .responders
            .insert((method, path.to_string()), Arc::new(responder));
    }

    /// Answers the next `method path` request with `body`.
    pub fn respond_once(&self, method: Method, path: &str, body: Value) {
        self.script(method, path, Ok(body));
    }

    /// Fails the next `method path` request with `error`.
    pub fn fail_once(&self, method: Method, path: &str, error: TransportError) {
        self.script(method, path, Err(error));
    }

    fn script(&self, method: Method, path: &str, result: Result<Value, TransportError>) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry((method, path.to_string()))
            .or_default()
            .push_back(result);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Received requests as `"METHOD /path"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }

    /// Highest number of requests ever in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    fn next_response(state: &mut MockState, request: &HttpRequest) -> Result<Value, TransportError> {
        let key = (request.method, request.path.clone());
        if let Some(result) = state.scripted.get_mut(&key).and_then(VecDeque::pop_front) {
            return result;
        }
        match state.responders.get(&key) {
            Some(responder) => responder(request),
            None => Err(TransportError::Status {
                status: 404,
                body: format!("no mock response for {} {}", request.method, request.path),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, TransportError> {
        {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        Self::next_response(&mut state, &request)
    }
}

#[derive(Default)]
struct RealtimeState {
    channels: HashMap<String, mpsc::UnboundedSender<RealtimeMessage>>,
    subscriptions: Vec<String>,
    cancellations: Vec<String>,
    refuse: bool,
}

/// Realtime double: tests push payloads into subscribed channels.
#[derive(Clone, Default)]
pub struct MockRealtime {
    state: Arc<Mutex<RealtimeState>>,
}

impl MockRealtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following subscription attempt fail.
    pub fn refuse_subscriptions(&self) {
        self.state.lock().unwrap().refuse = true;
    }

    /// Delivers a reward payload; `false` when nobody is subscribed.
    pub fn push(&self, channel: &str, payload: Value) -> bool {
        self.deliver(channel, RealtimeMessage::Payload(payload))
    }

    /// Delivers an error-path message; `false` when nobody is subscribed.
    pub fn push_error(&self, channel: &str, message: &str) -> bool {
        self.deliver(channel, RealtimeMessage::Error(message.to_string()))
    }

    fn deliver(&self, channel: &str, message: RealtimeMessage) -> bool {
        let state = self.state.lock().unwrap();
        state
            .channels
            .get(channel)
            .is_some_and(|tx| tx.send(message).is_ok())
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.channels.get(channel).is_some_and(|tx| !tx.is_closed())
    }

    /// Channels subscribed to so far, in order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    /// Channels cancelled so far, in order.
    pub fn cancellations(&self) -> Vec<String> {
        self.state.lock().unwrap().cancellations.clone()
    }
}

#[async_trait]
impl RealtimeClient for MockRealtime {
    async fn subscribe(&self, channel: &str) -> Result<RealtimeSubscription, RealtimeError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            return Err(RealtimeError::Refused {
                channel: channel.to_string(),
                reason: "unauthorized".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.channels.insert(channel.to_string(), tx);
        state.subscriptions.push(channel.to_string());
        Ok(RealtimeSubscription::new(channel, rx))
    }

    fn cancel(&self, channel: &str) {
        let mut state = self.state.lock().unwrap();
        if state.channels.remove(channel).is_some() {
            state.cancellations.push(channel.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_take_precedence() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/app/info", envelope(json!({ "name": "a" })));
        transport.respond_once(Method::Get, "/app/info", error_envelope("first"));

        let request = HttpRequest::new(Method::Get, "/app/info", None);
        let first = transport.send(request.clone()).await.unwrap();
        let second = transport.send(request).await.unwrap();

        assert_eq!(first, json!({ "error": "first" }));
        assert_eq!(second, json!({ "data": { "name": "a" } }));
        assert_eq!(transport.calls(), vec!["GET /app/info", "GET /app/info"]);
    }

    #[tokio::test]
    async fn unknown_routes_fail_with_404() {
        let transport = MockTransport::new();
        let err = transport
            .send(HttpRequest::new(Method::Post, "/nope", None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn realtime_delivers_until_cancelled() {
        let realtime = MockRealtime::new();
        let mut subscription = realtime.subscribe("/app/u1/rewards").await.unwrap();

        assert!(realtime.push("/app/u1/rewards", json!({ "badges": [] })));
        assert_eq!(
            subscription.recv().await,
            Some(RealtimeMessage::Payload(json!({ "badges": [] })))
        );

        realtime.cancel("/app/u1/rewards");
        assert!(!realtime.is_subscribed("/app/u1/rewards"));
        assert!(!realtime.push("/app/u1/rewards", json!({})));
        assert_eq!(subscription.recv().await, None);
        assert_eq!(realtime.cancellations(), vec!["/app/u1/rewards"]);
    }
}
