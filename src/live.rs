//! Live order updates over STOMP on a WebSocket.
//!
//! One connection per session, opened on the first subscription and kept
//! in the session until logout. Order events from `/topic/orders` are fanned
//! out on a broadcast channel. There is no reconnection, dedup or replay:
//! when the socket drops, the channel is closed and the next subscription
//! opens a fresh one.

use std::time::Duration;

use futures::stream::{SplitStream, StreamExt};
use futures::SinkExt;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::config::AppConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, OrderStatus};

pub const ORDERS_TOPIC: &str = "/topic/orders";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// STOMP frames
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl StompFrame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Wire text, NUL-terminated. CONNECT headers are sent unescaped.
    pub fn encode(&self) -> String {
        let escape = self.command != "CONNECT" && self.command != "CONNECTED";
        let mut out = format!("{}\n", self.command);
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&format!("{}:{}\n", escape_header(name), escape_header(value)));
            } else {
                out.push_str(&format!("{name}:{value}\n"));
            }
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame. Heart-beat newlines and empty input yield `None`.
    pub fn decode(text: &str) -> Option<Self> {
        let text = text.trim_start_matches(['\r', '\n']);
        let text = text.trim_end_matches(['\0', '\r', '\n']);
        if text.is_empty() {
            return None;
        }
        let normalized;
        let text = if text.contains("\r\n") {
            normalized = text.replace("\r\n", "\n");
            normalized.as_str()
        } else {
            text
        };
        let (head, body) = text.split_once("\n\n").unwrap_or((text, ""));
        let mut lines = head.lines();
        let command = lines.next()?.trim().to_string();
        if command.is_empty() {
            return None;
        }
        let escaped = command != "CONNECTED";
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| {
                if escaped {
                    (unescape_header(k), unescape_header(v))
                } else {
                    (k.to_string(), v.to_string())
                }
            })
            .collect();
        Some(Self {
            command,
            headers,
            body: body.to_string(),
        })
    }
}

pub fn connect_frame(host: &str, token: Option<&str>) -> StompFrame {
    let mut frame = StompFrame::new("CONNECT")
        .header("accept-version", "1.2,1.1,1.0")
        .header("host", host)
        .header("heart-beat", "0,0");
    if let Some(token) = token {
        frame = frame.header("Authorization", &format!("Bearer {token}"));
    }
    frame
}

pub fn subscribe_frame(id: &str, destination: &str) -> StompFrame {
    StompFrame::new("SUBSCRIBE")
        .header("id", id)
        .header("destination", destination)
        .header("ack", "auto")
}

/// WebSocket URL for the backend: `http` becomes `ws`, `https` becomes `wss`.
pub fn websocket_url(api_base: &str, ws_path: &str) -> String {
    let base = api_base.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}{ws_path}")
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A change notification for one order. The payload is kept as received.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderEvent {
    pub order_id: Option<Id>,
    pub status: Option<OrderStatus>,
    pub payload: Value,
}

impl OrderEvent {
    pub fn from_body(body: &str) -> Option<Self> {
        let payload: Value = serde_json::from_str(body.trim()).ok()?;
        let order_id = payload
            .get("id")
            .or_else(|| payload.get("orderId"))
            .and_then(Value::as_i64);
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .and_then(OrderStatus::parse);
        Some(Self {
            order_id,
            status,
            payload,
        })
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct LiveChannel {
    cancel: CancellationToken,
    events: broadcast::Sender<OrderEvent>,
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string())
}

fn ws_error(url: &str, e: impl std::fmt::Display) -> DashboardError {
    DashboardError::Network(format!("live channel {url}: {e}"))
}

async fn wait_for_connected(stream: &mut SplitStream<WsStream>) -> DashboardResult<()> {
    while let Some(msg) = stream.next().await {
        let msg = msg.map_err(|e| DashboardError::Network(e.to_string()))?;
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Some(frame) = StompFrame::decode(&text) else {
            continue;
        };
        match frame.command.as_str() {
            "CONNECTED" => return Ok(()),
            "ERROR" => {
                let message = frame
                    .header_value("message")
                    .map(str::to_string)
                    .unwrap_or_else(|| frame.body.trim().to_string());
                return Err(DashboardError::Network(format!("STOMP error: {message}")));
            }
            _ => continue,
        }
    }
    Err(DashboardError::Network("connection closed before STOMP handshake".into()))
}

fn dispatch(frame: &StompFrame, events: &broadcast::Sender<OrderEvent>) {
    match frame.command.as_str() {
        "MESSAGE" => match OrderEvent::from_body(&frame.body) {
            Some(event) => {
                debug!(order_id = ?event.order_id, "order event received");
                // No receivers is fine; events are not replayed.
                let _ = events.send(event);
            }
            None => debug!(body = %frame.body, "dropping undecodable order event"),
        },
        "ERROR" => warn!(message = ?frame.header_value("message"), "STOMP error frame"),
        other => debug!(command = %other, "ignoring STOMP frame"),
    }
}

/// Receiving end of the order topic for one consumer.
pub struct OrderSubscription {
    events: broadcast::Receiver<OrderEvent>,
    closed: CancellationToken,
}

impl OrderSubscription {
    /// Next event, or `None` once the channel is closed. Events already
    /// buffered are delivered before the close is reported.
    pub async fn next(&mut self) -> Option<OrderEvent> {
        loop {
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Ok(event) => return Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "order subscriber lagged, events dropped");
                    }
                    Err(RecvError::Closed) => return None,
                },
                _ = self.closed.cancelled() => return None,
            }
        }
    }
}

impl LiveChannel {
    /// Connect, complete the STOMP handshake and subscribe to order events.
    /// The returned subscription exists before the first event can arrive.
    pub async fn open(url: &str, token: Option<&str>) -> DashboardResult<(Self, OrderSubscription)> {
        let (ws, _response) = connect_async(url).await.map_err(|e| ws_error(url, e))?;
        let (mut sink, mut stream) = ws.split();

        sink.send(Message::Text(connect_frame(&host_of(url), token).encode()))
            .await
            .map_err(|e| ws_error(url, e))?;
        tokio::time::timeout(HANDSHAKE_TIMEOUT, wait_for_connected(&mut stream))
            .await
            .map_err(|_| ws_error(url, "STOMP handshake timed out"))??;

        let sub_id = format!("sub-{}", Uuid::new_v4());
        sink.send(Message::Text(subscribe_frame(&sub_id, ORDERS_TOPIC).encode()))
            .await
            .map_err(|e| ws_error(url, e))?;
        info!(url = %url, topic = ORDERS_TOPIC, "live channel subscribed");

        let (events, first) = broadcast::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let tx = events.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        let _ = sink.send(Message::Text(StompFrame::new("DISCONNECT").encode())).await;
                        let _ = sink.close().await;
                        break;
                    }
                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(frame) = StompFrame::decode(&text) {
                                dispatch(&frame, &tx);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("live channel closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "live channel read failed");
                            break;
                        }
                    }
                }
            }
            // Marks the channel closed for the session and every subscriber.
            token.cancel();
            debug!("live channel task finished");
        });

        let subscription = OrderSubscription {
            events: first,
            closed: cancel.clone(),
        };
        Ok((Self { cancel, events }, subscription))
    }

    pub fn subscribe(&self) -> OrderSubscription {
        OrderSubscription {
            events: self.events.subscribe(),
            closed: self.cancel.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the connection. The reader task sends DISCONNECT and exits.
    pub fn close(self) {
        info!("closing live channel");
        self.cancel.cancel();
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> DashboardError {
    DashboardError::Network(format!("live channel lock poisoned: {e}"))
}

fn current_subscription(session: &Session) -> DashboardResult<Option<OrderSubscription>> {
    let slot = session.live_slot().lock().map_err(lock_error)?;
    Ok(slot
        .as_ref()
        .filter(|c| !c.is_closed())
        .map(LiveChannel::subscribe))
}

/// Subscribe to order events, opening the session's channel on first use.
/// The lock is never held across the connect.
pub async fn subscribe_orders(session: &Session, cfg: &AppConfig) -> DashboardResult<OrderSubscription> {
    if let Some(sub) = current_subscription(session)? {
        return Ok(sub);
    }
    let url = websocket_url(&cfg.api_base, &cfg.ws_path);
    let (channel, sub) = LiveChannel::open(&url, session.token().as_deref()).await?;

    let mut slot = session.live_slot().lock().map_err(lock_error)?;
    if let Some(existing) = slot.as_ref().filter(|c| !c.is_closed()) {
        // Another caller won the race; keep theirs.
        let sub = existing.subscribe();
        channel.close();
        return Ok(sub);
    }
    if let Some(stale) = slot.replace(channel) {
        stale.close();
    }
    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use tokio::net::TcpListener;

    #[test]
    fn frames_round_trip_with_escaped_headers() {
        let frame = StompFrame::new("SEND")
            .header("destination", "/app/a:b")
            .header("note", "line1\nline2");
        let wire = frame.encode();
        assert!(wire.contains("destination:/app/a\\cb\n"));
        assert!(wire.ends_with('\0'));
        assert_eq!(StompFrame::decode(&wire), Some(frame));
    }

    #[test]
    fn connect_frame_is_not_escaped() {
        let wire = connect_frame("localhost", Some("abc")).encode();
        assert!(wire.starts_with("CONNECT\naccept-version:1.2,1.1,1.0\nhost:localhost\n"));
        assert!(wire.contains("Authorization:Bearer abc\n"));
    }

    #[test]
    fn decodes_message_frames_and_skips_heartbeats() {
        assert_eq!(StompFrame::decode("\n"), None);
        let frame = StompFrame::decode(
            "MESSAGE\r\ndestination:/topic/orders\r\nsubscription:sub-1\r\n\r\n{\"id\":5}\0",
        )
        .expect("frame");
        assert_eq!(frame.command, "MESSAGE");
        assert_eq!(frame.header_value("subscription"), Some("sub-1"));
        assert_eq!(frame.body, "{\"id\":5}");
    }

    #[test]
    fn order_events_are_lenient() {
        let event = OrderEvent::from_body(r#"{"orderId":12,"status":"IN_PROGRESS"}"#).expect("event");
        assert_eq!(event.order_id, Some(12));
        assert_eq!(event.status, Some(OrderStatus::InProgress));
        assert!(OrderEvent::from_body("not json").is_none());
    }

    #[test]
    fn websocket_url_follows_scheme() {
        assert_eq!(
            websocket_url("https://api.example.com", "/ws/websocket"),
            "wss://api.example.com/ws/websocket"
        );
        assert_eq!(websocket_url("http://localhost:8080/", "/ws"), "ws://localhost:8080/ws");
    }

    /// Minimal STOMP broker: handshake, wait for SUBSCRIBE, publish two
    /// messages (one undecodable), then wait for DISCONNECT.
    async fn fake_broker(listener: TcpListener) -> Vec<String> {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("ws handshake");
        let mut seen = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let frame = StompFrame::decode(&text).expect("client frame");
            seen.push(frame.command.clone());
            match frame.command.as_str() {
                "CONNECT" => {
                    let reply = StompFrame::new("CONNECTED").header("version", "1.2");
                    ws.send(Message::Text(reply.encode())).await.expect("send");
                }
                "SUBSCRIBE" => {
                    let sub = frame.header_value("id").unwrap_or_default().to_string();
                    for body in ["garbage", r#"{"id":42,"status":"COMPLETED"}"#] {
                        let mut msg = StompFrame::new("MESSAGE")
                            .header("destination", ORDERS_TOPIC)
                            .header("subscription", &sub);
                        msg.body = body.to_string();
                        ws.send(Message::Text(msg.encode())).await.expect("send");
                    }
                }
                "DISCONNECT" => break,
                _ => {}
            }
        }
        seen
    }

    #[tokio::test]
    async fn session_channel_delivers_events_until_logout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let broker = tokio::spawn(fake_broker(listener));

        let session = Session::new(Box::new(MemoryTokenStore::with_token("abc.def.ghi")));
        let mut cfg = AppConfig::default().with_api_base(&format!("http://127.0.0.1:{port}"));
        cfg.ws_path = "/ws/websocket".into();

        let mut sub = subscribe_orders(&session, &cfg).await.expect("subscribe");
        let event = tokio::time::timeout(Duration::from_secs(5), sub.next())
            .await
            .expect("event within timeout")
            .expect("event");
        assert_eq!(event.order_id, Some(42));
        assert_eq!(event.status, Some(OrderStatus::Completed));

        // Second subscription reuses the open connection.
        let _again = subscribe_orders(&session, &cfg).await.expect("reuse");

        session.logout().expect("logout");
        assert!(sub.next().await.is_none());
        let seen = tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .expect("broker finishes")
            .expect("broker task");
        assert_eq!(seen, vec!["CONNECT", "SUBSCRIBE", "DISCONNECT"]);
    }
}
