//! Change notifications from the data service's realtime websocket.
//!
//! The service speaks Phoenix channel frames (JSON objects with `topic`,
//! `event`, `payload`, `ref`). We join one channel filtered to the rows a
//! view cares about and turn every `postgres_changes` frame into a bare
//! signal. Payloads are ignored: the caller re-fetches.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::client::BackendClient;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const MAX_JOIN_REJECTIONS: u32 = 3;
const LEAVE_GRACE: Duration = Duration::from_secs(1);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Rows a subscription watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeFeed {
    /// Entries of one leaderboard
    Entries { leaderboard_id: i64 },
    /// Code-golf submissions
    Submissions,
}

impl ChangeFeed {
    pub fn topic(&self) -> String {
        match self {
            ChangeFeed::Entries { leaderboard_id } => format!("realtime:entries-{}", leaderboard_id),
            ChangeFeed::Submissions => "realtime:submissions".to_string(),
        }
    }

    fn table(&self) -> &'static str {
        match self {
            ChangeFeed::Entries { .. } => "entries",
            ChangeFeed::Submissions => "submissions",
        }
    }

    fn filter(&self) -> Option<String> {
        match self {
            ChangeFeed::Entries { leaderboard_id } => Some(format!("leaderboard_id=eq.{}", leaderboard_id)),
            ChangeFeed::Submissions => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Frame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

/// What an incoming frame means for us
#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    Change,
    Joined,
    JoinRejected(String),
    ChannelClosed,
    Other,
}

/// Websocket endpoint derived from the REST base URL
pub fn websocket_url(client: &BackendClient) -> String {
    let base = client.base_url();
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    let host = base.host_str().unwrap_or("localhost");
    let port = base.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!(
        "{}://{}{}{}realtime/v1/websocket?apikey={}&vsn=1.0.0",
        scheme,
        host,
        port,
        base.path(),
        client.api_key()
    )
}

pub fn join_frame(feed: &ChangeFeed, reference: u64) -> String {
    let mut change = json!({
        "event": "*",
        "schema": "public",
        "table": feed.table(),
    });
    if let Some(filter) = feed.filter() {
        change["filter"] = json!(filter);
    }
    encode(Frame {
        topic: feed.topic(),
        event: "phx_join".to_string(),
        payload: json!({ "config": { "postgres_changes": [change] } }),
        reference: Some(reference.to_string()),
    })
}

pub fn heartbeat_frame(reference: u64) -> String {
    encode(Frame {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    })
}

pub fn leave_frame(feed: &ChangeFeed, reference: u64) -> String {
    encode(Frame {
        topic: feed.topic(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    })
}

fn encode(frame: Frame) -> String {
    serde_json::to_string(&frame).unwrap_or_default()
}

/// Classify a text frame received on `topic`
pub fn classify(text: &str, topic: &str) -> FrameKind {
    let Ok(frame) = serde_json::from_str::<Frame>(text) else {
        return FrameKind::Other;
    };
    if frame.topic != topic {
        return FrameKind::Other;
    }
    match frame.event.as_str() {
        "postgres_changes" => FrameKind::Change,
        "phx_close" => FrameKind::ChannelClosed,
        "phx_error" => FrameKind::JoinRejected("channel error".to_string()),
        "phx_reply" => match frame.payload.get("status").and_then(|s| s.as_str()) {
            Some("ok") => FrameKind::Joined,
            Some(_) => FrameKind::JoinRejected(
                frame
                    .payload
                    .pointer("/response/reason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("rejected")
                    .to_string(),
            ),
            None => FrameKind::Other,
        },
        _ => FrameKind::Other,
    }
}

/// A live change subscription. Dropping it aborts the background task.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<()>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn from_parts(
        rx: mpsc::UnboundedReceiver<()>,
        shutdown: Option<oneshot::Sender<()>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self { rx, shutdown, task }
    }

    /// Wait for the next change signal. `None` once the feed has ended for good.
    pub async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Leave the channel politely, then stop the task
    pub async fn unsubscribe(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(LEAVE_GRACE, &mut self.task).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to changes on `feed`. Must be called inside a tokio runtime.
pub fn subscribe(client: &BackendClient, feed: ChangeFeed) -> Subscription {
    let url = websocket_url(client);
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run(url, feed, tx, shutdown_rx));
    Subscription::from_parts(rx, Some(shutdown_tx), task)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    ReceiverGone,
    /// Socket dropped; `joined` is true if the channel join had succeeded
    Disconnected { joined: bool },
    JoinRejected,
}

/// Pacing between sessions. The backoff only resets after a session that
/// actually joined, and repeated join rejections end the subscription.
struct Rejoin {
    delays: Box<dyn Iterator<Item = Duration> + Send>,
    rejections: u32,
}

impl Rejoin {
    fn new() -> Self {
        Self {
            delays: Box::new(reconnect_strategy()),
            rejections: 0,
        }
    }

    /// Delay before the next session, or `None` to stop
    fn after(&mut self, end: SessionEnd) -> Option<Duration> {
        match end {
            SessionEnd::Shutdown | SessionEnd::ReceiverGone => return None,
            SessionEnd::Disconnected { joined: true } => *self = Self::new(),
            SessionEnd::Disconnected { joined: false } => {}
            SessionEnd::JoinRejected => {
                self.rejections += 1;
                if self.rejections >= MAX_JOIN_REJECTIONS {
                    return None;
                }
            }
        }
        self.delays.next()
    }
}

/// 500ms, 1s, 2s, ... capped at 30s; never gives up
fn reconnect_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(Duration::from_secs(30))
}

async fn run(
    url: String,
    feed: ChangeFeed,
    tx: mpsc::UnboundedSender<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut reconnecting = false;
    let mut rejoin = Rejoin::new();
    loop {
        let connect = Retry::spawn(reconnect_strategy(), || async {
            connect_async(url.as_str()).await.map_err(|e| {
                warn!(topic = %feed.topic(), "realtime connect failed: {}", e);
                e
            })
        });

        let socket = tokio::select! {
            result = connect => match result {
                Ok((socket, _)) => socket,
                Err(e) => {
                    warn!("realtime gave up: {}", e);
                    return;
                }
            },
            _ = &mut shutdown => return,
        };

        let end = session(socket, &feed, &tx, &mut shutdown, reconnecting).await;
        let Some(pause) = rejoin.after(end) else {
            if end == SessionEnd::JoinRejected {
                warn!(topic = %feed.topic(), "realtime join keeps being rejected, falling back to polling");
            }
            return;
        };
        reconnecting = true;
        debug!(topic = %feed.topic(), ?pause, "realtime disconnected, reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = &mut shutdown => return,
        }
    }
}

async fn session(
    socket: Socket,
    feed: &ChangeFeed,
    tx: &mpsc::UnboundedSender<()>,
    shutdown: &mut oneshot::Receiver<()>,
    reconnecting: bool,
) -> SessionEnd {
    let topic = feed.topic();
    let (mut write, mut read) = socket.split();
    let mut next_ref: u64 = 1;
    let mut joined = false;

    if let Err(e) = write.send(Message::Text(join_frame(feed, next_ref).into())).await {
        warn!(%topic, "realtime join send failed: {}", e);
        return SessionEnd::Disconnected { joined };
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                next_ref += 1;
                let _ = write.send(Message::Text(leave_frame(feed, next_ref).into())).await;
                let _ = write.close().await;
                debug!(%topic, "realtime unsubscribed");
                return SessionEnd::Shutdown;
            }
            _ = heartbeat.tick() => {
                next_ref += 1;
                if let Err(e) = write.send(Message::Text(heartbeat_frame(next_ref).into())).await {
                    warn!(%topic, "realtime heartbeat failed: {}", e);
                    return SessionEnd::Disconnected { joined };
                }
            }
            message = read.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Disconnected { joined },
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(%topic, "realtime read error: {}", e);
                        return SessionEnd::Disconnected { joined };
                    }
                };

                match classify(&text, &topic) {
                    FrameKind::Change => {
                        if tx.send(()).is_err() {
                            return SessionEnd::ReceiverGone;
                        }
                    }
                    FrameKind::Joined => {
                        joined = true;
                        info!(%topic, "realtime subscribed");
                        // Rows may have changed while we were away
                        if reconnecting && tx.send(()).is_err() {
                            return SessionEnd::ReceiverGone;
                        }
                    }
                    FrameKind::JoinRejected(reason) => {
                        let _ = write.close().await;
                        if joined {
                            warn!(%topic, "realtime channel error: {}", reason);
                            return SessionEnd::Disconnected { joined };
                        }
                        warn!(%topic, "realtime join rejected: {}", reason);
                        return SessionEnd::JoinRejected;
                    }
                    FrameKind::ChannelClosed => return SessionEnd::Disconnected { joined },
                    FrameKind::Other => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::create_client;

    fn client(url: &str) -> BackendClient {
        create_client(url, "anon-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_websocket_url_https() {
        assert_eq!(
            websocket_url(&client("https://abc.example.co")),
            "wss://abc.example.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }

    #[test]
    fn test_websocket_url_keeps_port() {
        assert_eq!(
            websocket_url(&client("http://localhost:54321")),
            "ws://localhost:54321/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }

    #[test]
    fn test_join_frame_filters_by_board() {
        let frame: serde_json::Value =
            serde_json::from_str(&join_frame(&ChangeFeed::Entries { leaderboard_id: 9 }, 1)).unwrap();
        assert_eq!(frame["topic"], "realtime:entries-9");
        assert_eq!(frame["event"], "phx_join");
        assert_eq!(frame["ref"], "1");
        let change = &frame["payload"]["config"]["postgres_changes"][0];
        assert_eq!(change["table"], "entries");
        assert_eq!(change["filter"], "leaderboard_id=eq.9");
    }

    #[test]
    fn test_submissions_join_has_no_filter() {
        let frame: serde_json::Value =
            serde_json::from_str(&join_frame(&ChangeFeed::Submissions, 1)).unwrap();
        assert!(frame["payload"]["config"]["postgres_changes"][0].get("filter").is_none());
    }

    #[test]
    fn test_classify_frames() {
        let topic = "realtime:submissions";
        let change = r#"{"topic":"realtime:submissions","event":"postgres_changes","payload":{"data":{}},"ref":null}"#;
        assert_eq!(classify(change, topic), FrameKind::Change);

        let ok = r#"{"topic":"realtime:submissions","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"1"}"#;
        assert_eq!(classify(ok, topic), FrameKind::Joined);

        let rejected = r#"{"topic":"realtime:submissions","event":"phx_reply","payload":{"status":"error","response":{"reason":"unmatched topic"}},"ref":"1"}"#;
        assert_eq!(classify(rejected, topic), FrameKind::JoinRejected("unmatched topic".to_string()));

        let other_topic = r#"{"topic":"phoenix","event":"phx_reply","payload":{"status":"ok"},"ref":"2"}"#;
        assert_eq!(classify(other_topic, topic), FrameKind::Other);

        assert_eq!(classify("not json", topic), FrameKind::Other);
    }

    #[test]
    fn test_reconnect_strategy_grows_and_caps() {
        let delays: Vec<Duration> = reconnect_strategy().take(10).collect();
        assert_eq!(delays[0], Duration::from_millis(500));
        assert_eq!(delays[1], Duration::from_millis(1000));
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(30)));
        assert_eq!(delays[9], Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_carries_across_unjoined_sessions() {
        let mut rejoin = Rejoin::new();
        let first = rejoin.after(SessionEnd::Disconnected { joined: false }).unwrap();
        let second = rejoin.after(SessionEnd::Disconnected { joined: false }).unwrap();
        assert_eq!(first, Duration::from_millis(500));
        assert_eq!(second, Duration::from_millis(1000));

        let after_join = rejoin.after(SessionEnd::Disconnected { joined: true }).unwrap();
        assert_eq!(after_join, Duration::from_millis(500));
    }

    #[test]
    fn test_repeated_join_rejections_stop_the_subscription() {
        let mut rejoin = Rejoin::new();
        let delays: Vec<Option<Duration>> = (0..MAX_JOIN_REJECTIONS)
            .map(|_| rejoin.after(SessionEnd::JoinRejected))
            .collect();
        assert_eq!(delays[0], Some(Duration::from_millis(500)));
        assert_eq!(delays[1], Some(Duration::from_millis(1000)));
        assert_eq!(delays.last().copied().flatten(), None);
    }

    #[test]
    fn test_shutdown_never_reconnects() {
        assert_eq!(Rejoin::new().after(SessionEnd::Shutdown), None);
        assert_eq!(Rejoin::new().after(SessionEnd::ReceiverGone), None);
    }
}
