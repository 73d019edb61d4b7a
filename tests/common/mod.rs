#![allow(dead_code)]

//! Shared test fixtures: an in-process mock server that speaks the decoded
//! protocol over the transport boundary, and a listener that collects
//! callbacks into queues for assertion.

use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexSet;
use parking_lot::Mutex;
use peridot_pubsub::core::protocol::{PushFrame, Reply};
use peridot_pubsub::{
    ConnectionEvent, Credentials, PeridotError, PubSubClient, PubSubCommand, PubSubConfig,
    PubSubListener, QueryCommand, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use wildmatch::WildMatch;

/// Server-side ground truth for one mock connection: which channels and
/// patterns this client is subscribed to, what was sent, and how auth went.
#[derive(Default)]
struct ServerInner {
    channels: IndexSet<Bytes>,
    patterns: IndexSet<Bytes>,
    sent: Vec<PubSubCommand>,
    auth_attempts: Vec<Credentials>,
    fail_auth: bool,
    fail_sends: bool,
    lossy: bool,
    connected: bool,
}

/// An in-process stand-in for the connection layer plus the server behind it.
///
/// Subscribe-family commands are answered with confirmation frames carrying
/// real post-operation counts; published messages are matched against the
/// subscribed patterns server-side, the way a real server would.
pub struct MockServer {
    inner: Mutex<ServerInner>,
    frames_tx: mpsc::UnboundedSender<PushFrame>,
    lifecycle_tx: broadcast::Sender<ConnectionEvent>,
}

/// Installs a tracing subscriber honoring `RUST_LOG`, once per test binary.
fn init_tracing() {
    static TRACING: std::sync::Once = std::sync::Once::new();
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

impl MockServer {
    pub fn new() -> (
        Arc<Self>,
        mpsc::UnboundedReceiver<PushFrame>,
        broadcast::Receiver<ConnectionEvent>,
    ) {
        init_tracing();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, lifecycle_rx) = broadcast::channel(16);
        let server = Arc::new(Self {
            inner: Mutex::new(ServerInner {
                connected: true,
                ..Default::default()
            }),
            frames_tx,
            lifecycle_tx,
        });
        (server, frames_rx, lifecycle_rx)
    }

    /// Builds a client wired to a fresh mock server.
    pub fn connect(config: PubSubConfig) -> (Arc<Self>, PubSubClient) {
        let (server, frames_rx, lifecycle_rx) = Self::new();
        let client = PubSubClient::new(server.clone() as Arc<dyn Transport>, frames_rx, lifecycle_rx, config);
        (server, client)
    }

    /// Publishes a message server-side: delivered to the exact channel if
    /// subscribed, and once per matching pattern subscription.
    pub fn publish(&self, channel: &str, payload: &str) {
        let inner = self.inner.lock();
        let channel = Bytes::copy_from_slice(channel.as_bytes());
        let payload = Bytes::copy_from_slice(payload.as_bytes());
        if inner.channels.contains(&channel) {
            let _ = self.frames_tx.send(PushFrame::Message {
                channel: channel.clone(),
                payload: payload.clone(),
            });
        }
        for pattern in &inner.patterns {
            let glob = WildMatch::new(&String::from_utf8_lossy(pattern));
            if glob.matches(&String::from_utf8_lossy(&channel)) {
                let _ = self.frames_tx.send(PushFrame::PMessage {
                    pattern: pattern.clone(),
                    channel: channel.clone(),
                    payload: payload.clone(),
                });
            }
        }
    }

    /// Injects a raw push frame, bypassing the server-side bookkeeping.
    pub fn push_frame(&self, frame: PushFrame) {
        let _ = self.frames_tx.send(frame);
    }

    /// Drops the link: the server forgets this client's subscriptions (as a
    /// real server does when a connection dies) and the lifecycle channel
    /// reports the loss.
    pub fn drop_link(&self) {
        {
            let mut inner = self.inner.lock();
            inner.connected = false;
            inner.channels.clear();
            inner.patterns.clear();
        }
        let _ = self.lifecycle_tx.send(ConnectionEvent::Disconnected);
    }

    /// Restores the link and reports it, as the connection layer's retry
    /// policy would.
    pub fn restore_link(&self) {
        self.inner.lock().connected = true;
        let _ = self.lifecycle_tx.send(ConnectionEvent::Reconnected);
    }

    pub fn set_fail_auth(&self, fail: bool) {
        self.inner.lock().fail_auth = fail;
    }

    /// Makes every write fail at the client side, as a link that reports
    /// itself up but dies on first use.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }

    /// In lossy mode the link accepts writes but the server never sees them:
    /// commands are recorded and then silently discarded, so no confirmation
    /// ever comes back.
    pub fn set_lossy(&self, lossy: bool) {
        self.inner.lock().lossy = lossy;
    }

    /// Every subscribe-family command written to this link, in order.
    pub fn sent_commands(&self) -> Vec<PubSubCommand> {
        self.inner.lock().sent.clone()
    }

    pub fn auth_attempts(&self) -> Vec<Credentials> {
        self.inner.lock().auth_attempts.clone()
    }

    fn confirm_subscribes(&self, inner: &mut ServerInner, names: &[Bytes]) {
        for name in names {
            inner.channels.insert(name.clone());
            let count = (inner.channels.len() + inner.patterns.len()) as u64;
            let _ = self.frames_tx.send(PushFrame::Subscribed {
                channel: name.clone(),
                count,
            });
        }
    }

    fn confirm_psubscribes(&self, inner: &mut ServerInner, names: &[Bytes]) {
        for name in names {
            inner.patterns.insert(name.clone());
            let count = (inner.channels.len() + inner.patterns.len()) as u64;
            let _ = self.frames_tx.send(PushFrame::PSubscribed {
                pattern: name.clone(),
                count,
            });
        }
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn send(&self, command: PubSubCommand) -> Result<(), PeridotError> {
        let mut inner = self.inner.lock();
        if !inner.connected {
            return Err(PeridotError::Transport("link is down".to_string()));
        }
        if inner.fail_sends {
            return Err(PeridotError::Transport("write failed".to_string()));
        }
        inner.sent.push(command.clone());
        if inner.lossy {
            return Ok(());
        }
        match command {
            PubSubCommand::Subscribe(names) => self.confirm_subscribes(&mut inner, &names),
            PubSubCommand::PSubscribe(names) => self.confirm_psubscribes(&mut inner, &names),
            PubSubCommand::Unsubscribe(names) => {
                let names = if names.is_empty() {
                    inner.channels.iter().cloned().collect()
                } else {
                    names
                };
                for name in &names {
                    inner.channels.shift_remove(name);
                    let count = (inner.channels.len() + inner.patterns.len()) as u64;
                    let _ = self.frames_tx.send(PushFrame::Unsubscribed {
                        channel: name.clone(),
                        count,
                    });
                }
            }
            PubSubCommand::PUnsubscribe(names) => {
                let names = if names.is_empty() {
                    inner.patterns.iter().cloned().collect()
                } else {
                    names
                };
                for name in &names {
                    inner.patterns.shift_remove(name);
                    let count = (inner.channels.len() + inner.patterns.len()) as u64;
                    let _ = self.frames_tx.send(PushFrame::PUnsubscribed {
                        pattern: name.clone(),
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    async fn request(&self, query: QueryCommand) -> Result<Reply, PeridotError> {
        let inner = self.inner.lock();
        if !inner.connected {
            return Err(PeridotError::Transport("link is down".to_string()));
        }
        let reply = match query {
            QueryCommand::Channels(pattern) => {
                let filter = pattern.map(|p| String::from_utf8_lossy(&p).into_owned());
                let channels = inner
                    .channels
                    .iter()
                    .filter(|channel| match &filter {
                        Some(f) => WildMatch::new(f).matches(&String::from_utf8_lossy(channel)),
                        None => true,
                    })
                    .map(|channel| Reply::BulkString(channel.clone()))
                    .collect();
                Reply::Array(channels)
            }
            QueryCommand::NumSub(channels) => {
                let mut items = Vec::with_capacity(channels.len() * 2);
                for channel in channels {
                    let count = i64::from(inner.channels.contains(&channel));
                    items.push(Reply::BulkString(channel));
                    items.push(Reply::Integer(count));
                }
                Reply::Array(items)
            }
            QueryCommand::NumPat => Reply::Integer(inner.patterns.len() as i64),
        };
        Ok(reply)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), PeridotError> {
        let mut inner = self.inner.lock();
        inner.auth_attempts.push(credentials.clone());
        if inner.fail_auth {
            return Err(PeridotError::AuthenticationFailed(
                "WRONGPASS invalid password".to_string(),
            ));
        }
        Ok(())
    }
}

/// Receivers for everything a `CollectingListener` observed, one queue per
/// payload kind, in callback order.
pub struct CollectedEvents {
    pub channels: mpsc::UnboundedReceiver<Bytes>,
    pub patterns: mpsc::UnboundedReceiver<Bytes>,
    pub messages: mpsc::UnboundedReceiver<Bytes>,
    pub counts: mpsc::UnboundedReceiver<u64>,
}

/// A listener that forwards every callback argument into unbounded queues.
pub struct CollectingListener {
    channels: mpsc::UnboundedSender<Bytes>,
    patterns: mpsc::UnboundedSender<Bytes>,
    messages: mpsc::UnboundedSender<Bytes>,
    counts: mpsc::UnboundedSender<u64>,
}

impl CollectingListener {
    pub fn new() -> (Arc<Self>, CollectedEvents) {
        let (channels_tx, channels_rx) = mpsc::unbounded_channel();
        let (patterns_tx, patterns_rx) = mpsc::unbounded_channel();
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        let (counts_tx, counts_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                channels: channels_tx,
                patterns: patterns_tx,
                messages: messages_tx,
                counts: counts_tx,
            }),
            CollectedEvents {
                channels: channels_rx,
                patterns: patterns_rx,
                messages: messages_rx,
                counts: counts_rx,
            },
        )
    }
}

impl PubSubListener for CollectingListener {
    fn on_message(&self, channel: Bytes, payload: Bytes) {
        let _ = self.channels.send(channel);
        let _ = self.messages.send(payload);
    }

    fn on_pattern_message(&self, pattern: Bytes, channel: Bytes, payload: Bytes) {
        let _ = self.patterns.send(pattern);
        let _ = self.channels.send(channel);
        let _ = self.messages.send(payload);
    }

    fn on_subscribed(&self, channel: Bytes, count: u64) {
        let _ = self.channels.send(channel);
        let _ = self.counts.send(count);
    }

    fn on_psubscribed(&self, pattern: Bytes, count: u64) {
        let _ = self.patterns.send(pattern);
        let _ = self.counts.send(count);
    }

    fn on_unsubscribed(&self, channel: Bytes, count: u64) {
        let _ = self.channels.send(channel);
        let _ = self.counts.send(count);
    }

    fn on_punsubscribed(&self, pattern: Bytes, count: u64) {
        let _ = self.patterns.send(pattern);
        let _ = self.counts.send(count);
    }
}

/// Waits for the next queued value, failing the test after one second.
pub async fn take<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event queue closed")
}

/// Polls for a value that should not arrive, giving in-flight dispatch a
/// moment to prove itself absent.
pub async fn poll_none<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Option<T> {
    timeout(Duration::from_millis(50), rx.recv()).await.ok().flatten()
}

pub fn bytes(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}
