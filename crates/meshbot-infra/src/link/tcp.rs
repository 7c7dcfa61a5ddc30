//! TCP bridge to a node gateway speaking newline-delimited JSON.
//!
//! One background task owns the socket. It reads inbound frames, drains the
//! outbound queue (so writes never interleave), and reconnects with
//! exponential backoff when the connection drops. Sends issued while the
//! link is down fail fast with `LinkError::NotConnected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use meshbot_core::link::{InboundStream, NodeLink, broadcast_stream};
use meshbot_types::channel::ChannelId;
use meshbot_types::config::NodeConfig;
use meshbot_types::error::LinkError;
use meshbot_types::message::InboundMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frame::{FrameSkip, decode_inbound, encode_outbound};

const INBOUND_CAPACITY: usize = 256;
const OUTBOUND_CAPACITY: usize = 64;

/// Where and how persistently to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpLinkConfig {
    pub address: String,
    pub port: u16,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl TcpLinkConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Delay before reconnect attempt `attempt` (0-based): doubles each
    /// time, capped at `max_reconnect_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.reconnect_delay
            .saturating_mul(factor)
            .min(self.max_reconnect_delay)
    }
}

impl From<&NodeConfig> for TcpLinkConfig {
    fn from(config: &NodeConfig) -> Self {
        Self {
            address: config.address.clone(),
            port: config.port,
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            max_reconnect_delay: Duration::from_secs(
                config.max_reconnect_delay_secs.max(config.reconnect_delay_secs),
            ),
        }
    }
}

struct Outbound {
    frame: String,
    ack: oneshot::Sender<Result<(), LinkError>>,
}

pub struct TcpNodeLink {
    config: TcpLinkConfig,
    connected: Arc<AtomicBool>,
    outbound: mpsc::Sender<Outbound>,
    inbound: broadcast::Sender<InboundMessage>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TcpNodeLink {
    /// Start the connection task. Returns immediately; the first connect
    /// happens in the background. Must be called inside a tokio runtime.
    pub fn connect(config: TcpLinkConfig) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        let cancel = CancellationToken::new();

        let connection = Connection {
            config: config.clone(),
            connected: Arc::clone(&connected),
            outbound: outbound_rx,
            inbound: inbound.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(connection.run());

        Self {
            config,
            connected,
            outbound,
            inbound,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }
}

impl std::fmt::Debug for TcpNodeLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpNodeLink")
            .field("endpoint", &self.config.endpoint())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl NodeLink for TcpNodeLink {
    fn describe(&self) -> String {
        format!("tcp://{}", self.config.endpoint())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, text: &str, channel: ChannelId) -> Result<(), LinkError> {
        if self.cancel.is_cancelled() {
            return Err(LinkError::Closed);
        }
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let frame = encode_outbound(text, channel)?;
        let (ack, done) = oneshot::channel();
        self.outbound
            .send(Outbound { frame, ack })
            .await
            .map_err(|_| LinkError::Closed)?;
        done.await.map_err(|_| LinkError::Closed)?
    }

    fn subscribe(&self) -> InboundStream {
        let cancel = self.cancel.clone();
        Box::pin(broadcast_stream(self.inbound.subscribe()).take_until(cancel.cancelled_owned()))
    }

    async fn close(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "node connection task ended abnormally");
            }
            info!(endpoint = %self.config.endpoint(), "node link closed");
        }
    }
}

/// State owned by the background connection task.
struct Connection {
    config: TcpLinkConfig,
    connected: Arc<AtomicBool>,
    outbound: mpsc::Receiver<Outbound>,
    inbound: broadcast::Sender<InboundMessage>,
    cancel: CancellationToken,
}

impl Connection {
    async fn run(mut self) {
        let endpoint = self.config.endpoint();
        let mut attempt: u32 = 0;

        'reconnect: loop {
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = TcpStream::connect(&endpoint) => result,
            };

            match connected {
                Ok(stream) => {
                    info!(endpoint = %endpoint, "connected to node");
                    attempt = 0;
                    self.connected.store(true, Ordering::SeqCst);
                    let result = self.serve(stream).await;
                    self.connected.store(false, Ordering::SeqCst);
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    match result {
                        Ok(()) => warn!(endpoint = %endpoint, "node closed the connection"),
                        Err(e) => warn!(endpoint = %endpoint, error = %e, "node connection lost"),
                    }
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, attempt, "failed to connect to node");
                }
            }

            let delay = self.config.backoff(attempt);
            attempt = attempt.saturating_add(1);
            debug!(delay_ms = delay.as_millis() as u64, "reconnecting after delay");

            let wait = tokio::time::sleep(delay);
            tokio::pin!(wait);
            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => break 'reconnect,
                    _ = &mut wait => break,
                    Some(pending) = self.outbound.recv() => {
                        let _ = pending.ack.send(Err(LinkError::NotConnected));
                    }
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        self.outbound.close();
        while let Ok(pending) = self.outbound.try_recv() {
            let _ = pending.ack.send(Err(LinkError::Closed));
        }
        debug!(endpoint = %endpoint, "node connection task stopped");
    }

    /// Pump one live connection until it drops or the link is closed.
    async fn serve(&mut self, stream: TcpStream) -> Result<(), LinkError> {
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);
        // Bytes of a partial line survive a cancelled `read_until`.
        let mut line = Vec::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                read = reader.read_until(b'\n', &mut line) => match read {
                    Ok(0) => return Ok(()),
                    Ok(_) => {
                        self.deliver(&line);
                        line.clear();
                    }
                    Err(e) => return Err(LinkError::Transport(e.to_string())),
                },
                Some(pending) = self.outbound.recv() => {
                    let result = write
                        .write_all(pending.frame.as_bytes())
                        .await
                        .map_err(|e| LinkError::Transport(e.to_string()));
                    let _ = pending.ack.send(result.clone());
                    result?;
                }
            }
        }
    }

    fn deliver(&self, raw: &[u8]) {
        let decoded = std::str::from_utf8(raw)
            .map_err(|e| FrameSkip::Malformed(format!("not UTF-8: {e}")))
            .and_then(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return Err(FrameSkip::NotText);
                }
                decode_inbound(line)
            });
        match decoded {
            Ok(message) => {
                if self.inbound.send(message).is_err() {
                    debug!("inbound message dropped, no subscribers");
                }
            }
            Err(FrameSkip::NotText) => {}
            Err(FrameSkip::Malformed(reason)) => {
                warn!(reason = %reason, "skipping malformed frame from node");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    fn local_config(port: u16) -> TcpLinkConfig {
        TcpLinkConfig {
            address: "127.0.0.1".to_string(),
            port,
            reconnect_delay: Duration::from_millis(20),
            max_reconnect_delay: Duration::from_millis(100),
        }
    }

    async fn wait_connected(link: &TcpNodeLink) {
        for _ in 0..200 {
            if link.is_connected() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("link never connected");
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = TcpLinkConfig {
            address: "n".to_string(),
            port: 1,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        };
        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(4), Duration::from_secs(16));
        assert_eq!(config.backoff(5), Duration::from_secs(30));
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn config_from_node_section() {
        let config = TcpLinkConfig::from(&NodeConfig::default());
        assert_eq!(config.endpoint(), "10.0.0.5:4403");
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn exchanges_frames_with_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let link = TcpNodeLink::connect(local_config(port));
        let mut inbound = link.subscribe();

        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut gateway_lines = BufReader::new(read).lines();
        wait_connected(&link).await;
        assert_eq!(link.describe(), format!("tcp://127.0.0.1:{port}"));

        write
            .write_all(b"{\"from\":\"!abc\",\"channel\":0,\"telemetry\":{}}\n")
            .await
            .unwrap();
        write.write_all(b"garbage\n").await.unwrap();
        write
            .write_all(b"{\"from\":\"!abc\",\"channel\":1,\"text\":\"/help\"}\n")
            .await
            .unwrap();

        let message = inbound.next().await.unwrap();
        assert_eq!(message.from_id, "!abc");
        assert_eq!(message.channel_id, ChannelId(1));
        assert_eq!(message.text, "/help");

        link.send("hello mesh", ChannelId(1)).await.unwrap();
        let line = gateway_lines.next_line().await.unwrap().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["channel"], 1);
        assert_eq!(frame["text"], "hello mesh");

        link.close().await;
        assert!(inbound.next().await.is_none());
        assert!(matches!(
            link.send("late", ChannelId(1)).await,
            Err(LinkError::Closed)
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_frame_keeps_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let link = TcpNodeLink::connect(local_config(port));
        let mut inbound = link.subscribe();

        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut gateway_lines = BufReader::new(read).lines();
        wait_connected(&link).await;

        write.write_all(b"\xff\xfe garbage\n").await.unwrap();
        write
            .write_all(b"{\"from\":\"!abc\",\"channel\":1,\"text\":\"/help\"}\n")
            .await
            .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), inbound.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.text, "/help");

        // Same socket still carries outbound frames; no redial happened.
        link.send("still here", ChannelId(1)).await.unwrap();
        let line = gateway_lines.next_line().await.unwrap().unwrap();
        assert!(line.contains("still here"));
        assert!(
            tokio::time::timeout(Duration::from_millis(100), listener.accept())
                .await
                .is_err()
        );
        link.close().await;
    }

    #[tokio::test]
    async fn send_without_connection_fails_fast() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let link = TcpNodeLink::connect(local_config(port));

        assert!(!link.is_connected());
        assert!(matches!(
            link.send("x", ChannelId(0)).await,
            Err(LinkError::NotConnected)
        ));
        link.close().await;
    }

    #[tokio::test]
    async fn reconnects_after_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let link = TcpNodeLink::connect(local_config(port));
        let mut inbound = link.subscribe();

        let (first, _) = listener.accept().await.unwrap();
        wait_connected(&link).await;
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        wait_connected(&link).await;
        second
            .write_all(b"{\"from\":\"!def\",\"channel\":0,\"text\":\"back\"}\n")
            .await
            .unwrap();

        let message = inbound.next().await.unwrap();
        assert_eq!(message.text, "back");
        link.close().await;
    }
}
