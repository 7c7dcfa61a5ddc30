//! In-memory link and channel directory shared by the unit tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use meshbot_types::channel::{ChannelId, ChannelRef};
use meshbot_types::error::{ChannelError, CommandError, LinkError};
use meshbot_types::message::InboundMessage;
use tokio::sync::broadcast;

use crate::bot::BotBehavior;
use crate::channel::{ChannelDirectory, ChannelManager};
use crate::command::CommandRegistry;
use crate::link::{BoxNodeLink, InboundStream, NodeLink, broadcast_stream};

/// Link that records every send and lets tests inject inbound messages.
pub struct RecordingLink {
    sent: Mutex<Vec<(ChannelId, String)>>,
    connected: AtomicBool,
    inbound: broadcast::Sender<InboundMessage>,
    send_delay: Mutex<Option<Duration>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(64);
        Self {
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
            inbound,
            send_delay: Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn inject(&self, message: InboundMessage) {
        let _ = self.inbound.send(message);
    }
}

impl NodeLink for RecordingLink {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, text: &str, channel: ChannelId) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push((channel, text.to_string()));
        Ok(())
    }

    fn subscribe(&self) -> InboundStream {
        broadcast_stream(self.inbound.subscribe())
    }

    async fn close(&self) {
        self.set_connected(false);
    }
}

/// Directory that hands out slots in order, starting after the primary.
pub struct MemoryDirectory {
    channels: Mutex<Vec<ChannelRef>>,
    calls: AtomicUsize,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(vec![ChannelRef::primary()]),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChannelDirectory for MemoryDirectory {
    async fn create_or_get(&self, name: &str) -> Result<ChannelRef, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut channels = self.channels.lock().unwrap();
        if let Some(existing) = channels.iter().find(|c| c.name == name) {
            return Ok(existing.clone());
        }
        let channel = ChannelRef::new(channels.len() as u32, name);
        channels.push(channel.clone());
        Ok(channel)
    }

    async fn list(&self) -> Result<Vec<ChannelRef>, ChannelError> {
        Ok(self.channels.lock().unwrap().clone())
    }
}

/// A recording link plus channel manager, wired the way the supervisor uses them.
pub struct Harness {
    pub recorder: Arc<RecordingLink>,
    pub link: BoxNodeLink,
    pub channels: Arc<ChannelManager>,
}

impl Harness {
    pub fn new() -> Self {
        let recorder = Arc::new(RecordingLink::new());
        let link = BoxNodeLink::new(Arc::clone(&recorder));
        let channels = Arc::new(ChannelManager::new(MemoryDirectory::new()));
        Self {
            recorder,
            link,
            channels,
        }
    }
}

/// Bot with a single `echo` command that sends its argument text back.
pub struct EchoBot;

impl BotBehavior for EchoBot {
    fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
        commands.register("echo", "Echo the text back", |ctx, invocation| async move {
            ctx.send(&invocation.rest).await?;
            Ok(())
        })
    }
}
