//! Inbound delivery: the single task feeding the link's messages to the
//! supervisor, one at a time, in link order.

use std::sync::Arc;

use futures_util::StreamExt;
use meshbot_types::event::MeshEvent;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::link::InboundStream;
use crate::supervisor::BotSupervisor;

/// Spawn the delivery task.
///
/// The task ends when `cancel` fires or the inbound stream ends.
pub fn spawn_delivery(
    supervisor: Arc<BotSupervisor>,
    mut inbound: InboundStream,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("inbound delivery started");
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                next = inbound.next() => match next {
                    Some(message) => message,
                    None => {
                        info!("inbound feed closed");
                        break;
                    }
                },
            };

            debug!(
                from = %message.from_id,
                channel = %message.channel_id,
                text = %message.text,
                "inbound message"
            );
            supervisor.events().publish(MeshEvent::MessageReceived {
                message: message.clone(),
            });

            let report = supervisor.route_inbound(&message).await;
            if !report.recipients.is_empty() {
                debug!(
                    channel = %report.channel,
                    recipients = report.recipients.len(),
                    handled = report.handled(),
                    failed = report.failed(),
                    "message routed"
                );
            }
        }
        info!("inbound delivery stopped");
    })
}
