//! Notification dispatcher
//!
//! Fans events out to the registered channels and absorbs every delivery
//! failure: a dead channel is logged and the monitoring loop continues
//! unaffected. Also produces the startup confirmation and the periodic
//! liveness message, both independent of slot detection.

use chrono::Utc;
use std::time::Duration;

use super::channels::Channel;
use super::NotificationEvent;

/// Dispatcher that routes events to notification channels
#[derive(Default)]
pub struct Dispatcher {
    /// Registered notification channels
    channels: Vec<Box<dyn Channel + Send + Sync>>,
}

impl Dispatcher {
    /// Create a dispatcher with no channels (deliveries become no-ops)
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Add a notification channel
    pub fn add_channel(&mut self, channel: Box<dyn Channel + Send + Sync>) {
        self.channels.push(channel);
    }

    /// Builder-style channel registration
    pub fn with_channel(mut self, channel: Box<dyn Channel + Send + Sync>) -> Self {
        self.add_channel(channel);
        self
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a detected-slot event to every channel.
    ///
    /// Returns the number of successful deliveries. Failures never propagate.
    pub async fn dispatch(&self, event: &NotificationEvent) -> usize {
        tracing::info!(
            province = %event.province,
            slots = event.slots.len(),
            "Dispatching slot notification"
        );

        let mut delivered = 0;
        for channel in &self.channels {
            match channel.send(event).await {
                Ok(status) if status.success => {
                    tracing::info!(channel = channel.name(), "Notification delivered");
                    delivered += 1;
                }
                Ok(status) => {
                    tracing::error!(
                        channel = channel.name(),
                        detail = ?status.message,
                        "Notification delivery failed"
                    );
                }
                Err(e) => {
                    tracing::error!(channel = channel.name(), error = %e, "Channel unusable");
                }
            }
        }
        delivered
    }

    /// Send the one-time startup confirmation
    pub async fn announce_startup(&self, provinces: &[String], interval: Duration) {
        let message = format!(
            "🤖 <b>vigia started monitoring</b>\n\n\
             📍 Provinces: {}\n\
             ⏱ Check interval: {}s",
            provinces.join(", "),
            interval.as_secs()
        );
        self.broadcast(&message).await;
    }

    /// Send the periodic liveness status
    pub async fn announce_liveness(&self, cycle: u64) {
        let message = format!(
            "✅ <b>vigia is active</b> (cycle #{cycle})\n\
             ⏰ Last check: {}",
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        );
        self.broadcast(&message).await;
    }

    /// Send an error notification
    pub async fn announce_error(&self, detail: &str) {
        let message = format!(
            "❌ <b>vigia error</b>\n\n\
             ⏰ {}\n\
             💬 {detail}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        self.broadcast(&message).await;
    }

    /// Deliver a raw message to every channel, swallowing failures
    async fn broadcast(&self, text: &str) {
        for channel in &self.channels {
            match channel.send_text(text).await {
                Ok(status) if status.success => {}
                Ok(status) => {
                    tracing::error!(
                        channel = channel.name(),
                        detail = ?status.message,
                        "Status delivery failed"
                    );
                }
                Err(e) => {
                    tracing::error!(channel = channel.name(), error = %e, "Channel unusable");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slot;
    use crate::notifications::channels::{ChannelResult, DeliveryStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubChannel {
        succeed: bool,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Channel for StubChannel {
        fn name(&self) -> &str {
            "stub"
        }

        async fn send_text(&self, _text: &str) -> ChannelResult<DeliveryStatus> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(DeliveryStatus::success("stub"))
            } else {
                Ok(DeliveryStatus::failure("stub", "unreachable"))
            }
        }
    }

    fn event() -> NotificationEvent {
        NotificationEvent::new("Almería", vec![Slot::new("01/09/2025", "10:00", "Almería")])
    }

    #[tokio::test]
    async fn test_dispatch_counts_successes() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new()
            .with_channel(Box::new(StubChannel {
                succeed: true,
                sent: Arc::clone(&sent),
            }))
            .with_channel(Box::new(StubChannel {
                succeed: false,
                sent: Arc::clone(&sent),
            }));

        let delivered = dispatcher.dispatch(&event()).await;

        assert_eq!(delivered, 1);
        assert_eq!(sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_with_no_channels() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.channel_count(), 0);
        assert_eq!(dispatcher.dispatch(&event()).await, 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_propagate() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new().with_channel(Box::new(StubChannel {
            succeed: false,
            sent: Arc::clone(&sent),
        }));

        // A failing channel still yields a normal return, not a panic/error
        let delivered = dispatcher.dispatch(&event()).await;
        assert_eq!(delivered, 0);

        dispatcher.announce_startup(&["Almería".to_string()], Duration::from_secs(300)).await;
        dispatcher.announce_liveness(12).await;
        dispatcher.announce_error("portal down").await;
        assert_eq!(sent.load(Ordering::SeqCst), 4);
    }
}
