//! Notification events and delivery
//!
//! A [`NotificationEvent`] is created when slots are detected and handed to
//! the [`Dispatcher`], which formats it and fans it out to the registered
//! channels. Delivery is fire-and-forget from the orchestrator's point of
//! view: failures are logged and never propagate.

pub mod channels;
mod dispatcher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Slot;

// Re-exports
pub use channels::telegram::TelegramChannel;
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};
pub use dispatcher::Dispatcher;

/// Maximum slots listed in a message before collapsing to a count
const MAX_SLOTS_SHOWN: usize = 5;

/// Portal link appended to slot alerts
const PORTAL_LINK: &str = "https://icp.administracionelectronica.gob.es/icpplus/acOpcDirect";

/// A detected-slot event: province, extracted slots, detection time.
///
/// Never persisted; the system is stateless by design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Province the slots were found in
    pub province: String,

    /// Slots exactly as extracted by the interpreter
    pub slots: Vec<Slot>,

    /// When the detection happened
    pub detected_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Create an event stamped with the current time
    pub fn new(province: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self {
            province: province.into(),
            slots,
            detected_at: Utc::now(),
        }
    }

    /// Format the event into a human-readable HTML message
    pub fn format_message(&self) -> String {
        let mut message = String::from("🚨 <b>APPOINTMENT SLOTS AVAILABLE!</b> 🚨\n\n");
        message.push_str(&format!("📍 <b>Province:</b> {}\n", self.province));
        message.push_str(&format!(
            "⏰ <b>Detected:</b> {}\n\n",
            self.detected_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        message.push_str("📅 <b>Available slots:</b>\n");
        for slot in self.slots.iter().take(MAX_SLOTS_SHOWN) {
            message.push_str(&format!("   • {}\n", slot.display()));
        }
        if self.slots.len() > MAX_SLOTS_SHOWN {
            message.push_str(&format!(
                "   • ... and {} more\n",
                self.slots.len() - MAX_SLOTS_SHOWN
            ));
        }

        message.push_str(&format!("\n🔗 {PORTAL_LINK}"));
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(n: usize) -> Vec<Slot> {
        (1..=n)
            .map(|i| Slot::new(format!("{i:02}/09/2025"), "10:00", "Almería"))
            .collect()
    }

    #[test]
    fn test_event_creation() {
        let event = NotificationEvent::new("Almería", slots(1));
        assert_eq!(event.province, "Almería");
        assert_eq!(event.slots.len(), 1);
    }

    #[test]
    fn test_format_message_lists_slots() {
        let event = NotificationEvent::new("Almería", slots(2));
        let message = event.format_message();

        assert!(message.contains("APPOINTMENT SLOTS AVAILABLE"));
        assert!(message.contains("Almería"));
        assert!(message.contains("2025-09-01 10:00"));
        assert!(message.contains("2025-09-02 10:00"));
        assert!(message.contains(PORTAL_LINK));
        assert!(!message.contains("more"));
    }

    #[test]
    fn test_format_message_caps_slot_list() {
        let event = NotificationEvent::new("Cádiz", slots(8));
        let message = event.format_message();

        assert!(message.contains("2025-09-05 10:00"));
        assert!(!message.contains("2025-09-06 10:00"));
        assert!(message.contains("... and 3 more"));
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = NotificationEvent::new("Albacete", slots(1));
        let json = serde_json::to_string(&event).unwrap();
        let parsed: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
