//! vigia - Cita Previa Appointment Monitor
//!
//! A polling monitor for Spain's electronic appointment-booking portal that
//! watches asylum-appointment availability across provinces and sends
//! Telegram alerts the moment a slot opens.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`navigator`] - Multi-step portal workflow with rate limiting
//! - [`parser`] - HTML parsing and availability classification
//! - [`notifications`] - Alert formatting and delivery channels
//! - [`monitor`] - Fixed-interval monitoring loop
//! - [`utils`] - Retry executor and common error types
//!
//! # Example
//!
//! ```no_run
//! use vigia::config::Config;
//! use vigia::monitor::Monitor;
//! use vigia::navigator::Navigator;
//! use vigia::notifications::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let navigator = Navigator::from_config(&config)?;
//!     let monitor = Monitor::new(&config, navigator, Dispatcher::new());
//!     monitor.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod navigator;
pub mod notifications;
pub mod parser;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Applicant, AvailabilityOutcome, Slot, Target};
    pub use crate::monitor::{Monitor, TickSummary};
    pub use crate::navigator::Navigator;
    pub use crate::notifications::{Dispatcher, NotificationEvent};
}

// Direct re-exports for convenience
pub use models::{Applicant, AvailabilityOutcome, Slot, Target};
