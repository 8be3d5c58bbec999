//! Live task-status overlay: telemetry in, formatted text out, with the UI
//! sink only ever touched from its own context.

pub mod config;
pub mod error;
pub mod handoff;
pub mod message;
pub mod presenter;
pub mod telemetry;
pub mod time_format;

pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use message::{render_status, StatusMessage, TaskState};
pub use presenter::{StatusForwarder, TaskStatusPresenter};
pub use telemetry::{LocalBus, MessageHandler, Subscription, TelemetrySource, TASK_INFO_TOPIC};
pub use time_format::{format_duration, format_seconds};
