//! # Utility Modules
//!
//! Logging helpers shared by the reader and the CLI.

pub mod logging;

pub use logging::{log_frame_preview, TelegramLineLog};
