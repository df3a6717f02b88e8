//! Streaming-platform source abstraction.
//!
//! This crate provides:
//! - A resilient request executor with bounded rate-limit retry
//! - An injectable, process-wide bearer token cache
//! - The `PlatformSource` trait and its Twitch/Kick variants
//! - Cursor-pagination accumulation
//! - A time-windowed incremental chat exporter

pub mod error;
pub mod executor;
pub mod export;
pub mod kick;
pub mod metrics;
pub mod paginate;
pub mod source;
pub mod token;
pub mod twitch;

pub use error::{PlatformError, PlatformResult};
pub use executor::{ExecutorConfig, RequestExecutor, USER_AGENT};
pub use export::{cursor_time, export_chat, format_cursor, ChatExportOptions};
pub use kick::{KickConfig, KickSource};
pub use paginate::{accumulate, Page};
pub use source::PlatformSource;
pub use token::TokenCache;
pub use twitch::{TwitchConfig, TwitchSource};
