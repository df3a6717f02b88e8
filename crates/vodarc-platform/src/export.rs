//! Windowed chat export.
//!
//! Streams a bounded-duration chat history to a durable sink page by page,
//! without ever holding the full transcript in memory. The sink is always
//! left as a syntactically well-formed JSON array regardless of which exit
//! path is taken, including the zero-message case.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use vodarc_models::ChatPage;

use crate::error::PlatformResult;

/// Options for one windowed export run.
#[derive(Debug, Clone)]
pub struct ChatExportOptions {
    /// Window start; becomes the initial cursor
    pub start: DateTime<Utc>,
    /// Window end; messages after this point are not exported
    pub end: DateTime<Utc>,
    /// Fixed delay between page fetches (rate-limit courtesy)
    pub page_delay: Duration,
}

/// Format a time as a platform cursor (unix milliseconds).
pub fn format_cursor(time: DateTime<Utc>) -> String {
    time.timestamp_millis().to_string()
}

/// Decode the time a cursor points at, when the cursor is time-shaped.
pub fn cursor_time(cursor: &str) -> Option<DateTime<Utc>> {
    cursor
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Export the chat window to `sink`, fetching pages through `fetch`.
///
/// `fetch` receives the current cursor and returns one page; an empty
/// cursor on a page means no further data. Returns the number of messages
/// written.
pub async fn export_chat<W, F, Fut>(
    sink: &mut W,
    opts: &ChatExportOptions,
    mut fetch: F,
) -> PlatformResult<u64>
where
    W: AsyncWrite + Unpin + Send,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = PlatformResult<ChatPage>>,
{
    let mut cursor = format_cursor(opts.start);
    let mut written: u64 = 0;

    sink.write_all(b"[\n").await?;

    loop {
        let page = fetch(cursor.clone()).await?;

        if page.messages.is_empty() {
            if page.cursor.is_empty() {
                break;
            }
            cursor = page.cursor;
            if cursor_time(&cursor).is_some_and(|t| t > opts.end) {
                break;
            }
            tokio::time::sleep(opts.page_delay).await;
            continue;
        }

        for message in &page.messages {
            if message.created_at > opts.end {
                // Window exhausted mid-page; remaining messages are dropped.
                sink.write_all(b"\n]").await?;
                sink.flush().await?;
                debug!(written, "Chat export reached window end");
                return Ok(written);
            }
            if written > 0 {
                sink.write_all(b",\n").await?;
            }
            let encoded = serde_json::to_vec(message)?;
            sink.write_all(&encoded).await?;
            written += 1;
        }

        if page.cursor.is_empty() {
            break;
        }
        cursor = page.cursor;
        tokio::time::sleep(opts.page_delay).await;
        if cursor_time(&cursor).is_some_and(|t| t > opts.end) {
            break;
        }
    }

    sink.write_all(b"\n]").await?;
    sink.flush().await?;
    debug!(written, "Chat export complete");
    Ok(written)
}
