//! Seam to the external media tooling.
//!
//! Downloading and transcoding run in external subprocesses (yt-dlp,
//! FFmpeg, chat renderers); this module only defines the contract job
//! handlers call and a runner that shells out to configured command
//! templates. The codec work itself is out of scope.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{WorkerError, WorkerResult};

/// External media tooling used by the archive pipeline.
#[async_trait]
pub trait MediaRunner: Send + Sync {
    /// Download the raw media identified by `ext_id` to `dest`.
    async fn download_video(&self, ext_id: &str, dest: &Path) -> WorkerResult<()>;

    /// Post-process downloaded media from `src` into `dest`.
    async fn postprocess_video(&self, src: &Path, dest: &Path) -> WorkerResult<()>;

    /// Render a chat transcript at `transcript` into an overlay at `dest`.
    async fn render_chat(&self, transcript: &Path, dest: &Path) -> WorkerResult<()>;
}

/// Runs configured shell command templates for each pipeline stage.
///
/// Templates substitute `{id}`, `{input}` and `{output}` placeholders, e.g.
/// `yt-dlp -o {output} https://twitch.tv/videos/{id}`.
#[derive(Debug, Clone)]
pub struct CommandMediaRunner {
    download_template: String,
    postprocess_template: String,
    render_chat_template: String,
}

impl CommandMediaRunner {
    /// Build a runner from the three stage templates.
    pub fn new(
        download_template: impl Into<String>,
        postprocess_template: impl Into<String>,
        render_chat_template: impl Into<String>,
    ) -> Self {
        Self {
            download_template: download_template.into(),
            postprocess_template: postprocess_template.into(),
            render_chat_template: render_chat_template.into(),
        }
    }

    /// Build a runner from `VODARC_DOWNLOAD_CMD`, `VODARC_POSTPROCESS_CMD`
    /// and `VODARC_RENDER_CHAT_CMD`, when all three are configured.
    pub fn from_env() -> Option<Self> {
        let download = std::env::var("VODARC_DOWNLOAD_CMD").ok()?;
        let postprocess = std::env::var("VODARC_POSTPROCESS_CMD").ok()?;
        let render_chat = std::env::var("VODARC_RENDER_CHAT_CMD").ok()?;
        Some(Self::new(download, postprocess, render_chat))
    }

    async fn run(&self, stage: &str, rendered: String) -> WorkerResult<()> {
        debug!(stage, command = %rendered, "Running media command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&rendered)
            .stdin(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            warn!(stage, command = %rendered, code = ?status.code(), "Media command failed");
            return Err(WorkerError::media(format!(
                "{stage} command exited with {status}"
            )));
        }
        Ok(())
    }
}

fn render_template(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in pairs {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

#[async_trait]
impl MediaRunner for CommandMediaRunner {
    async fn download_video(&self, ext_id: &str, dest: &Path) -> WorkerResult<()> {
        let rendered = render_template(
            &self.download_template,
            &[("id", ext_id), ("output", &dest.to_string_lossy())],
        );
        self.run("download", rendered).await
    }

    async fn postprocess_video(&self, src: &Path, dest: &Path) -> WorkerResult<()> {
        let rendered = render_template(
            &self.postprocess_template,
            &[
                ("input", &src.to_string_lossy()),
                ("output", &dest.to_string_lossy()),
            ],
        );
        self.run("postprocess", rendered).await
    }

    async fn render_chat(&self, transcript: &Path, dest: &Path) -> WorkerResult<()> {
        let rendered = render_template(
            &self.render_chat_template,
            &[
                ("input", &transcript.to_string_lossy()),
                ("output", &dest.to_string_lossy()),
            ],
        );
        self.run("render_chat", rendered).await
    }
}
