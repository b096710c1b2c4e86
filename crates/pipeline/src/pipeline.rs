//! The per-request state machine.
//!
//! `Received → Validated → MetadataFetched → Staged → (Converted) →
//! Delivered → Cleaned`, with `Failed` reachable from every non-terminal
//! state. Every run ends in `Cleaned`: staged files are removed on the single
//! exit path of [`Pipeline::execute`] whatever happened before.

use std::{any::Any, panic::AssertUnwindSafe, path::PathBuf, sync::Arc};

use {
    futures::FutureExt,
    reelbot_channels::{InboundMessage, MediaUpload},
    reelbot_common::types::{ConversationId, MediaKind},
    reelbot_media::{ConvertError, FormatDescriptor, SourceError, StagedFile, select_format},
    tracing::{debug, info, warn},
};

use crate::{
    command::{Command, detect_link, parse_command},
    context::PipelineContext,
    error::{ErrorKind, PipelineError, Result},
    replies,
    request::{Mode, Request, Stage},
};

/// Longest upload file name derived from a title, extension excluded.
const MAX_FILE_STEM_CHARS: usize = 64;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// States visited, in order. Always ends with [`Stage::Cleaned`].
    pub trace: Vec<Stage>,
    pub error: Option<ErrorKind>,
}

impl RunReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn reached(&self, stage: Stage) -> bool {
        self.trace.contains(&stage)
    }
}

/// Per-run bookkeeping: visited states and every file staged so far.
struct Run {
    trace: Vec<Stage>,
    staged: Vec<StagedFile>,
}

impl Run {
    fn new() -> Self {
        Self {
            trace: vec![Stage::Received],
            staged: Vec::new(),
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.trace.push(stage);
    }

    fn last_stage(&self) -> Stage {
        self.trace.last().copied().unwrap_or(Stage::Received)
    }

    /// Take ownership of a staged file; returns its path.
    fn track(&mut self, file: StagedFile) -> PathBuf {
        let path = file.path().to_path_buf();
        self.staged.push(file);
        path
    }

    async fn cleanup(&mut self) {
        for file in self.staged.drain(..) {
            let path = file.path().display().to_string();
            match file.remove().await {
                Ok(()) => debug!(path = %path, "staged file removed"),
                Err(e) => warn!(path = %path, error = %e, "failed to remove staged file"),
            }
        }
        self.trace.push(Stage::Cleaned);
    }
}

/// Routes inbound messages and runs media requests.
#[derive(Clone, Debug)]
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
}

impl Pipeline {
    #[must_use]
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    #[must_use]
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Handle one inbound text message.
    ///
    /// Returns the run report when the message started a media request or a
    /// link lookup; static replies and ignored messages return `None`.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Option<RunReport> {
        let to = &msg.conversation;
        match parse_command(&msg.text) {
            Some(Command::Start) => {
                self.reply(to, &replies::welcome()).await;
                None
            },
            Some(Command::Help) => {
                self.reply(to, &replies::help()).await;
                None
            },
            Some(Command::Youtube(arg)) => Some(
                self.execute(Request::new(Mode::StreamVideo, arg, to.clone()))
                    .await,
            ),
            Some(Command::Audio(arg)) => Some(
                self.execute(Request::new(Mode::ExtractAudio, arg, to.clone()))
                    .await,
            ),
            Some(Command::Unknown(name)) => {
                debug!(chat_id = %to, command = %name, "ignoring unknown command");
                None
            },
            None => {
                let url = detect_link(&msg.text, |t| self.ctx.source.validate(t))?;
                Some(
                    self.execute(Request::new(
                        Mode::LinkDetected,
                        Some(url.to_string()),
                        to.clone(),
                    ))
                    .await,
                )
            },
        }
    }

    /// Run one request to a terminal state.
    ///
    /// Never returns an error: failures are reported to the user and the
    /// log, and cleanup always runs.
    pub async fn execute(&self, request: Request) -> RunReport {
        let mut run = Run::new();
        info!(
            chat_id = %request.conversation,
            mode = %request.mode,
            "request received"
        );

        let result = AssertUnwindSafe(self.drive(&request, &mut run))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PipelineError::unexpected(panic_message(&*payload))));

        let error = match result {
            Ok(()) => {
                info!(
                    chat_id = %request.conversation,
                    mode = %request.mode,
                    "request completed"
                );
                None
            },
            Err(err) => {
                let kind = err.kind();
                self.report_failure(&request, run.last_stage(), &err).await;
                run.advance(Stage::Failed);
                Some(kind)
            },
        };

        run.cleanup().await;
        RunReport {
            trace: run.trace,
            error,
        }
    }

    async fn drive(&self, request: &Request, run: &mut Run) -> Result<()> {
        let ctx = &*self.ctx;
        let to = &request.conversation;

        // Received → Validated
        let url = request
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(PipelineError::MissingArgument { mode: request.mode })?;
        run.advance(Stage::Validated);

        // Validated → MetadataFetched
        if !ctx.source.validate(url) {
            return Err(PipelineError::InvalidSource {
                url: url.to_string(),
            });
        }
        let timeout = ctx.settings.metadata_timeout;
        let metadata = tokio::time::timeout(timeout, ctx.source.fetch_metadata(url))
            .await
            .map_err(|_| SourceError::Timeout(timeout))??;
        run.advance(Stage::MetadataFetched);
        debug!(
            chat_id = %to,
            title = %metadata.title,
            formats = metadata.formats.len(),
            "metadata fetched"
        );

        let Some(kind) = request.mode.media_kind() else {
            self.send(to, &replies::link_menu(&metadata.title)).await?;
            run.advance(Stage::Delivered);
            return Ok(());
        };

        if let Some(progress) = replies::progress(request.mode, &metadata.title) {
            self.reply(to, &progress).await;
        }
        if let Err(e) = ctx.outbound.send_typing(to).await {
            debug!(chat_id = %to, error = %e, "typing indicator failed");
        }

        // MetadataFetched → Staged
        let format = select_format(&metadata.formats, kind, &ctx.settings.selection)
            .ok_or(PipelineError::NoSuitableFormat {
                kind,
                available: metadata.formats.len(),
            })?
            .clone();
        let needs_conversion =
            kind == MediaKind::Audio && !same_container(&format, ctx.converter.target_container());
        if needs_conversion && !ctx.converter.is_available() {
            return Err(ConvertError::Unavailable.into());
        }
        info!(
            chat_id = %to,
            format_id = %format.id,
            container = format.container.as_deref().unwrap_or("unknown"),
            quality = format.quality_label.as_deref().unwrap_or("unknown"),
            "format selected"
        );

        let stream = ctx.source.open_stream(url, &format).await?;
        let staged = ctx
            .stager
            .stage(stream, kind, format.container.as_deref())
            .await?;
        let staged_path = run.track(staged);
        run.advance(Stage::Staged);

        // Staged → Converted
        let deliverable = if needs_conversion {
            let output = ctx
                .stager
                .allocate(MediaKind::Audio, Some(ctx.converter.target_container()));
            let output_path = run.track(output);
            ctx.converter.convert(&staged_path, &output_path).await?;
            run.advance(Stage::Converted);
            output_path
        } else {
            staged_path
        };

        // → Delivered
        let extension = deliverable
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_else(|| kind.default_extension())
            .to_string();
        let upload = MediaUpload::new(deliverable, kind, metadata.title.clone())
            .with_file_name(upload_file_name(&metadata.title, kind, &extension));
        let timeout = ctx.settings.delivery_timeout;
        tokio::time::timeout(timeout, ctx.outbound.send_media(to, &upload))
            .await
            .map_err(|_| PipelineError::DeliveryTimeout(timeout))??;
        run.advance(Stage::Delivered);
        Ok(())
    }

    async fn report_failure(&self, request: &Request, stage: Stage, err: &PipelineError) {
        let kind = err.kind();
        match kind {
            ErrorKind::MissingArgument | ErrorKind::InvalidSource => info!(
                chat_id = %request.conversation,
                mode = %request.mode,
                stage = %stage,
                kind = %kind,
                error = %err,
                "request rejected"
            ),
            _ => warn!(
                chat_id = %request.conversation,
                mode = %request.mode,
                stage = %stage,
                kind = %kind,
                error = %err,
                "request failed"
            ),
        }

        // Link lookups fail silently.
        if request.mode == Mode::LinkDetected {
            return;
        }
        self.reply(&request.conversation, &err.user_message(request.mode))
            .await;
    }

    async fn send(&self, to: &ConversationId, text: &str) -> Result<()> {
        self.ctx.outbound.send_text(to, text).await?;
        Ok(())
    }

    /// Best-effort text reply; failures are only logged.
    async fn reply(&self, to: &ConversationId, text: &str) {
        if let Err(e) = self.ctx.outbound.send_text(to, text).await {
            warn!(chat_id = %to, error = %e, "failed to send reply");
        }
    }
}

fn same_container(format: &FormatDescriptor, target: &str) -> bool {
    format
        .container
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(target))
}

/// Recipient-facing file name built from the title.
fn upload_file_name(title: &str, kind: MediaKind, extension: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    let stem = stem.trim_matches(|c| matches!(c, ' ' | '.' | '_'));
    let stem = if stem.is_empty() { kind.as_str() } else { stem };
    format!("{stem}.{extension}")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
