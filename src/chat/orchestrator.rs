use uuid::Uuid;

use crate::chat::{prompt, ChatContext, PromptMode};
use crate::config::{AppConfig, UpstreamConfig};
use crate::error::AiError;
use crate::observability;
use crate::protocol::gemini::encoder::encode_chat_request;
use crate::protocol::gemini::report::{extract_report, StructuredReport};
use crate::stream::relay::{StreamHandle, StreamRelay, RELAY_CHANNEL_CAPACITY};
use crate::transport::HttpTransport;

/// Result of one orchestrated chat request.
pub enum ChatOutcome {
    /// Live token stream; the caller may start consuming before the upstream
    /// finishes.
    Stream(StreamHandle),
    /// Parsed structured report.
    Report(StructuredReport),
}

/// Top-level entry point of the response pipeline.
///
/// Owns the upstream transport; everything per-request (decoder, scanner,
/// relay) is constructed fresh inside [`ChatOrchestrator::run`], so
/// concurrent requests share nothing mutable.
pub struct ChatOrchestrator {
    transport: HttpTransport,
    upstream: UpstreamConfig,
}

impl ChatOrchestrator {
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AiError> {
        Ok(Self {
            transport: HttpTransport::new(&config.upstream)?,
            upstream: config.upstream.clone(),
        })
    }

    fn report_model(&self) -> &str {
        self.upstream
            .report_model
            .as_deref()
            .unwrap_or(&self.upstream.model)
    }

    /// Run one chat request.
    ///
    /// Non-report modes return a [`ChatOutcome::Stream`] immediately; the
    /// relay task ends with the stream, an upstream failure, or the handle
    /// being dropped. Report mode awaits the full upstream response and
    /// extracts the structured payload.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] / [`AiError::Upstream`] when the
    /// upstream call fails, and [`AiError::EmptyReport`] when report
    /// extraction finds nothing usable.
    pub async fn run(&self, context: &ChatContext) -> Result<ChatOutcome, AiError> {
        let request_id = Uuid::new_v4();
        let mode = PromptMode::select(context.history.len(), context.wants_report);
        let instruction = prompt::build_instruction(mode, context);
        let request = encode_chat_request(context, &instruction, mode);
        tracing::info!(
            %request_id,
            ?mode,
            history_len = context.history.len(),
            "dispatching chat request"
        );

        if mode == PromptMode::ReportGeneration {
            let response = self.transport.generate(&request, self.report_model()).await?;
            if let Some(usage) = &response.usage_metadata {
                observability::log_token_usage(
                    usage.prompt_token_count.unwrap_or(0),
                    usage.candidates_token_count.unwrap_or(0),
                    usage.total_token_count.unwrap_or(0),
                );
            }
            let report = extract_report(&response)?;
            tracing::info!(%request_id, fields = report.len(), "structured report extracted");
            Ok(ChatOutcome::Report(report))
        } else {
            let inbound = self
                .transport
                .stream_generate(&request, &self.upstream.model)
                .await?;
            let (handle, outbound) = StreamHandle::channel(RELAY_CHANNEL_CAPACITY);
            let mut relay = StreamRelay::new(inbound);
            tokio::spawn(async move {
                relay.relay(outbound).await;
            });
            Ok(ChatOutcome::Stream(handle))
        }
    }
}
