use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
pub fn init_tracing(log_level: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let tracing_level = match level.as_str() {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    };

    let filter = EnvFilter::try_new(tracing_level).unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Log token usage reported by the upstream for one exchange.
pub fn log_token_usage(prompt_tokens: u64, response_tokens: u64, total_tokens: u64) {
    tracing::info!(
        prompt_tokens,
        response_tokens,
        total_tokens,
        "upstream token usage"
    );
}

/// Log usage metadata attached to a streamed upstream object, when present.
pub fn log_stream_usage(usage: &serde_json::Value) {
    let count = |field: &str| usage.get(field).and_then(serde_json::Value::as_u64);
    log_token_usage(
        count("promptTokenCount").unwrap_or(0),
        count("candidatesTokenCount").unwrap_or(0),
        count("totalTokenCount").unwrap_or(0),
    );
}
