/// Canonical error type used across all modules.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Upstream error: status={status}, message={message}")]
    Upstream { status: u16, message: String },
    #[error("upstream produced no usable report payload")]
    EmptyReport,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AiError {
    /// Whether the caller should present this as a model-output failure
    /// rather than a connectivity failure.
    #[must_use]
    pub fn is_empty_report(&self) -> bool {
        matches!(self, AiError::EmptyReport)
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AiError;

    #[test]
    fn empty_report_is_distinct_from_transport() {
        assert!(AiError::EmptyReport.is_empty_report());
        assert!(!AiError::Transport("reset".to_string()).is_empty_report());
    }

    #[test]
    fn upstream_error_formats_status_and_message() {
        let err = AiError::Upstream {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Upstream error: status=503, message=overloaded"
        );
    }
}
