use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;

use crate::config::UpstreamConfig;
use crate::error::AiError;
use crate::protocol::gemini::{GenerateRequest, GenerateResponse};

/// Upstream error bodies are logged and surfaced truncated to this length.
const ERROR_BODY_MAX_LEN: usize = 512;

/// The raw chunked body of a streaming upstream call.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// HTTP client for the upstream generative API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport with pooling and timeouts from the upstream config.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .tcp_nodelay(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| AiError::Transport(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Invoke the streaming endpoint, returning the raw chunked byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] when the upstream is unreachable and
    /// [`AiError::Upstream`] on a non-success status.
    pub async fn stream_generate(
        &self,
        request: &GenerateRequest,
        model: &str,
    ) -> Result<ByteStream, AiError> {
        let url = format!("{}/models/{}:streamGenerateContent", self.base_url, model);
        let response = self.send(&url, request).await?;
        Ok(Box::pin(response.bytes_stream()))
    }

    /// Invoke the single-shot endpoint and parse the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] when the upstream is unreachable or the
    /// body is not decodable, and [`AiError::Upstream`] on a non-success
    /// status.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        model: &str,
    ) -> Result<GenerateResponse, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self.send(&url, request).await?;
        response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| AiError::Transport(format!("Failed to decode upstream response: {err}")))
    }

    async fn send(
        &self,
        url: &str,
        request: &GenerateRequest,
    ) -> Result<reqwest::Response, AiError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|err| AiError::Transport(err.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = truncate_body(response.text().await.unwrap_or_default());
    tracing::warn!(status = status.as_u16(), message = %message, "upstream returned error status");
    Err(AiError::Upstream {
        status: status.as_u16(),
        message,
    })
}

fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_MAX_LEN {
        let mut cut = ERROR_BODY_MAX_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
