use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{ApiErrorKind, Error, Result};
use crate::observability::{
    COMPLETION_DURATION, COMPLETION_ERRORS, COMPLETION_INLINE_PAYLOADS, COMPLETION_REQUESTS,
};
use crate::types::{
    Completion, CompletionOptions, DEFAULT_TEMPERATURE, GenerateContentRequest,
    GenerateContentResponse, Message, Model,
};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Environment variables consulted for the API key, in order.
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Something that can turn a conversation into the next assistant turn.
///
/// `history` is the full transcript, already ending with the user message
/// being answered (text and attachments included). Implementations issue
/// exactly one remote request per call.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request the next assistant turn.
    async fn complete(
        &self,
        model: &Model,
        history: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion>;
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    temperature: Option<f32>,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// (or API_KEY) environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// No timeout is applied unless one is given.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => api_key_from_env().ok_or_else(|| {
                Error::config("API key not provided and GEMINI_API_KEY environment variable not set")
            })?,
        };

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e), e))?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            temperature: Some(DEFAULT_TEMPERATURE),
        })
    }

    /// Sets the sampling temperature sent with every request.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns the sampling temperature sent with every request.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::config("API key contains invalid header characters"))?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    fn endpoint(&self, model: &Model) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{}:generateContent", model))?)
    }

    /// Turn a non-success reply into an [`Error::Api`], reading the error envelope.
    async fn process_error_response(response: Response, model: &Model) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::transport(format!("Failed to read error response: {}", e), e);
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|parsed| parsed.error);
        let error_status = detail.as_ref().and_then(|d| d.status.clone());
        let error_message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| error_body.clone());

        let err = Error::api(status_code, error_status, error_message, retry_after);
        if err.kind() == Some(ApiErrorKind::NotFound) {
            tracing::warn!(%model, "model not found; check the configured model names");
        }
        err
    }

    /// Send one `generateContent` request and return the raw reply.
    pub async fn generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model)?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(format!("Request timed out: {}", e), self.timeout)
                } else if e.is_connect() {
                    Error::transport(format!("Connection error: {}", e), e)
                } else {
                    Error::transport(format!("Request failed: {}", e), e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response, model).await);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| Error::serialization(format!("Failed to parse response: {}", e), e))
    }
}

#[async_trait::async_trait]
impl CompletionClient for Gemini {
    async fn complete(
        &self,
        model: &Model,
        history: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        let request = GenerateContentRequest::from_history(history, options, self.temperature);
        let inline_payloads = request.inline_data_count();
        COMPLETION_REQUESTS.click();
        COMPLETION_INLINE_PAYLOADS.count(inline_payloads as u64);
        tracing::debug!(
            %model,
            turns = request.contents.len(),
            inline_payloads,
            reasoning = options.reasoning_enabled,
            search = options.search_enabled,
            "sending generateContent request"
        );

        let start = Instant::now();
        let result = self.generate_content(model, &request).await;
        COMPLETION_DURATION.add(start.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                let completion = Completion::from(response);
                tracing::debug!(
                    %model,
                    chars = completion.text.len(),
                    sources = completion.sources.len(),
                    has_thinking = !completion.thinking.is_empty(),
                    "generateContent reply received"
                );
                Ok(completion)
            }
            Err(err) => {
                COMPLETION_ERRORS.click();
                tracing::warn!(%model, error = %err, "generateContent request failed");
                Err(err)
            }
        }
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok().filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, AttachmentKind, KnownModel, NO_RESPONSE_TEXT};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one HTTP response and hand back the raw request text.
    async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|value| value.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{addr}/v1beta/"), handle)
    }

    fn client_for(base_url: String) -> Gemini {
        Gemini::with_options(Some("test-key".to_string()), Some(base_url), None).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = Gemini::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);
        assert_eq!(client.temperature(), Some(DEFAULT_TEMPERATURE));

        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap()
        .with_temperature(None);
        assert_eq!(client.base_url.as_str(), "https://custom-api.example.com/v1/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
        assert_eq!(client.temperature(), None);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Gemini::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = Gemini::new(Some("k".to_string())).unwrap();
        let url = client
            .endpoint(&Model::Known(KnownModel::Gemini3ProPreview))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[tokio::test]
    async fn complete_posts_history_and_shapes_reply() {
        let (base_url, server) = serve_once(
            200,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"weighing it","thought":true},{"text":"Hello!"}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://news.example","title":"News"}}]}}]}"#,
        )
        .await;
        let client = client_for(base_url);
        let attachment = Attachment::new(
            AttachmentKind::Image,
            "file:///tmp/cat.png",
            Some("QUJD".to_string()),
            "cat.png",
            Some("image/png".to_string()),
        );
        let history = vec![Message::user("Hi", vec![attachment])];
        let options = CompletionOptions::new(true, true);

        let completion = client
            .complete(&Model::Known(KnownModel::Gemini3ProPreview), &history, &options)
            .await
            .unwrap();
        assert_eq!(completion.text, "Hello!");
        assert_eq!(completion.thinking, "weighing it");
        assert_eq!(completion.sources.len(), 1);

        let request = server.await.unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.starts_with(
            "post /v1beta/models/gemini-3-pro-preview:generatecontent http/1.1"
        ));
        assert!(lowered.contains("x-goog-api-key: test-key"));
        assert!(request.contains(r#""googleSearch":{}"#));
        assert!(request.contains(r#""thinkingBudget":16000"#));
        assert!(request.contains(r#""inlineData":{"mimeType":"image/png","data":"QUJD"}"#));
    }

    #[tokio::test]
    async fn empty_reply_gets_placeholder() {
        let (base_url, server) = serve_once(200, r#"{"candidates":[]}"#).await;
        let client = client_for(base_url);
        let history = vec![Message::user("Hi", Vec::new())];
        let completion = client
            .complete(
                &Model::Known(KnownModel::Gemini3FlashPreview),
                &history,
                &CompletionOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(completion.text, NO_RESPONSE_TEXT);
        assert!(completion.sources.is_empty());
        assert_eq!(completion.thinking, "");

        let request = server.await.unwrap();
        assert!(!request.contains("googleSearch"));
        assert!(!request.contains("thinkingConfig"));
    }

    #[tokio::test]
    async fn error_envelope_maps_to_typed_errors() {
        let (base_url, server) = serve_once(
            429,
            r#"{"error":{"code":429,"message":"quota exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;
        let client = client_for(base_url);
        let history = vec![Message::user("Hi", Vec::new())];
        let err = client
            .complete(
                &Model::Known(KnownModel::Gemini3FlashPreview),
                &history,
                &CompletionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("quota exhausted"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_status_keeps_api_status_string() {
        let (base_url, server) = serve_once(
            409,
            r#"{"error":{"code":409,"message":"aborted","status":"ABORTED"}}"#,
        )
        .await;
        let client = client_for(base_url);
        let history = vec![Message::user("Hi", Vec::new())];
        let err = client
            .complete(&Model::from("m"), &history, &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(409));
        assert!(err.to_string().contains("ABORTED"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_reply_is_serialization_error() {
        let (base_url, server) = serve_once(200, "not json").await;
        let client = client_for(base_url);
        let history = vec![Message::user("Hi", Vec::new())];
        let err = client
            .complete(&Model::from("m"), &history, &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_serialization());
        server.await.unwrap();
    }
}
