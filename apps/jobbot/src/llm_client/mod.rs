/// LLM Client — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the generation service directly.
/// Every stage goes through `GenerationClient`, which owns the retry and
/// error-classification policy:
///
/// - malformed JSON → retried with the same prompt, up to `max_attempts` in total
/// - quota exhaustion → never retried
/// - anything else → never retried
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Transport-level failures of a [`TextGenerator`].
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// Failures surfaced to pipeline callers.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Malformed response after {attempts} attempts: {reason}")]
    MalformedResponse { attempts: u32, reason: String },

    #[error("Generation quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            GenerationError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GenerationError::GenerationFailed(_) => "GENERATION_FAILED",
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, GenerationError::QuotaExceeded(_))
    }
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::QuotaExceeded(msg) => GenerationError::QuotaExceeded(msg),
            other => GenerationError::GenerationFailed(other.to_string()),
        }
    }
}

/// An opaque request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// A text-generation backend. Returns the raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini REST backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini `generateContent` client. Performs exactly one HTTP call per request.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &request.system,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<GeminiError>(&raw).ok();
            let is_quota = status.as_u16() == 429
                || parsed
                    .as_ref()
                    .is_some_and(|e| e.error.status == "RESOURCE_EXHAUSTED");
            let message = parsed.map(|e| e.error.message).unwrap_or(raw);

            if is_quota {
                warn!("Gemini quota exhausted ({}): {}", status, message);
                return Err(LlmError::QuotaExceeded(message));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation client: retry + classification policy
// ────────────────────────────────────────────────────────────────────────────

/// The single generation client shared by all pipeline stages.
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, max_attempts: u32, timeout: Duration) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
            timeout,
        }
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        tokio::time::timeout(self.timeout, self.generator.generate(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))?
    }

    /// Calls the service and deserializes the response as JSON into `T`.
    ///
    /// Code fences are stripped first. Unparseable or empty output is retried
    /// with the same prompt; after `max_attempts` the call fails with
    /// `MalformedResponse`. Service errors are never retried.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<T, GenerationError> {
        let mut reason = String::new();

        for attempt in 1..=self.max_attempts {
            let text = match self.attempt(request).await {
                Ok(text) => text,
                Err(LlmError::EmptyContent) => {
                    warn!(
                        "Empty response on attempt {}/{}",
                        attempt, self.max_attempts
                    );
                    reason = LlmError::EmptyContent.to_string();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match serde_json::from_str::<T>(strip_json_fences(&text)) {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Well-formed response on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        "Malformed JSON on attempt {}/{}: {}",
                        attempt, self.max_attempts, e
                    );
                    debug!(
                        "Problematic response: {:?}",
                        text.chars().take(200).collect::<String>()
                    );
                    reason = e.to_string();
                }
            }
        }

        Err(GenerationError::MalformedResponse {
            attempts: self.max_attempts,
            reason,
        })
    }

    /// Single-attempt free-text call. Returns the trimmed model text.
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let text = self.attempt(request).await?;
        Ok(text.trim().to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let body = ["```json", "```JSON", "```"]
        .iter()
        .find_map(|fence| text.strip_prefix(fence));

    match body {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(stripped)
        }
        None => text.strip_suffix("```").map(|s| s.trim()).unwrap_or(text),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{client, Reply, ScriptedGenerator};
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        key: String,
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("system", "PAYLOAD please")
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_generate_json_parses_fenced_output() {
        let generator = Arc::new(ScriptedGenerator::new().on(
            "PAYLOAD",
            vec![Reply::Text("```json\n{\"key\": \"v\"}\n```".to_string())],
        ));
        let payload: Payload = client(generator.clone())
            .generate_json(&request())
            .await
            .unwrap();
        assert_eq!(payload.key, "v");
        assert_eq!(generator.calls("PAYLOAD"), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_retried_three_times_then_fails() {
        let generator = Arc::new(
            ScriptedGenerator::new().on("PAYLOAD", vec![Reply::Text("not json".to_string())]),
        );
        let err = client(generator.clone())
            .generate_json::<Payload>(&request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
        assert!(matches!(
            err,
            GenerationError::MalformedResponse { attempts: 3, .. }
        ));
        assert_eq!(generator.calls("PAYLOAD"), 3);
    }

    #[tokio::test]
    async fn test_valid_output_on_third_attempt_is_used() {
        let generator = Arc::new(ScriptedGenerator::new().on(
            "PAYLOAD",
            vec![
                Reply::Text("{oops".to_string()),
                Reply::Empty,
                Reply::json(json!({"key": "third"})),
            ],
        ));
        let payload: Payload = client(generator.clone())
            .generate_json(&request())
            .await
            .unwrap();
        assert_eq!(payload.key, "third");
        assert_eq!(generator.calls("PAYLOAD"), 3);
    }

    #[tokio::test]
    async fn test_quota_error_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new().on("PAYLOAD", vec![Reply::Quota]));
        let err = client(generator.clone())
            .generate_json::<Payload>(&request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "QUOTA_EXCEEDED");
        assert!(err.is_quota());
        assert_eq!(generator.calls("PAYLOAD"), 1);
    }

    #[tokio::test]
    async fn test_service_error_is_not_retried() {
        let generator = Arc::new(
            ScriptedGenerator::new().on("PAYLOAD", vec![Reply::Fail("boom".to_string())]),
        );
        let err = client(generator.clone())
            .generate_json::<Payload>(&request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "GENERATION_FAILED");
        assert_eq!(generator.calls("PAYLOAD"), 1);
    }

    #[tokio::test]
    async fn test_generate_text_trims_output() {
        let generator = Arc::new(
            ScriptedGenerator::new().on("PAYLOAD", vec![Reply::Text("\n  Resume body \n".to_string())]),
        );
        let text = client(generator).generate_text(&request()).await.unwrap();
        assert_eq!(text, "Resume body");
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_generation_failure() {
        let client = GenerationClient::new(Arc::new(SlowGenerator), 3, Duration::from_secs(30));
        let err = client.generate_text(&request()).await.unwrap_err();
        assert_eq!(err.code(), "GENERATION_FAILED");
    }

    fn gemini(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            "test-key".to_string(),
            DEFAULT_MODEL.to_string(),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_gemini_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"a\": "}, {"text": "1}"}]}}],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
            })))
            .mount(&server)
            .await;

        let text = gemini(&server).generate(&request()).await.unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_gemini_429_is_quota_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = gemini(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::QuotaExceeded(ref m) if m.contains("exhausted")));
    }

    #[tokio::test]
    async fn test_gemini_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = gemini(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(GenerationError::from(err).code(), "GENERATION_FAILED");
    }

    #[tokio::test]
    async fn test_gemini_without_candidates_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = gemini(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
