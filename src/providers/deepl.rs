use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;

use super::{TranslationRequest, Translator};

/// Status code DeepL uses for an exhausted character quota
const QUOTA_EXCEEDED_STATUS: u16 = 456;

/// DeepL client for interacting with the DeepL API
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API host override; the request tier picks the host when empty
    endpoint: String,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// DeepL translate request
#[derive(Debug, Serialize)]
pub struct DeepLRequest {
    /// Texts to translate
    text: Vec<String>,

    /// Target language code
    target_lang: String,

    /// Source language code
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,

    /// Context that influences the translation but is not translated
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl DeepLRequest {
    /// Build the wire request for a translation request
    pub fn from_request(request: &TranslationRequest) -> Self {
        Self {
            text: vec![request.text.clone()],
            target_lang: request.target_language.clone(),
            source_lang: request.source_language.clone(),
            context: request.context.clone(),
        }
    }
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One translation per requested text
    pub translations: Vec<DeepLTranslation>,
}

/// A single translated text
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Source language detected by the service
    #[serde(default)]
    pub detected_source_language: Option<String>,
    /// The translated text
    pub text: String,
}

impl DeepL {
    /// Create a new DeepL client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::new_with_config(api_key, String::new(), 1000, 30)
    }

    /// Create a new DeepL client with configuration
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        backoff_base_ms: u64,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            backoff_base_ms,
        }
    }

    /// URL of the translate endpoint for a request
    pub fn translate_url(&self, request: &TranslationRequest) -> String {
        let base = if self.endpoint.is_empty() {
            request.tier.default_endpoint()
        } else {
            self.endpoint.as_str()
        };
        format!("{}/v2/translate", base.trim_end_matches('/'))
    }

    /// Send a single translate request without retrying
    async fn send(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.translate_url(request))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&DeepLRequest::from_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(error_for_status(status, error_text));
        }

        let parsed = response.json::<DeepLResponse>().await?;
        extract_text(parsed)
    }
}

/// Map a non-success status to a provider error
pub fn error_for_status(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        QUOTA_EXCEEDED_STATUS => ProviderError::QuotaExceeded(message),
        429 => ProviderError::RateLimitExceeded(message),
        status_code => ProviderError::ApiError { status_code, message },
    }
}

/// Take the single translation out of a response
pub fn extract_text(response: DeepLResponse) -> Result<String, ProviderError> {
    response
        .translations
        .into_iter()
        .next()
        .map(|t| t.text.trim().to_string())
        .ok_or_else(|| ProviderError::ParseError("response contains no translation".to_string()))
}

/// Exponential backoff with up to 25% jitter
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponential = base_ms.saturating_mul(1u64 << attempt.min(10));
    let jitter = if exponential >= 4 {
        rand::rng().random_range(0..=exponential / 4)
    } else {
        0
    };
    Duration::from_millis(exponential + jitter)
}

#[async_trait]
impl Translator for DeepL {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let mut attempt = 0;

        loop {
            match self.send(request).await {
                Ok(text) => {
                    debug!("Translated '{}' -> '{}'", request.text, text);
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < request.retries => {
                    let delay = backoff_delay(self.backoff_base_ms, attempt);
                    attempt += 1;
                    warn!(
                        "Translation of '{}' failed ({}), retry {}/{} in {:?}",
                        request.text, e, attempt, request.retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
