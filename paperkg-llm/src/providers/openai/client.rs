//! HTTP transport for OpenAI-compatible chat-completions and embeddings
//! endpoints, rate limited.

use super::types::ApiError;
use crate::LlmError;
use paperkg_ratelimit::TokenBucketRateLimiter;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

const PROVIDER: &str = "openai";

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    rate_limiter: TokenBucketRateLimiter,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        let refill_rate = (requests_per_minute.max(1) as f64) / 60.0;
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            rate_limiter: TokenBucketRateLimiter::new(1.0, refill_rate),
        }
    }

    async fn post(&self, endpoint: &str, body: impl Serialize) -> Result<Response, LlmError> {
        self.rate_limiter.acquire(1.0).await;

        let url = format!("{}/{}", self.base_url, endpoint);
        self.http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("request failed: {e}"),
            })
    }

    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Req,
    ) -> Result<Res, LlmError> {
        let response = self.post(endpoint, body).await?;
        Self::parse_response(response).await
    }

    pub async fn request_stream(
        &self,
        endpoint: &str,
        body: impl Serialize,
    ) -> Result<Response, LlmError> {
        let response = self.post(endpoint, body).await?;
        Self::check_status(&response)?;
        Ok(response)
    }

    fn check_status(response: &Response) -> Result<(), LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { provider: PROVIDER.to_string() },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::InvalidApiKey { provider: PROVIDER.to_string() }
            }
            _ => LlmError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("unexpected status {status}"),
            },
        })
    }

    async fn parse_response<Res: DeserializeOwned>(response: Response) -> Result<Res, LlmError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| LlmError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { provider: PROVIDER.to_string() },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::InvalidApiKey { provider: PROVIDER.to_string() }
            }
            _ => LlmError::ProviderError { provider: PROVIDER.to_string(), message },
        })
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
