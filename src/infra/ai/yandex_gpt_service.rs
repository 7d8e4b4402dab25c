use crate::domain::ports::LlmService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{error, info, warn, instrument};
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 500;
const PROBE_PROMPT: &str = "Hello! This is a test message. Answer with one word: 'works'";

pub struct YandexGptService {
    client: Client,
    api_key: Option<String>,
    folder_id: Option<String>,
    api_url: String,
    model: String,
}

impl YandexGptService {
    pub fn new(api_key: Option<String>, folder_id: Option<String>, api_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            folder_id,
            api_url,
            model,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (self.api_key.as_deref(), self.folder_id.as_deref()) {
            (Some(key), Some(folder)) => Ok((key, folder)),
            _ => Err(AppError::ProviderUnavailable("YandexGPT credentials are not configured".into())),
        }
    }

    fn payload(&self, folder_id: &str, prompt: &str, system_instruction: &str) -> Value {
        let mut messages = Vec::new();
        if !system_instruction.is_empty() {
            messages.push(json!({ "role": "system", "text": system_instruction }));
        }
        messages.push(json!({ "role": "user", "text": prompt }));

        json!({
            "modelUri": format!("gpt://{}/{}", folder_id, self.model),
            "completionOptions": {
                "stream": false,
                "temperature": 0.7,
                "maxTokens": "1000"
            },
            "messages": messages
        })
    }

    async fn send_request_with_retry(&self, api_key: &str, folder_id: &str, payload: &Value) -> Result<String, AppError> {
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let res = self.client.post(&self.api_url)
                .header("Authorization", format!("Api-Key {}", api_key))
                .header("x-folder-id", folder_id)
                .header("Content-Type", "application/json")
                .json(payload)
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body: Value = response.json().await.map_err(|e| {
                            error!("Failed to parse YandexGPT response JSON: {:?}", e);
                            AppError::ProviderUnavailable("Malformed response body".into())
                        })?;
                        return extract_content(&body);
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            error!("YandexGPT failed after {} retries. Status: {}", retries, status);
                            let text = response.text().await.unwrap_or_default();
                            return Err(AppError::ProviderUnavailable(format!("{} - {}", status, text)));
                        }
                        warn!("YandexGPT transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("YandexGPT rejected the request {}: {}", status, text);
                        return Err(AppError::ProviderUnavailable(format!("Request rejected: {} - {}", status, text)));
                    }
                },
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("YandexGPT network error after {} retries: {:?}", retries, e);
                        return Err(AppError::ProviderUnavailable(format!("Network error: {}", e)));
                    }
                    warn!("YandexGPT network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }
}

/// Pulls the first non-empty alternative out of a completion response.
fn extract_content(body: &Value) -> Result<String, AppError> {
    let text = body.pointer("/result/alternatives")
        .and_then(|a| a.as_array())
        .and_then(|alternatives| {
            alternatives.iter()
                .filter_map(|alt| alt.pointer("/message/text").and_then(|t| t.as_str()))
                .map(str::trim)
                .find(|t| !t.is_empty())
        });

    match text {
        Some(t) => Ok(t.to_string()),
        None => {
            warn!("YandexGPT response carried no text: {:?}", body);
            Err(AppError::ProviderUnavailable("Empty response".into()))
        }
    }
}

#[async_trait]
impl LlmService for YandexGptService {
    #[instrument(skip(self, prompt, system_instruction), fields(prompt_len = prompt.len()))]
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str
    ) -> Result<String, AppError> {
        let (api_key, folder_id) = self.credentials()?;
        let payload = self.payload(folder_id, prompt, system_instruction);

        info!("Sending completion request to YandexGPT...");
        let result = self.send_request_with_retry(api_key, folder_id, &payload).await?;
        info!("Received completion from YandexGPT.");
        Ok(result)
    }

    fn is_initialized(&self) -> bool {
        self.credentials().is_ok()
    }

    async fn check_connection(&self) -> bool {
        match self.generate(PROBE_PROMPT, "").await {
            Ok(text) => text.to_lowercase().contains("works"),
            Err(e) => {
                error!("YandexGPT connection check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_first_non_empty_alternative() {
        let body = json!({
            "result": {
                "alternatives": [
                    { "message": { "role": "assistant", "text": "   " }, "status": "ALTERNATIVE_STATUS_FINAL" },
                    { "message": { "role": "assistant", "text": " The stars align " }, "status": "ALTERNATIVE_STATUS_FINAL" }
                ]
            }
        });
        assert_eq!(extract_content(&body).unwrap(), "The stars align");
    }

    #[test]
    fn test_extract_rejects_missing_text() {
        assert!(extract_content(&json!({ "result": { "alternatives": [] } })).is_err());
        assert!(extract_content(&json!({ "error": "quota" })).is_err());
    }

    #[test]
    fn test_payload_uses_folder_model_uri() {
        let service = YandexGptService::new(
            Some("key".into()), Some("b1gfolder".into()),
            "http://localhost".into(), "yandexgpt-lite".into(), Duration::from_secs(1),
        );
        let payload = service.payload("b1gfolder", "prompt", "system");
        assert_eq!(payload["modelUri"], "gpt://b1gfolder/yandexgpt-lite");
        assert_eq!(payload["completionOptions"]["maxTokens"], "1000");
        assert_eq!(payload["messages"].as_array().unwrap().len(), 2);
        assert!(service.is_initialized());
    }

    #[test]
    fn test_missing_credentials_means_uninitialized() {
        let service = YandexGptService::new(
            Some("key".into()), None,
            "http://localhost".into(), "yandexgpt-lite".into(), Duration::from_secs(1),
        );
        assert!(!service.is_initialized());
    }
}
