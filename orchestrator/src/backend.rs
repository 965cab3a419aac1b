use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use tutor_common::protocol::{
    CHAT_PATH, CONFIG_PATH, ChatRequest, ChatResponse, ConfigResponse, FEEDBACK_PATH,
    FeedbackRequest, FeedbackResponse, HINT_PATH, HintRequest, HintResponse,
    SWITCH_PROVIDER_PATH, SwitchProviderRequest, SwitchProviderResponse, TRANSLATE_PATH,
    TranslateRequest, TranslateResponse, non_empty,
};
use tutor_common::session::ProviderId;

/// Trait abstracting the tutoring services. Enables mock-based testing
/// without a running backend.
///
/// Text-returning calls yield `Ok(None)` when the response was well formed but
/// carried nothing to show.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Conversational reply for the latest user message.
    async fn reply(&self, request: &ChatRequest) -> Result<Option<String>, BackendError>;

    /// Translate `text` into the learner's native language.
    async fn translate(&self, text: &str) -> Result<Option<String>, BackendError>;

    /// Language feedback on the learner's sentence.
    async fn feedback(&self, request: &FeedbackRequest) -> Result<Option<String>, BackendError>;

    /// English phrasing hint for a Japanese sentence.
    async fn hint(&self, request: &HintRequest) -> Result<Option<String>, BackendError>;

    async fn switch_provider(
        &self,
        provider: &ProviderId,
    ) -> Result<SwitchProviderResponse, BackendError>;

    async fn fetch_config(&self) -> Result<ConfigResponse, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{path} returned HTTP {status}")]
    Status { path: &'static str, status: u16 },

    #[error("Parse error: {0}")]
    Decode(String),
}

/// JSON-over-HTTP backend. No timeout and no retry: a hung request stays
/// pending until the server answers or the connection drops.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &'static str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        debug!("[backend] POST {path}");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(path, response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &'static str) -> Result<R, BackendError> {
        debug!("[backend] GET {path}");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(path, response).await
    }

    async fn decode<R: DeserializeOwned>(
        path: &'static str,
        response: reqwest::Response,
    ) -> Result<R, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                path,
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl TutorBackend for HttpBackend {
    async fn reply(&self, request: &ChatRequest) -> Result<Option<String>, BackendError> {
        let resp: ChatResponse = self.post(CHAT_PATH, request).await?;
        Ok(non_empty(resp.response))
    }

    async fn translate(&self, text: &str) -> Result<Option<String>, BackendError> {
        let resp: TranslateResponse = self
            .post(TRANSLATE_PATH, &TranslateRequest::new(text))
            .await?;
        Ok(non_empty(resp.translation))
    }

    async fn feedback(&self, request: &FeedbackRequest) -> Result<Option<String>, BackendError> {
        let resp: FeedbackResponse = self.post(FEEDBACK_PATH, request).await?;
        Ok(non_empty(resp.feedback))
    }

    async fn hint(&self, request: &HintRequest) -> Result<Option<String>, BackendError> {
        let resp: HintResponse = self.post(HINT_PATH, request).await?;
        Ok(non_empty(resp.hint))
    }

    async fn switch_provider(
        &self,
        provider: &ProviderId,
    ) -> Result<SwitchProviderResponse, BackendError> {
        let body = SwitchProviderRequest {
            provider: provider.clone(),
        };
        self.post(SWITCH_PROVIDER_PATH, &body).await
    }

    async fn fetch_config(&self) -> Result<ConfigResponse, BackendError> {
        self.get(CONFIG_PATH).await
    }
}

/// Offline backend returning predefined teacher replies in order, cycling when
/// exhausted. Translation and feedback are canned so every panel has content.
pub struct ScriptedBackend {
    replies: Vec<String>,
    index: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
        }
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new(vec![
            "That's great! Can you tell me more about it?".to_string(),
            "Interesting! What did you enjoy the most?".to_string(),
            "Excellent work! Let's try another topic. What do you like to do on weekends?"
                .to_string(),
        ])
    }
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    async fn reply(&self, _request: &ChatRequest) -> Result<Option<String>, BackendError> {
        if self.replies.is_empty() {
            return Err(BackendError::Transport(
                "ScriptedBackend has no replies configured".to_string(),
            ));
        }
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        Ok(Some(self.replies[i % self.replies.len()].clone()))
    }

    async fn translate(&self, text: &str) -> Result<Option<String>, BackendError> {
        Ok(Some(format!("（和訳）{text}")))
    }

    async fn feedback(&self, request: &FeedbackRequest) -> Result<Option<String>, BackendError> {
        Ok(Some(format!(
            "「{}」は自然な英語です。この調子で続けましょう。",
            request.text
        )))
    }

    async fn hint(&self, request: &HintRequest) -> Result<Option<String>, BackendError> {
        Ok(Some(format!(
            "「{}」は英語でこう言えます: Could you say it like this?",
            request.japanese_text
        )))
    }

    async fn switch_provider(
        &self,
        provider: &ProviderId,
    ) -> Result<SwitchProviderResponse, BackendError> {
        let known = matches!(
            provider.as_str(),
            ProviderId::ANTHROPIC | ProviderId::AZURE_OPENAI
        );
        Ok(SwitchProviderResponse {
            success: known,
            message: (!known).then(|| "Invalid provider".to_string()),
        })
    }

    async fn fetch_config(&self) -> Result<ConfigResponse, BackendError> {
        Ok(ConfigResponse {
            default_level: Some("400".to_string()),
        })
    }
}
