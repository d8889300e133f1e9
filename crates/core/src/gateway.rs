//! Provider Gateway
//!
//! Boundary abstraction over the external text-generation and speech
//! services. Four stateless operations, each a single async round-trip with
//! a defensive timeout. No retries and no caching here; deferred-synthesis
//! caching lives in the session layer.

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        AudioInput, ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateSpeechRequestArgs, CreateTranscriptionRequestArgs,
        SpeechModel, Voice,
    },
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::future::Future;
use std::time::Duration;

/// Who authored a turn of conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One (role, text) turn of conversation history.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// A typed failure from the provider boundary.
///
/// Flows never inspect returned text for error markers; failure is always
/// signaled through this type.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("provider request failed: {0}")]
    Provider(#[from] OpenAIError),
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// The contract for the external text-generation and speech services.
///
/// Callers must tolerate failure on every operation: the flow layer converts
/// generation failures into a fixed apology reply and keeps the session in
/// its current stage so the user can retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Single-turn completion, with an optional system prompt.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<String>,
    ) -> Result<String, GatewayError>;

    /// Multi-turn completion over accumulated conversation history.
    async fn generate_with_history(&self, history: &[ChatTurn]) -> Result<String, GatewayError>;

    /// Speech-to-text over an opaque audio payload.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GatewayError>;

    /// Text-to-speech; returns the synthesized audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError>;
}

/// `ProviderGateway` implementation backed by an OpenAI-compatible API.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGateway {
    /// Creates a gateway for an OpenAI-compatible service.
    ///
    /// `timeout` bounds every remote call; a timed-out call surfaces as
    /// `GatewayError::Timeout` and is treated like any other provider
    /// failure by the flows.
    pub fn new(config: OpenAIConfig, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, OpenAIError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
            .map_err(GatewayError::from)
    }

    async fn chat(&self, history: &[ChatTurn], temperature: f32) -> Result<String, GatewayError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_request_messages(history)?)
            .temperature(temperature)
            .build()?;

        let response = self.with_timeout(self.client.chat().create(request)).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }
}

fn to_request_messages(
    history: &[ChatTurn],
) -> Result<Vec<ChatCompletionRequestMessage>, GatewayError> {
    history
        .iter()
        .map(|turn| {
            let message: ChatCompletionRequestMessage = match turn.role {
                ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()?
                    .into(),
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()?
                    .into(),
            };
            Ok(message)
        })
        .collect()
}

#[async_trait]
impl ProviderGateway for OpenAiGateway {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<String>,
    ) -> Result<String, GatewayError> {
        let mut turns = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            turns.push(ChatTurn::system(system));
        }
        turns.push(ChatTurn::user(prompt));
        self.chat(&turns, 0.7).await
    }

    async fn generate_with_history(&self, history: &[ChatTurn]) -> Result<String, GatewayError> {
        // Role-play answers read better with a bit more variance.
        self.chat(history, 0.9).await
    }

    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GatewayError> {
        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8("voice.ogg".to_string(), audio))
            .model("whisper-1")
            .build()?;

        let response = self
            .with_timeout(self.client.audio().transcribe(request))
            .await?;
        Ok(response.text)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(SpeechModel::Tts1)
            .voice(Voice::Nova)
            .build()?;

        let response = self
            .with_timeout(self.client.audio().speech(request))
            .await?;
        Ok(response.bytes.to_vec())
    }
}
