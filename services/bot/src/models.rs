//! API Models
//!
//! Request and response bodies for the bot front end, annotated for OpenAPI
//! generation with `utoipa`. Voice payloads travel as base64 strings; the
//! engine itself works on raw bytes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parley_core::{Action, Command, Reply};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A slash command, as the user would type it.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Start,
    Help,
    Ask,
    Talk,
    Quiz,
    Translate,
    Random,
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Start => Command::Start,
            CommandKind::Help => Command::Help,
            CommandKind::Ask => Command::Ask,
            CommandKind::Talk => Command::Talk,
            CommandKind::Quiz => Command::Quiz,
            CommandKind::Translate => Command::Translate,
            CommandKind::Random => Command::Random,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CommandPayload {
    #[schema(example = "quiz")]
    pub command: CommandKind,
}

#[derive(Deserialize, ToSchema)]
pub struct TextPayload {
    #[schema(example = 42)]
    pub message_id: u64,
    #[schema(example = "Why is the sky blue?")]
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VoicePayload {
    #[schema(example = 43)]
    pub message_id: u64,
    /// Base64-encoded audio bytes (OGG/Opus as recorded by the client).
    pub audio: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ButtonPayload {
    #[schema(example = "quiz_theme_science")]
    pub payload: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ActionBody {
    pub label: String,
    pub payload: String,
}

impl From<Action> for ActionBody {
    fn from(action: Action) -> Self {
        Self {
            label: action.label,
            payload: action.payload,
        }
    }
}

/// One outbound message for the client to present.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ReplyBody {
    pub text: String,
    /// Base64-encoded synthesized audio, when the reply carries voice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    pub actions: Vec<ActionBody>,
}

impl From<Reply> for ReplyBody {
    fn from(reply: Reply) -> Self {
        Self {
            text: reply.text,
            audio: reply.audio.map(|bytes| BASE64.encode(bytes)),
            actions: reply.actions.into_iter().map(ActionBody::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
