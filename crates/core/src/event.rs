//! Inbound events and presentation-agnostic replies.
//!
//! The dispatch surface hands the engine one `Event` per user interaction;
//! the engine answers with `Reply` values the surface is free to render
//! however it likes (keyboard, buttons, plain text).

/// Bot commands the dispatch surface recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Enter the free-form Q&A flow.
    Ask,
    /// Enter the personality role-play flow.
    Talk,
    /// Enter the quiz flow.
    Quiz,
    /// Enter the translation flow.
    Translate,
    /// One-shot random fact; no flow state involved.
    Random,
}

/// One inbound user interaction.
///
/// `message_id` identifies the inbound message within the user's stream and
/// keys the deferred-synthesis cache for responses produced from it.
#[derive(Debug, Clone)]
pub enum Event {
    Command(Command),
    Text { message_id: u64, text: String },
    Voice { message_id: u64, audio: Vec<u8> },
    Button { payload: String },
}

/// A labeled action the surface may render as a button; `payload` comes back
/// verbatim in a later `Event::Button`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub label: String,
    pub payload: String,
}

impl Action {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// One outbound message: body text, optional synthesized audio, and the
/// actions to offer next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub audio: Option<Vec<u8>>,
    pub actions: Vec<Action>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_actions(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            text: text.into(),
            audio: None,
            actions,
        }
    }

    pub fn voice(text: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            text: text.into(),
            audio: Some(audio),
            actions: Vec::new(),
        }
    }
}

/// Dispatch failures the surface must handle itself.
///
/// User-recoverable conditions (provider failures, invalid selections,
/// expired cache entries) are reported as `Reply` text instead; only an
/// action payload nobody recognizes is rejected as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unrecognized action payload: {0}")]
    UnknownAction(String),
}
