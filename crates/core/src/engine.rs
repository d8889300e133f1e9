//! Dispatch Engine
//!
//! Routes each inbound event to the active flow's current-stage handler.
//! The engine holds the user's session lock for the entire handling of one
//! event, so at most one handler runs per session at a time; duplicate
//! button presses for the same user are processed strictly in sequence.

use crate::catalog::Catalog;
use crate::event::{Action, Command, EngineError, Event, Reply};
use crate::flows::{qna, quiz, talk, translate};
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::session::{FlowKind, Session, SessionLimits, SessionStore};
use std::sync::Arc;
use tracing::{debug, warn};

const RANDOM_MORE: &str = "random_more";
const RANDOM_END: &str = "random_end";

const START_TEXT: &str = "👋 Hi! I'm Parley, your assistant.\n\n\
Commands:\n\
/start — main menu\n\
/help — help\n\
/ask — ask the assistant a question\n\
/random — a random interesting fact\n\
/talk — talk to a famous personality\n\
/quiz — play a quiz\n\
/translate — translate text and voice";

const HELP_TEXT: &str = "📖 Command reference:\n\n\
/start — main menu\n\
/help — this help\n\
/ask — ask the assistant a question\n\
/random — get a random fact\n\
/talk — talk to a famous personality\n\
/quiz — play a quiz\n\
/translate — translate text or voice\n\n\
🎤 Voice mode:\n\
Send a voice message outside of any mode and I'll answer you with voice!";

/// The conversation engine: session store + flow controllers + gateway.
pub struct Engine {
    gateway: Arc<dyn ProviderGateway>,
    catalog: Catalog,
    store: SessionStore,
}

impl Engine {
    pub fn new(gateway: Arc<dyn ProviderGateway>, catalog: Catalog, limits: SessionLimits) -> Self {
        Self {
            gateway,
            catalog,
            store: SessionStore::new(limits),
        }
    }

    /// Handles one inbound event for one user and returns the replies to
    /// present. Provider failures never surface here; they become apology
    /// replies with the flow kept in its current stage. The only error is an
    /// action payload nobody recognizes.
    pub async fn handle(&self, user_id: u64, event: Event) -> Result<Vec<Reply>, EngineError> {
        let session = self.store.get_or_create(user_id).await;
        let mut session = session.lock().await;
        debug!(user_id, flow = ?session.flow.kind(), "handling event");

        match event {
            Event::Command(command) => Ok(self.on_command(&mut session, command).await),
            Event::Text { message_id, text } => {
                Ok(self.on_text(&mut session, message_id, &text).await)
            }
            Event::Voice { message_id, audio } => {
                Ok(self.on_voice(&mut session, message_id, audio).await)
            }
            Event::Button { payload } => self.on_button(&mut session, &payload).await,
        }
    }

    async fn on_command(&self, session: &mut Session, command: Command) -> Vec<Reply> {
        match command {
            Command::Start => {
                session.end_flow();
                vec![Reply::text(START_TEXT)]
            }
            Command::Help => vec![Reply::text(HELP_TEXT)],
            Command::Ask => qna::start(session),
            Command::Talk => talk::start(session, &self.catalog),
            Command::Quiz => quiz::start(session, &self.catalog),
            Command::Translate => translate::start(session, &self.catalog),
            Command::Random => self.random_fact().await,
        }
    }

    async fn on_text(&self, session: &mut Session, message_id: u64, text: &str) -> Vec<Reply> {
        match session.flow.kind() {
            FlowKind::Qna => qna::on_text(session, self.gateway.as_ref(), message_id, text).await,
            FlowKind::Talk => talk::on_text(session, self.gateway.as_ref(), text).await,
            FlowKind::Quiz => quiz::on_answer(session, self.gateway.as_ref(), text).await,
            FlowKind::Translate => {
                translate::on_text(session, self.gateway.as_ref(), message_id, text).await
            }
            FlowKind::Idle => vec![Reply::text(
                "I'm not in any mode right now. Use /help to see what I can do.",
            )],
        }
    }

    async fn on_voice(&self, session: &mut Session, message_id: u64, audio: Vec<u8>) -> Vec<Reply> {
        match session.flow.kind() {
            FlowKind::Qna => {
                qna::on_voice(session, self.gateway.as_ref(), message_id, audio).await
            }
            FlowKind::Translate => {
                translate::on_voice(session, self.gateway.as_ref(), message_id, audio).await
            }
            FlowKind::Talk | FlowKind::Quiz => {
                vec![Reply::text("Please answer with a text message here.")]
            }
            FlowKind::Idle => self.voice_echo(audio).await,
        }
    }

    async fn on_button(
        &self,
        session: &mut Session,
        payload: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let kind = session.flow.kind();

        if payload.starts_with(qna::PREFIX) {
            if kind != FlowKind::Qna {
                return Ok(vec![expired_action("/ask")]);
            }
            return qna::on_button(session, self.gateway.as_ref(), payload).await;
        }
        if payload.starts_with(talk::PREFIX) {
            if kind != FlowKind::Talk {
                return Ok(vec![expired_action("/talk")]);
            }
            return talk::on_button(session, &self.catalog, payload).await;
        }
        if payload.starts_with(quiz::PREFIX) {
            if kind != FlowKind::Quiz {
                return Ok(vec![expired_action("/quiz")]);
            }
            return quiz::on_button(session, self.gateway.as_ref(), &self.catalog, payload).await;
        }
        if payload.starts_with(translate::PREFIX) {
            if kind != FlowKind::Translate {
                return Ok(vec![expired_action("/translate")]);
            }
            return translate::on_button(session, self.gateway.as_ref(), &self.catalog, payload)
                .await;
        }

        match payload {
            RANDOM_MORE => Ok(self.random_fact().await),
            RANDOM_END => Ok(vec![Reply::text(
                "👋 Come back for more facts!\n\nUse /start for the main menu.",
            )]),
            _ => {
                warn!(payload, "unrecognized action payload");
                Err(EngineError::UnknownAction(payload.to_string()))
            }
        }
    }

    /// One-shot fact with no session state involved.
    async fn random_fact(&self) -> Vec<Reply> {
        let fact = match self.gateway.generate(prompts::RANDOM_FACT, None).await {
            Ok(fact) => fact,
            Err(error) => {
                warn!(%error, "random fact generation failed");
                return vec![Reply::text(prompts::APOLOGY)];
            }
        };

        vec![Reply::with_actions(
            format!("🎲 Random fact:\n\n{fact}"),
            vec![
                Action::new("🎲 Another fact", RANDOM_MORE),
                Action::new("❌ Finish", RANDOM_END),
            ],
        )]
    }

    /// A voice message outside of any mode: transcribe, answer, and speak
    /// the answer back. Falls back to text when synthesis fails.
    async fn voice_echo(&self, audio: Vec<u8>) -> Vec<Reply> {
        let text = match self.gateway.transcribe(audio).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "transcription failed");
                return vec![Reply::text(prompts::TRANSCRIPTION_FAILED)];
            }
        };

        let answer = match self.gateway.generate(&text, None).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!(%error, "voice answer generation failed");
                return vec![
                    Reply::text(format!("📝 You said: {text}")),
                    Reply::text(prompts::APOLOGY),
                ];
            }
        };

        let reply = match self.gateway.synthesize(&answer).await {
            Ok(voice) => Reply::voice(format!("🤖 {answer}"), voice),
            Err(error) => {
                warn!(%error, "voice answer synthesis failed");
                Reply::text(format!("🤖 {answer}"))
            }
        };
        vec![Reply::text(format!("📝 You said: {text}")), reply]
    }
}

fn expired_action(command: &str) -> Reply {
    Reply::text(format!(
        "⌛ That button is no longer active. Use {command} to start again."
    ))
}
