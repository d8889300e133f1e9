//! Q&A Flow
//!
//! Free-form questions to the assistant. A single stage that loops on every
//! question; each answer is cached under the inbound message id so the user
//! can ask for a spoken version later.

use super::synthesize_cached;
use crate::event::{Action, EngineError, Reply};
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::session::{FlowState, Session};
use tracing::{info, warn};

pub(crate) const PREFIX: &str = "qna_";
const ACTION_TTS: &str = "qna_tts_";
const ACTION_MORE: &str = "qna_more";
const ACTION_END: &str = "qna_end";

pub fn start(session: &mut Session) -> Vec<Reply> {
    session.flow = FlowState::Qna;
    vec![Reply::text(
        "🤖 Ask me anything — send your question as text or a voice message 🎤",
    )]
}

fn answer_actions(message_id: u64) -> Vec<Action> {
    vec![
        Action::new("🔊 Voice the answer", format!("{ACTION_TTS}{message_id}")),
        Action::new("➕ Another question", ACTION_MORE),
        Action::new("❌ Finish", ACTION_END),
    ]
}

pub async fn on_text(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    message_id: u64,
    text: &str,
) -> Vec<Reply> {
    match gateway.generate(text, None).await {
        Ok(answer) => {
            session.cache.insert(message_id, answer.clone());
            info!(message_id, "answered a question");
            vec![Reply::with_actions(answer, answer_actions(message_id))]
        }
        Err(error) => {
            warn!(%error, "question generation failed");
            vec![Reply::text(prompts::APOLOGY)]
        }
    }
}

pub async fn on_voice(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    message_id: u64,
    audio: Vec<u8>,
) -> Vec<Reply> {
    let text = match gateway.transcribe(audio).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "transcription failed");
            return vec![Reply::text(prompts::TRANSCRIPTION_FAILED)];
        }
    };

    let mut replies = vec![Reply::text(format!("📝 You said: {text}"))];
    replies.extend(on_text(session, gateway, message_id, &text).await);
    replies
}

pub async fn on_button(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    payload: &str,
) -> Result<Vec<Reply>, EngineError> {
    if let Some(raw_key) = payload.strip_prefix(ACTION_TTS) {
        let Ok(key) = raw_key.parse::<u64>() else {
            return Err(EngineError::UnknownAction(payload.to_string()));
        };
        return Ok(synthesize_cached(session, gateway, key).await);
    }

    match payload {
        ACTION_MORE => Ok(vec![Reply::text(
            "🤖 Ready for the next one — send your question.",
        )]),
        ACTION_END => {
            session.end_flow();
            Ok(vec![Reply::text(
                "👋 Come back with more questions!\n\nUse /start for the main menu.",
            )])
        }
        _ => Err(EngineError::UnknownAction(payload.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, MockProviderGateway};
    use crate::session::{FlowKind, SessionLimits};

    fn session() -> Session {
        let mut session = Session::new(SessionLimits::default());
        session.flow = FlowState::Qna;
        session
    }

    #[tokio::test]
    async fn text_question_is_answered_and_cached() {
        let mut session = session();
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("42".to_string()));

        let replies = on_text(&mut session, &gateway, 10, "meaning of life?").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "42");
        assert_eq!(replies[0].actions.len(), 3);
        assert_eq!(session.cache.get(10).as_deref(), Some("42"));
        assert_eq!(session.flow.kind(), FlowKind::Qna);
    }

    #[tokio::test]
    async fn generation_failure_keeps_stage_and_caches_nothing() {
        let mut session = session();
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_generate()
            .returning(|_, _| Err(GatewayError::EmptyResponse));

        let replies = on_text(&mut session, &gateway, 10, "?").await;
        assert_eq!(replies[0].text, prompts::APOLOGY);
        assert!(session.cache.is_empty());
        assert_eq!(session.flow.kind(), FlowKind::Qna);
    }

    #[tokio::test]
    async fn voice_question_is_transcribed_then_answered() {
        let mut session = session();
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("hello there".to_string()));
        gateway
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("hi".to_string()));

        let replies = on_voice(&mut session, &gateway, 11, vec![1, 2, 3]).await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("hello there"));
        assert_eq!(replies[1].text, "hi");
    }

    #[tokio::test]
    async fn failed_transcription_reports_and_stays_in_flow() {
        let mut session = session();
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_transcribe()
            .returning(|_| Err(GatewayError::EmptyResponse));
        gateway.expect_generate().times(0);

        let replies = on_voice(&mut session, &gateway, 11, vec![1]).await;
        assert_eq!(replies, vec![Reply::text(prompts::TRANSCRIPTION_FAILED)]);
        assert_eq!(session.flow.kind(), FlowKind::Qna);
    }

    #[tokio::test]
    async fn synthesize_consumes_the_cache_entry_once() {
        let mut session = session();
        session.cache.insert(10, "42".to_string());
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(vec![0xAA]));

        let replies = on_button(&mut session, &gateway, "qna_tts_10").await.unwrap();
        assert_eq!(replies[0].audio.as_deref(), Some(&[0xAA][..]));

        // Second press: the entry is gone, never re-synthesized.
        let replies = on_button(&mut session, &gateway, "qna_tts_10").await.unwrap();
        assert_eq!(replies, vec![Reply::text(prompts::CACHE_MISS)]);
    }

    #[tokio::test]
    async fn failed_synthesis_keeps_the_entry_for_retry() {
        let mut session = session();
        session.cache.insert(10, "42".to_string());
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_synthesize()
            .returning(|_| Err(GatewayError::EmptyResponse));

        let replies = on_button(&mut session, &gateway, "qna_tts_10").await.unwrap();
        assert_eq!(replies, vec![Reply::text(prompts::SYNTHESIS_FAILED)]);
        assert_eq!(session.cache.get(10).as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn end_action_returns_to_idle() {
        let mut session = session();
        let gateway = MockProviderGateway::new();

        let replies = on_button(&mut session, &gateway, "qna_end").await.unwrap();
        assert!(!replies.is_empty());
        assert_eq!(session.flow.kind(), FlowKind::Idle);
    }

    #[tokio::test]
    async fn unknown_sub_action_is_rejected() {
        let mut session = session();
        let gateway = MockProviderGateway::new();

        let err = on_button(&mut session, &gateway, "qna_bogus").await.unwrap_err();
        assert_eq!(err, EngineError::UnknownAction("qna_bogus".to_string()));
        let err = on_button(&mut session, &gateway, "qna_tts_oops").await.unwrap_err();
        assert_eq!(err, EngineError::UnknownAction("qna_tts_oops".to_string()));
    }
}
