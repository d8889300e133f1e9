//! Translate Flow
//!
//! Text and voice translation into a chosen catalog language. Translations
//! are cached under the inbound message id for deferred synthesis, same
//! contract as the Q&A flow.
//!
//! All payloads use the `translate_` prefix, language choice included.

use super::synthesize_cached;
use crate::catalog::Catalog;
use crate::event::{Action, EngineError, Reply};
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::session::{FlowState, Session, TranslateStage};
use tracing::{info, warn};

pub(crate) const PREFIX: &str = "translate_";
const LANG_PREFIX: &str = "translate_lang_";
const TTS_PREFIX: &str = "translate_tts_";
const ACTION_MORE: &str = "translate_more";
const ACTION_CHANGE: &str = "translate_change_lang";
const ACTION_END: &str = "translate_end";

pub fn start(session: &mut Session, catalog: &Catalog) -> Vec<Reply> {
    session.flow = FlowState::Translate {
        stage: TranslateStage::ChoosingLanguage,
        language: None,
    };

    vec![Reply::with_actions(
        "🌍 Translator\n\nPick the language to translate into:",
        language_actions(catalog),
    )]
}

fn language_actions(catalog: &Catalog) -> Vec<Action> {
    catalog
        .languages()
        .iter()
        .map(|language| {
            Action::new(
                format!("{} {}", language.glyph, language.name),
                format!("{LANG_PREFIX}{}", language.key),
            )
        })
        .collect()
}

fn translation_actions(message_id: u64) -> Vec<Action> {
    vec![
        Action::new(
            "🔊 Voice the translation",
            format!("{TTS_PREFIX}{message_id}"),
        ),
        Action::new("🔄 Another translation", ACTION_MORE),
        Action::new("🌐 Change language", ACTION_CHANGE),
        Action::new("❌ Finish", ACTION_END),
    ]
}

pub async fn on_button(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    catalog: &Catalog,
    payload: &str,
) -> Result<Vec<Reply>, EngineError> {
    if let Some(key) = payload.strip_prefix(LANG_PREFIX) {
        return Ok(choose_language(session, catalog, key));
    }
    if let Some(raw_key) = payload.strip_prefix(TTS_PREFIX) {
        let Ok(key) = raw_key.parse::<u64>() else {
            return Err(EngineError::UnknownAction(payload.to_string()));
        };
        return Ok(synthesize_cached(session, gateway, key).await);
    }

    match payload {
        ACTION_MORE => Ok(vec![Reply::text(
            "📝 Send text or a voice message to translate:",
        )]),
        ACTION_CHANGE => Ok(change_language(session, catalog)),
        ACTION_END => {
            session.end_flow();
            Ok(vec![Reply::text(
                "👋 Thanks for using the translator!\n\nUse /start for the main menu.",
            )])
        }
        _ => Err(EngineError::UnknownAction(payload.to_string())),
    }
}

fn choose_language(session: &mut Session, catalog: &Catalog, key: &str) -> Vec<Reply> {
    let Some(language) = catalog.language(key) else {
        warn!(key, "language selection did not match the catalog");
        session.end_flow();
        return vec![Reply::text(
            "❌ Invalid language selection. Use /translate to start again.",
        )];
    };

    info!(language = language.key, "target language chosen");
    session.flow = FlowState::Translate {
        stage: TranslateStage::Translating,
        language: Some(language.clone()),
    };

    vec![Reply::text(format!(
        "✅ Language selected: {}\n\n📝 Now send text or a 🎤 voice message to translate:",
        language.name
    ))]
}

fn change_language(session: &mut Session, catalog: &Catalog) -> Vec<Reply> {
    // Only the language selection is dropped; nothing else is cleared.
    if let FlowState::Translate { stage, language } = &mut session.flow {
        *stage = TranslateStage::ChoosingLanguage;
        *language = None;
    }

    vec![Reply::with_actions(
        "🌍 Pick the language to translate into:",
        language_actions(catalog),
    )]
}

pub async fn on_text(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    message_id: u64,
    text: &str,
) -> Vec<Reply> {
    let language = match &session.flow {
        FlowState::Translate {
            stage: TranslateStage::Translating,
            language: Some(language),
        } => language.clone(),
        FlowState::Translate {
            stage: TranslateStage::ChoosingLanguage,
            ..
        } => {
            return vec![Reply::text(
                "Pick a target language first — choose one of the options above.",
            )];
        }
        _ => {
            session.end_flow();
            return vec![Reply::text(
                "❌ No language selected. Start again with /translate.",
            )];
        }
    };

    match gateway
        .generate(&prompts::translate(text, language.name), None)
        .await
    {
        Ok(translation) => {
            session.cache.insert(message_id, translation.clone());
            info!(message_id, language = language.key, "translation produced");
            vec![Reply::with_actions(
                format!("🌍 Translation:\n{translation}"),
                translation_actions(message_id),
            )]
        }
        Err(error) => {
            warn!(%error, "translation failed");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, MockProviderGateway};
    use crate::session::{FlowKind, SessionLimits};

    fn translating_session(catalog: &Catalog) -> Session {
        let mut session = Session::new(SessionLimits::default());
        start(&mut session, catalog);
        choose_language(&mut session, catalog, "french");
        session
    }

    #[test]
    fn start_offers_every_language_with_the_uniform_prefix() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(SessionLimits::default());

        let replies = start(&mut session, &catalog);
        assert_eq!(replies[0].actions.len(), catalog.languages().len());
        for action in &replies[0].actions {
            assert!(action.payload.starts_with(LANG_PREFIX));
        }
    }

    #[test]
    fn invalid_language_ends_the_flow() {
        let catalog = Catalog::builtin();
        let mut session = Session::new(SessionLimits::default());
        start(&mut session, &catalog);

        let replies = choose_language(&mut session, &catalog, "latin");
        assert!(replies[0].text.contains("Invalid language selection"));
        assert_eq!(session.flow.kind(), FlowKind::Idle);
    }

    #[tokio::test]
    async fn text_is_translated_and_cached() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_generate()
            .withf(|prompt, _| prompt.contains("French") && prompt.contains("good morning"))
            .times(1)
            .returning(|_, _| Ok("bonjour".to_string()));

        let replies = on_text(&mut session, &gateway, 21, "good morning").await;
        assert!(replies[0].text.contains("bonjour"));
        assert_eq!(replies[0].actions.len(), 4);
        assert_eq!(session.cache.get(21).as_deref(), Some("bonjour"));
    }

    #[tokio::test]
    async fn failed_transcription_makes_no_translation_call() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_transcribe()
            .returning(|_| Err(GatewayError::EmptyResponse));
        gateway.expect_generate().times(0);

        let replies = on_voice(&mut session, &gateway, 22, vec![1, 2]).await;
        assert_eq!(replies, vec![Reply::text(prompts::TRANSCRIPTION_FAILED)]);
        assert!(matches!(
            session.flow,
            FlowState::Translate {
                stage: TranslateStage::Translating,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn voice_translation_runs_the_full_pipeline() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_transcribe()
            .returning(|_| Ok("good evening".to_string()));
        gateway
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("bonsoir".to_string()));

        let replies = on_voice(&mut session, &gateway, 23, vec![9]).await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("good evening"));
        assert!(replies[1].text.contains("bonsoir"));
    }

    #[tokio::test]
    async fn synthesize_follows_the_consume_once_contract() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        session.cache.insert(21, "bonjour".to_string());
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(vec![0xBB]));

        let replies = on_button(&mut session, &gateway, &catalog, "translate_tts_21")
            .await
            .unwrap();
        assert_eq!(replies[0].audio.as_deref(), Some(&[0xBB][..]));

        let replies = on_button(&mut session, &gateway, &catalog, "translate_tts_21")
            .await
            .unwrap();
        assert_eq!(replies, vec![Reply::text(prompts::CACHE_MISS)]);
    }

    #[tokio::test]
    async fn change_language_returns_to_choosing_only() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        session.cache.insert(21, "bonjour".to_string());
        let gateway = MockProviderGateway::new();

        let replies = on_button(&mut session, &gateway, &catalog, "translate_change_lang")
            .await
            .unwrap();
        assert!(matches!(
            session.flow,
            FlowState::Translate {
                stage: TranslateStage::ChoosingLanguage,
                language: None,
            }
        ));
        // Pending synthesis entries survive a language change.
        assert_eq!(session.cache.get(21).as_deref(), Some("bonjour"));
        assert_eq!(replies[0].actions.len(), catalog.languages().len());
    }

    #[tokio::test]
    async fn end_action_returns_to_idle() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        let gateway = MockProviderGateway::new();

        on_button(&mut session, &gateway, &catalog, "translate_end")
            .await
            .unwrap();
        assert_eq!(session.flow.kind(), FlowKind::Idle);
    }

    #[tokio::test]
    async fn unknown_sub_action_is_rejected() {
        let catalog = Catalog::builtin();
        let mut session = translating_session(&catalog);
        let gateway = MockProviderGateway::new();

        let err = on_button(&mut session, &gateway, &catalog, "translate_nope")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownAction("translate_nope".to_string())
        );
    }
}
