//! Personality Talk Flow
//!
//! Role-play dialogue with a catalog personality. Choosing a personality
//! seeds the conversation history with its system prompt; every exchange
//! appends a user and an assistant turn, trimmed to the session's bound.

use crate::catalog::Catalog;
use crate::event::{Action, EngineError, Reply};
use crate::gateway::{ChatTurn, ProviderGateway};
use crate::prompts;
use crate::session::{FlowState, Session, TalkStage, push_trimmed};
use tracing::{info, warn};

pub(crate) const PREFIX: &str = "talk_";
const CHOOSE_PREFIX: &str = "talk_choose_";
const ACTION_END: &str = "talk_end";

pub fn start(session: &mut Session, catalog: &Catalog) -> Vec<Reply> {
    session.flow = FlowState::Talk {
        stage: TalkStage::ChoosingPerson,
        personality: None,
        history: Vec::new(),
    };

    let actions = catalog
        .personalities()
        .iter()
        .map(|person| {
            Action::new(
                format!("{} {}", person.glyph, person.name),
                format!("{CHOOSE_PREFIX}{}", person.key),
            )
        })
        .collect();

    vec![Reply::with_actions(
        "🎭 Talk to a famous personality\n\nChoose who you want to speak with:",
        actions,
    )]
}

fn end_action() -> Action {
    Action::new("❌ End the conversation", ACTION_END)
}

pub async fn on_button(
    session: &mut Session,
    catalog: &Catalog,
    payload: &str,
) -> Result<Vec<Reply>, EngineError> {
    if let Some(key) = payload.strip_prefix(CHOOSE_PREFIX) {
        return Ok(choose_person(session, catalog, key));
    }

    match payload {
        ACTION_END => Ok(end(session)),
        _ => Err(EngineError::UnknownAction(payload.to_string())),
    }
}

fn choose_person(session: &mut Session, catalog: &Catalog, key: &str) -> Vec<Reply> {
    let Some(person) = catalog.personality(key) else {
        warn!(key, "personality selection did not match the catalog");
        session.end_flow();
        return vec![Reply::text(
            "❌ Invalid selection. Use /talk to start again.",
        )];
    };

    info!(personality = person.key, "personality chosen");
    session.flow = FlowState::Talk {
        stage: TalkStage::Talking,
        personality: Some(person.clone()),
        history: vec![ChatTurn::system(person.prompt)],
    };

    vec![Reply::with_actions(
        format!(
            "{} You are now talking to {}!\n\nAsk anything or just chat — \
             the answers will stay in character.",
            person.glyph, person.name
        ),
        vec![end_action()],
    )]
}

pub async fn on_text(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    text: &str,
) -> Vec<Reply> {
    let max_turns = session.limits.history_max_turns;
    let (person, mut history) = match &session.flow {
        FlowState::Talk {
            stage: TalkStage::Talking,
            personality: Some(person),
            history,
        } => (person.clone(), history.clone()),
        FlowState::Talk {
            stage: TalkStage::ChoosingPerson,
            ..
        } => {
            return vec![Reply::text(
                "Pick a personality first — choose one of the options above.",
            )];
        }
        _ => {
            session.end_flow();
            return vec![Reply::text(
                "❌ No personality selected. Start again with /talk.",
            )];
        }
    };

    push_trimmed(&mut history, ChatTurn::user(text), max_turns);

    let replies = match gateway.generate_with_history(&history).await {
        Ok(answer) => {
            push_trimmed(&mut history, ChatTurn::assistant(answer.clone()), max_turns);
            vec![Reply::with_actions(
                format!("{} {answer}", person.glyph),
                vec![end_action()],
            )]
        }
        Err(error) => {
            warn!(%error, personality = person.key, "dialogue generation failed");
            vec![Reply::with_actions(prompts::APOLOGY, vec![end_action()])]
        }
    };

    if let FlowState::Talk { history: stored, .. } = &mut session.flow {
        *stored = history;
    }
    replies
}

fn end(session: &mut Session) -> Vec<Reply> {
    let person = match &session.flow {
        FlowState::Talk {
            personality: Some(person),
            ..
        } => Some(format!("{} {}", person.glyph, person.name)),
        _ => None,
    };
    session.end_flow();

    let text = match person {
        Some(person) => format!(
            "👋 Your conversation with {person} is over!\n\n\
             Use /talk to start a new one or /start for the main menu."
        ),
        None => "Conversation finished! Use /start for the main menu.".to_string(),
    };
    vec![Reply::text(text)]
}
