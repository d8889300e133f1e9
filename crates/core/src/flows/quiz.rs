//! Quiz Flow
//!
//! Theme choice, generated questions, and free-text answers judged by the
//! provider. The verdict is classified purely by a case-insensitive check
//! that it starts with "correct"; that prefix contract is load-bearing and
//! covered by tests.

use crate::catalog::Catalog;
use crate::event::{Action, EngineError, Reply};
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::session::{FlowState, QuizStage, Session};
use tracing::{info, warn};

pub(crate) const PREFIX: &str = "quiz_";
const THEME_PREFIX: &str = "quiz_theme_";
const ACTION_MORE: &str = "quiz_more";
const ACTION_CHANGE: &str = "quiz_change_theme";
const ACTION_END: &str = "quiz_end";

pub fn start(session: &mut Session, catalog: &Catalog) -> Vec<Reply> {
    session.flow = FlowState::Quiz {
        stage: QuizStage::ChoosingTheme,
        theme: None,
        score: 0,
        total: 0,
        current_question: None,
    };

    vec![Reply::with_actions(
        "🎮 Quiz time!\n\nPick a topic for your questions:",
        theme_actions(catalog),
    )]
}

fn theme_actions(catalog: &Catalog) -> Vec<Action> {
    catalog
        .themes()
        .iter()
        .map(|theme| {
            Action::new(
                format!("{} {}", theme.glyph, theme.name),
                format!("{THEME_PREFIX}{}", theme.key),
            )
        })
        .collect()
}

fn answer_actions() -> Vec<Action> {
    vec![
        Action::new("➕ Another question", ACTION_MORE),
        Action::new("🔄 Change topic", ACTION_CHANGE),
        Action::new("❌ Finish the quiz", ACTION_END),
    ]
}

/// The verdict contract: correct iff the lowercased verdict starts with
/// "correct". "Incorrect ..." fails the check because of its prefix, and any
/// unexpected verdict counts as incorrect.
pub(crate) fn verdict_is_correct(verdict: &str) -> bool {
    verdict.to_lowercase().starts_with("correct")
}

pub async fn on_button(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    catalog: &Catalog,
    payload: &str,
) -> Result<Vec<Reply>, EngineError> {
    if let Some(key) = payload.strip_prefix(THEME_PREFIX) {
        return Ok(choose_theme(session, gateway, catalog, key).await);
    }

    match payload {
        ACTION_MORE => Ok(ask(session, gateway).await),
        ACTION_CHANGE => Ok(change_theme(session, catalog)),
        ACTION_END => Ok(end(session)),
        _ => Err(EngineError::UnknownAction(payload.to_string())),
    }
}

async fn choose_theme(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    catalog: &Catalog,
    key: &str,
) -> Vec<Reply> {
    let Some(theme) = catalog.theme(key) else {
        warn!(key, "theme selection did not match the catalog");
        session.end_flow();
        return vec![Reply::text(
            "❌ Invalid topic selection. Use /quiz to start again.",
        )];
    };

    info!(theme = theme.key, "quiz theme chosen");
    if let FlowState::Quiz { theme: stored, .. } = &mut session.flow {
        *stored = Some(theme.clone());
    }
    ask(session, gateway).await
}

/// Generates and presents the next question for the stored theme. The stage
/// only advances to `Answering` once a question actually exists, so a
/// provider failure leaves the user free to retry.
async fn ask(session: &mut Session, gateway: &dyn ProviderGateway) -> Vec<Reply> {
    let (theme, score, total) = match &session.flow {
        FlowState::Quiz {
            theme: Some(theme),
            score,
            total,
            ..
        } => (theme.clone(), *score, *total),
        _ => {
            session.end_flow();
            return vec![Reply::text("❌ Quiz error. Start again with /quiz.")];
        }
    };

    let question = match gateway.generate(&prompts::quiz_question(theme.name), None).await {
        Ok(question) => question,
        Err(error) => {
            warn!(%error, theme = theme.key, "question generation failed");
            return vec![Reply::text(prompts::APOLOGY)];
        }
    };

    if let FlowState::Quiz {
        stage,
        current_question,
        ..
    } = &mut session.flow
    {
        *stage = QuizStage::Answering;
        *current_question = Some(question.clone());
    }

    vec![Reply::text(format!(
        "{} Topic: {}\n📊 Score: {score}/{total}\n\n❓ Question:\n{question}\n\nType your answer:",
        theme.glyph, theme.name
    ))]
}

pub async fn on_answer(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    answer: &str,
) -> Vec<Reply> {
    let question = match &session.flow {
        FlowState::Quiz {
            stage: QuizStage::Answering,
            theme: Some(_),
            current_question: Some(question),
            ..
        } => question.clone(),
        FlowState::Quiz {
            stage: QuizStage::ChoosingTheme,
            ..
        } => {
            return vec![Reply::text(
                "Pick a topic first — choose one of the options above.",
            )];
        }
        _ => {
            session.end_flow();
            return vec![Reply::text("❌ Quiz error. Start again with /quiz.")];
        }
    };

    let verdict = match gateway
        .generate(&prompts::quiz_check(&question, answer), None)
        .await
    {
        Ok(verdict) => verdict,
        Err(error) => {
            warn!(%error, "answer check failed");
            return vec![Reply::text(prompts::APOLOGY)];
        }
    };

    let correct = verdict_is_correct(&verdict);
    let (score, total) = match &mut session.flow {
        FlowState::Quiz { score, total, .. } => {
            *total += 1;
            if correct {
                *score += 1;
            }
            (*score, *total)
        }
        _ => (0, 0),
    };
    info!(correct, score, total, "quiz answer judged");

    let marker = if correct { "✅" } else { "❌" };
    vec![Reply::with_actions(
        format!("{marker} {verdict}\n\n📊 Current score: {score}/{total}"),
        answer_actions(),
    )]
}

fn change_theme(session: &mut Session, catalog: &Catalog) -> Vec<Reply> {
    let (score, total) = match &mut session.flow {
        FlowState::Quiz {
            stage,
            current_question,
            score,
            total,
            ..
        } => {
            *stage = QuizStage::ChoosingTheme;
            *current_question = None;
            (*score, *total)
        }
        _ => {
            session.end_flow();
            return vec![Reply::text("❌ Quiz error. Start again with /quiz.")];
        }
    };

    vec![Reply::with_actions(
        format!("📊 Current score: {score}/{total}\n\nPick a new topic:"),
        theme_actions(catalog),
    )]
}

fn end(session: &mut Session) -> Vec<Reply> {
    let (score, total) = match &session.flow {
        FlowState::Quiz { score, total, .. } => (*score, *total),
        _ => (0, 0),
    };
    session.end_flow();
    info!(score, total, "quiz finished");

    let text = if total > 0 {
        let percentage = score as f64 / total as f64 * 100.0;
        format!(
            "🎮 Quiz finished!\n\n📊 Final score: {score}/{total} ({percentage:.1}%)\n\n\
             Use /quiz to play again or /start for the main menu."
        )
    } else {
        "🎮 Quiz finished!\n\nUse /quiz to play or /start for the main menu.".to_string()
    };
    vec![Reply::text(text)]
}
