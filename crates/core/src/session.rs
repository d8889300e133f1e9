//! Per-User Session State
//!
//! A `Session` is the only state the assistant keeps for a user: which flow
//! is active, where in that flow the user is, and the short-lived cache of
//! responses awaiting deferred speech synthesis. Everything is in-memory and
//! lost on restart by design.
//!
//! The flow state is a tagged union with one variant per flow so each
//! variant carries only the fields that flow needs; a stage can never dangle
//! after its flow has ended.

use crate::catalog::{Language, Personality, QuizTheme};
use crate::gateway::{ChatRole, ChatTurn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkStage {
    ChoosingPerson,
    Talking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStage {
    ChoosingTheme,
    Answering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateStage {
    ChoosingLanguage,
    Translating,
}

/// Which flow a session is in, with that flow's state inline.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    /// Free-form Q&A; its single stage is "awaiting a question".
    Qna,
    Talk {
        stage: TalkStage,
        personality: Option<Personality>,
        history: Vec<ChatTurn>,
    },
    Quiz {
        stage: QuizStage,
        theme: Option<QuizTheme>,
        score: u32,
        total: u32,
        current_question: Option<String>,
    },
    Translate {
        stage: TranslateStage,
        language: Option<Language>,
    },
}

/// Flow discriminant, used for routing without borrowing the flow fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Idle,
    Qna,
    Talk,
    Quiz,
    Translate,
}

impl FlowState {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowState::Idle => FlowKind::Idle,
            FlowState::Qna => FlowKind::Qna,
            FlowState::Talk { .. } => FlowKind::Talk,
            FlowState::Quiz { .. } => FlowKind::Quiz,
            FlowState::Translate { .. } => FlowKind::Translate,
        }
    }
}

/// Bounds on per-session growth: talk history and the deferred-synthesis
/// cache are both capped so a long-lived session cannot grow without limit.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Max turns of talk history, system turn included.
    pub history_max_turns: usize,
    /// Max live entries in the deferred-synthesis cache.
    pub cache_max_entries: usize,
    /// How long an unconsumed cache entry stays synthesizable.
    pub cache_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            history_max_turns: 64,
            cache_max_entries: 32,
            cache_ttl: Duration::from_secs(600),
        }
    }
}

/// Short-lived map from an inbound message id to the full response text it
/// produced, so speech synthesis can be deferred until the user asks for it.
///
/// Entries are removed on successful synthesis and evicted by TTL and by an
/// entry cap (oldest first).
#[derive(Debug)]
pub struct ResponseCache {
    entries: Vec<CacheEntry>,
    max_entries: usize,
    ttl: Duration,
}

#[derive(Debug)]
struct CacheEntry {
    key: u64,
    text: String,
    inserted_at: Instant,
}

impl ResponseCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            ttl,
        }
    }

    pub fn insert(&mut self, key: u64, text: String) {
        self.evict_expired();
        self.entries.retain(|entry| entry.key != key);
        while self.entries.len() >= self.max_entries.max(1) {
            self.entries.remove(0);
        }
        self.entries.push(CacheEntry {
            key,
            text,
            inserted_at: Instant::now(),
        });
    }

    /// Looks up an entry without consuming it; the caller removes it once
    /// the synthesized audio has actually been delivered.
    pub fn get(&mut self, key: u64) -> Option<String> {
        self.evict_expired();
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.text.clone())
    }

    pub fn remove(&mut self, key: u64) {
        self.entries.retain(|entry| entry.key != key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|entry| entry.inserted_at.elapsed() < ttl);
    }
}

/// All state kept for one user.
#[derive(Debug)]
pub struct Session {
    pub flow: FlowState,
    pub cache: ResponseCache,
    pub limits: SessionLimits,
}

impl Session {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            flow: FlowState::Idle,
            cache: ResponseCache::new(limits.cache_max_entries, limits.cache_ttl),
            limits,
        }
    }

    /// Ends whatever flow is active. Cache entries are left to expire on
    /// their own so a "voice this" press can still work right after ending.
    pub fn end_flow(&mut self) {
        self.flow = FlowState::Idle;
    }
}

/// Appends a turn, dropping the oldest non-system turns once the bound is
/// exceeded so the personality's seeding system prompt always survives.
pub fn push_trimmed(history: &mut Vec<ChatTurn>, turn: ChatTurn, max_turns: usize) {
    history.push(turn);
    while history.len() > max_turns.max(2) {
        let oldest = usize::from(
            history
                .first()
                .is_some_and(|turn| turn.role == ChatRole::System),
        );
        history.remove(oldest);
    }
}

/// Hands out one shared, lockable `Session` per user id.
///
/// The engine holds a session's lock for the entire handling of one event,
/// which serializes handling per session: duplicate button presses and
/// out-of-order events for the same user can never mutate the session
/// concurrently.
pub struct SessionStore {
    sessions: Mutex<HashMap<u64, Arc<Mutex<Session>>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limits,
        }
    }

    pub async fn get_or_create(&self, user_id: u64) -> Arc<Mutex<Session>> {
        self.sessions
            .lock()
            .await
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.limits))))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize, ttl: Duration) -> ResponseCache {
        ResponseCache::new(max_entries, ttl)
    }

    #[test]
    fn cache_get_does_not_consume_remove_does() {
        let mut cache = cache(8, Duration::from_secs(60));
        cache.insert(1, "bonjour".to_string());

        assert_eq!(cache.get(1).as_deref(), Some("bonjour"));
        assert_eq!(cache.get(1).as_deref(), Some("bonjour"));

        cache.remove(1);
        assert_eq!(cache.get(1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_expired_entries_are_gone() {
        let mut cache = cache(8, Duration::ZERO);
        cache.insert(1, "gone".to_string());
        assert_eq!(cache.get(1), None);
    }

    #[test]
    fn cache_cap_evicts_oldest_first() {
        let mut cache = cache(2, Duration::from_secs(60));
        cache.insert(1, "a".to_string());
        cache.insert(2, "b".to_string());
        cache.insert(3, "c".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.get(2).as_deref(), Some("b"));
        assert_eq!(cache.get(3).as_deref(), Some("c"));
    }

    #[test]
    fn cache_reinsert_replaces_same_key() {
        let mut cache = cache(8, Duration::from_secs(60));
        cache.insert(1, "old".to_string());
        cache.insert(1, "new".to_string());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).as_deref(), Some("new"));
    }

    #[test]
    fn history_trim_keeps_the_system_turn() {
        let mut history = vec![ChatTurn::system("seed")];
        for i in 0..10 {
            push_trimmed(&mut history, ChatTurn::user(format!("u{i}")), 4);
            push_trimmed(&mut history, ChatTurn::assistant(format!("a{i}")), 4);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], ChatTurn::system("seed"));
        assert_eq!(history.last().unwrap(), &ChatTurn::assistant("a9"));
    }

    #[test]
    fn end_flow_always_returns_to_idle() {
        let mut session = Session::new(SessionLimits::default());
        session.flow = FlowState::Quiz {
            stage: QuizStage::Answering,
            theme: None,
            score: 2,
            total: 3,
            current_question: Some("?".to_string()),
        };
        session.end_flow();
        assert_eq!(session.flow.kind(), FlowKind::Idle);
        assert_eq!(session.flow, FlowState::Idle);
    }

    #[tokio::test]
    async fn store_returns_the_same_session_per_user() {
        let store = SessionStore::new(SessionLimits::default());
        let first = store.get_or_create(7).await;
        first.lock().await.flow = FlowState::Qna;

        let second = store.get_or_create(7).await;
        assert_eq!(second.lock().await.flow.kind(), FlowKind::Qna);

        let other = store.get_or_create(8).await;
        assert_eq!(other.lock().await.flow.kind(), FlowKind::Idle);
    }
}
