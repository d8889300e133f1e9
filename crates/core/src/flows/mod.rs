//! Flow Controllers
//!
//! Each flow is a small state machine over the session's `FlowState`. A flow
//! handler reads and writes the session, optionally calls the provider
//! gateway, and returns the replies to present. Button payloads are
//! `prefix_action[_key]`; each flow owns exactly one prefix and rejects
//! payloads it does not recognize.

pub mod qna;
pub mod quiz;
pub mod talk;
pub mod translate;

use crate::event::Reply;
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::session::Session;
use tracing::warn;

/// Looks up a cached response and synthesizes it.
///
/// The entry is removed only after the audio was produced, so a failed
/// synthesis can be retried; a second press after success reports a miss
/// instead of re-synthesizing stale content.
pub(crate) async fn synthesize_cached(
    session: &mut Session,
    gateway: &dyn ProviderGateway,
    key: u64,
) -> Vec<Reply> {
    let Some(text) = session.cache.get(key) else {
        return vec![Reply::text(prompts::CACHE_MISS)];
    };

    match gateway.synthesize(&text).await {
        Ok(audio) => {
            session.cache.remove(key);
            vec![Reply::voice(text, audio)]
        }
        Err(error) => {
            warn!(%error, key, "speech synthesis failed");
            vec![Reply::text(prompts::SYNTHESIS_FAILED)]
        }
    }
}
