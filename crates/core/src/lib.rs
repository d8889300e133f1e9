//! Parley Core
//!
//! The conversation engine behind the Parley assistant: the provider gateway
//! abstraction over the external text-generation/speech services, the static
//! catalogs, the per-user session store, the four guided flows (Q&A,
//! personality talk, quiz, translate), and the dispatch engine that routes
//! inbound events to them. Transport and presentation live in the service
//! crate; this crate only returns presentation-agnostic replies.

pub mod catalog;
pub mod engine;
pub mod event;
pub mod flows;
pub mod gateway;
pub mod prompts;
pub mod session;

pub use catalog::Catalog;
pub use engine::Engine;
pub use event::{Action, Command, EngineError, Event, Reply};
pub use gateway::{ChatRole, ChatTurn, GatewayError, OpenAiGateway, ProviderGateway};
pub use session::{FlowKind, FlowState, Session, SessionLimits, SessionStore};
