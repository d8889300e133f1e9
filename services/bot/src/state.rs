//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the conversation
//! engine and the loaded configuration shared by all handlers.

use crate::config::Config;
use parley_core::Engine;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: Arc<Config>,
}
