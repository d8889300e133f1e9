//! Parley Bot Library Crate
//!
//! This library contains the web front end for the Parley conversation
//! engine: configuration, application state, request/response models, the
//! HTTP handlers, and routing. The `bin/bot.rs` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
