//! Core logic including the conversation loop, tool registry and the
//! backend abstraction.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod backend;
pub mod conversation;
mod error;
mod model_client;
mod orchestrator;
pub mod tool;

pub use backend::{ChatBackend, ChatRequest, ChatResponse, ChatUpdate};
pub use error::{BackendError, Error};
pub use orchestrator::{FALLBACK_RESPONSE, Orchestrator, OrchestratorBuilder};

/// Re-exports of the cancellation primitive used across the crate.
pub use tokio_util::sync::CancellationToken;
