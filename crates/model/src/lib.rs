//! An abstraction layer for the chat models behind the assistant.
//!
//! This crate establishes the protocol the orchestrator uses to talk to a
//! chat-completion provider: the messages that make up a conversation, the
//! tools a model may call, and the streamed events a model responds with.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that provider implementations should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod response;
mod tool;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use response::*;
pub use tool::*;
