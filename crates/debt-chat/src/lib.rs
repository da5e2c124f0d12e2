//! A console assistant answering questions about U.S. public debt.
//!
//! The crate includes a CLI tool for using in the terminal. The session,
//! the tools and the Fiscal Data API client can also be used as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
pub mod console;
pub mod fiscal_data;
mod session;
#[cfg(test)]
mod test_support;
pub mod tools;

pub use config::{Config, ConfigError};
pub use session::{SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`debt_chat_core`] crate.
pub mod core {
    pub use debt_chat_core::*;
}
