//! Spark: backend relay for an AI-assisted personal scheduler.
//!
//! The relay exposes two JSON endpoints to the Spark client:
//!
//! - **Task analysis**: asks a language model for three time slots to do a
//!   task, falling back to deterministic slots when the model is unusable.
//! - **Monthly report**: aggregates completed tasks per role, ranks the most
//!   frequent description keywords, and asks the model for a narrative.
//!
//! # Architecture
//!
//! - [`planner`]: pure local logic (aggregation, ranking, fallback, parsing)
//! - [`llm`]: the [`CompletionProvider`](llm::CompletionProvider) capability
//!   and its Anthropic Messages API implementation
//! - [`service`]: per-request orchestration
//! - [`server`]: axum router and listener
//! - [`config`]: TOML plus environment configuration

pub mod config;
pub mod error;
pub mod llm;
pub mod planner;
pub mod server;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::SparkConfig;
pub use error::{Result, SparkError};
pub use server::{RelayServer, router, serve};
pub use service::{RelayService, ServiceSettings};
