//! # Chat Stream Bridge
//!
//! A streaming protocol bridge that lets a chat UI speaking the UI message
//! stream protocol talk to Azure OpenAI chat completions.
//!
//! ## Overview
//!
//! The bridge translates between:
//! - **UI messages** - multi-part conversation messages posted by the client
//! - **Azure OpenAI chat completions** - streamed SSE deltas or one JSON document
//!
//! Whatever shape the provider answers in, the client receives the same
//! gap-free event sequence:
//!
//! ```text
//! start, start-step, text-start, text-delta*, text-end, finish-step, finish, [DONE]
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_stream_bridge::config::BridgeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::from_env()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and handling
//! - [`models`] - UI and Azure OpenAI data structures
//! - [`transform`] - Conversation flattening and request building
//! - [`provider`] / [`client`] - Upstream provider abstraction and Azure client
//! - [`streaming`] - Frame decoder, event transcoder and downstream emitter
//! - [`handler`] - axum routes

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod id;
pub mod metrics;
pub mod models;
pub mod observer;
pub mod provider;
pub mod streaming;
pub mod transform;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
