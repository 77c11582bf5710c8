//! Core library for the weather chatbot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather adapter behind the `WeatherProvider` trait
//! - The `get_weather` function declaration sent to chat backends
//! - A chat-completions client and the single-round tool-calling orchestrator
//! - Session history with a bounded context window
//!
//! It is used by `weather-cli` and `weather-mcp`.

pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testutils;

pub use config::Config;
pub use error::{BackendError, WeatherError};
pub use llm::{ChatBackend, ChatMessage, HttpChatBackend, ToolCall};
pub use model::{WeatherReading, WeatherSummary};
pub use orchestrator::Orchestrator;
pub use provider::{WeatherProvider, provider_from_config};
pub use session::Session;
pub use tools::{ToolSchema, describe_tools};
