//! # Voyager TUI
//!
//! A terminal client for poking at GraphQL, HTTP and WebSocket endpoints.
//!
//! ## Features
//! - GraphQL queries with JSON variables and custom headers
//! - Schema explorer built from an introspection query
//! - Plain HTTP requests with any common method
//! - A WebSocket session with a timestamped message log
//! - Per-tab TLS verification toggle
//! - Last-used settings restored on start
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod cli;
pub mod clipboard;
pub mod constants;
pub mod error;
pub mod introspection;
pub mod logging;
pub mod messages;
pub mod models;
pub mod network;
pub mod parsing;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use error::{Error, Result};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{GraphQlPayload, HeaderSet, HttpMethod, ResponseEnvelope};
pub use network::{NetworkActor, RequestExecutor};
