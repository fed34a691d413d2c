//! Messages flowing between the UI, App and Network actors.
//!
//! Key presses become `UiEvent`s, the App answers with `RenderState`
//! snapshots and drives the Network actor through `NetworkCommand`s.

pub mod ui_events;
pub mod network;
pub mod render;

pub use ui_events::UiEvent;
pub use network::{NetworkCommand, NetworkResponse};
pub use render::RenderState;
