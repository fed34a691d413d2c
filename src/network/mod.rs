//! Network layer - HTTP request execution and the WebSocket session
//!
//! The Network actor receives commands from the App layer and sends back
//! responses and session events.

pub mod actor;
pub mod client;
pub mod transport;
pub mod websocket;

pub use actor::NetworkActor;
pub use client::RequestExecutor;
pub use transport::{BlockingTransport, HttpTransport, ReqwestTransport};
pub use websocket::{TungsteniteConnector, WsConnector, WsSession};
