//! Network messages - communication between App and Network layers

use crate::models::{GraphQlPayload, HeaderSet, HttpMethod, ResponseEnvelope};
use crate::network::websocket::{ConnectParams, SessionEvent};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// POST a GraphQL query (also used for schema introspection)
    ExecuteGraphQl {
        id: u64,
        endpoint: String,
        headers: HeaderSet,
        payload: GraphQlPayload,
        verify_tls: bool,
    },
    /// Plain HTTP request
    ExecuteHttp {
        id: u64,
        endpoint: String,
        method: HttpMethod,
        headers: HeaderSet,
        body: Option<String>,
        verify_tls: bool,
    },

    // WebSocket commands, processed in order by the session task
    WsConnect(ConnectParams),
    WsSend {
        params: ConnectParams,
        message: String,
    },
    WsDisconnect,

    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// Request finished with any HTTP status
    Completed { id: u64, response: ResponseEnvelope },
    /// Request rejected or failed before a response arrived
    Failed { id: u64, message: String },

    /// Log line, status text or state change from the WebSocket session
    WsEvent(SessionEvent),
    /// A connect or send command finished; `ok` is false when it failed
    WsCommandDone { ok: bool },
}

impl NetworkResponse {
    /// Request id, if this answers a request
    pub fn id(&self) -> Option<u64> {
        match self {
            NetworkResponse::Completed { id, .. } | NetworkResponse::Failed { id, .. } => Some(*id),
            NetworkResponse::WsEvent(_) | NetworkResponse::WsCommandDone { .. } => None,
        }
    }
}
