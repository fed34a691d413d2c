//! Network actor - runs HTTP requests and the WebSocket session in Tokio

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::RequestExecutor;
use crate::network::websocket::{ConnectParams, SendOutcome, SessionEvent, WsConnector, WsSession};

/// Work for the WebSocket session task
#[derive(Debug)]
enum WsCommand {
    Connect(ConnectParams),
    Send { params: ConnectParams, message: String },
    Disconnect,
}

/// Network actor that processes request and WebSocket commands
pub struct NetworkActor {
    executor: RequestExecutor,
    connector: Arc<dyn WsConnector>,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(
        executor: RequestExecutor,
        connector: Arc<dyn WsConnector>,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        NetworkActor {
            executor,
            connector,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        let (ws_tx, session_task) = spawn_session(self.connector.clone(), self.response_tx.clone());

        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::ExecuteGraphQl { id, endpoint, headers, payload, verify_tls }) => {
                            let response_tx = self.response_tx.clone();
                            let executor = self.executor.clone();

                            self.active_requests.spawn(async move {
                                let result = executor
                                    .perform_graphql_request(&endpoint, &headers, &payload, verify_tls)
                                    .await;
                                let _ = response_tx.send(to_response(id, result));
                            });
                        }

                        Some(NetworkCommand::ExecuteHttp { id, endpoint, method, headers, body, verify_tls }) => {
                            let response_tx = self.response_tx.clone();
                            let executor = self.executor.clone();

                            self.active_requests.spawn(async move {
                                let result = executor
                                    .perform_http_request(&endpoint, method, &headers, body.as_deref(), verify_tls)
                                    .await;
                                let _ = response_tx.send(to_response(id, result));
                            });
                        }

                        Some(NetworkCommand::WsConnect(params)) => {
                            let _ = ws_tx.send(WsCommand::Connect(params));
                        }

                        Some(NetworkCommand::WsSend { params, message }) => {
                            let _ = ws_tx.send(WsCommand::Send { params, message });
                        }

                        Some(NetworkCommand::WsDisconnect) => {
                            let _ = ws_tx.send(WsCommand::Disconnect);
                        }

                        Some(NetworkCommand::Shutdown) | None => break,
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }

        self.active_requests.abort_all();
        // Closing the queue makes the session task disconnect and exit.
        drop(ws_tx);
        if let Err(e) = session_task.await {
            tracing::debug!(error = %e, "WebSocket session task ended abnormally");
        }
        tracing::info!("Network actor stopped");
    }
}

fn to_response(
    id: u64,
    result: crate::error::Result<crate::models::ResponseEnvelope>,
) -> NetworkResponse {
    match result {
        Ok(response) => NetworkResponse::Completed { id, response },
        Err(e) => NetworkResponse::Failed {
            id,
            message: e.to_string(),
        },
    }
}

/// Start the task owning the session. Commands run strictly one at a time.
fn spawn_session(
    connector: Arc<dyn WsConnector>,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
) -> (mpsc::UnboundedSender<WsCommand>, JoinHandle<()>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut session = WsSession::new(connector, event_tx);
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    tracing::debug!(?cmd, "WebSocket command");
                    let ok = match cmd {
                        WsCommand::Connect(params) => Some(session.connect(&params).await.is_ok()),
                        WsCommand::Send { params, message } => {
                            Some(session.send(&params, &message).await == SendOutcome::Sent)
                        }
                        WsCommand::Disconnect => {
                            session.disconnect().await;
                            None
                        }
                    };
                    // Everything the command logged goes out before its completion.
                    forward_pending(&mut event_rx, &response_tx);
                    if let Some(ok) = ok {
                        let _ = response_tx.send(NetworkResponse::WsCommandDone { ok });
                    }
                }

                Some(event) = event_rx.recv() => {
                    let _ = response_tx.send(NetworkResponse::WsEvent(event));
                }
            }
        }
        session.disconnect().await;
        forward_pending(&mut event_rx, &response_tx);
    });

    (cmd_tx, handle)
}

fn forward_pending(
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    response_tx: &mpsc::UnboundedSender<NetworkResponse>,
) {
    while let Ok(event) = event_rx.try_recv() {
        let _ = response_tx.send(NetworkResponse::WsEvent(event));
    }
}
