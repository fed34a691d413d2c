//! Command handlers - business logic for processing UI events

use crate::app::state::{PendingRequest, SchemaNode, WsLogEntry};
use crate::app::AppState;
use crate::clipboard::ClipboardError;
use crate::constants::INTROSPECTION_QUERY;
use crate::introspection::{add_types_to_tree, build_introspection_result};
use crate::messages::ui_events::{AppTab, Field, InputMode};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{GraphQlPayload, GraphQlTabSpec, HeaderSet, HttpTabSpec, ResponseEnvelope, WsTabSpec};
use crate::network::websocket::{ConnectParams, SessionEvent, SessionState};
use crate::parsing::{format_response, parse_headers, parse_json_object};

const TLS_WARNING: &str = "Warning: TLS verification disabled for this request.";

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn switch_tab(&mut self, tab: AppTab) {
        self.active_tab = tab;
        self.input_mode = InputMode::Normal;
    }

    pub fn next_field(&mut self) {
        let count = self.active_tab.fields().len();
        let focus = self.focus_index_mut();
        *focus = (*focus + 1) % count;
    }

    pub fn prev_field(&mut self) {
        let count = self.active_tab.fields().len();
        let focus = self.focus_index_mut();
        *focus = (*focus + count - 1) % count;
    }

    pub fn scroll_up(&mut self) {
        match (self.active_tab, self.focused_field()) {
            (AppTab::Docs, Field::Tree) => self.select_node(self.docs.selected.saturating_sub(1)),
            (AppTab::Docs, _) => self.docs.details_scroll = self.docs.details_scroll.saturating_sub(1),
            (AppTab::GraphQl, _) => self.graphql.scroll = self.graphql.scroll.saturating_sub(1),
            (AppTab::Http, _) => self.http.scroll = self.http.scroll.saturating_sub(1),
            (AppTab::WebSocket, _) => self.ws.scroll = self.ws.scroll.saturating_sub(1),
        }
    }

    pub fn scroll_down(&mut self) {
        match (self.active_tab, self.focused_field()) {
            (AppTab::Docs, Field::Tree) => self.select_node(self.docs.selected + 1),
            (AppTab::Docs, _) => self.docs.details_scroll = self.docs.details_scroll.saturating_add(1),
            (AppTab::GraphQl, _) => self.graphql.scroll = self.graphql.scroll.saturating_add(1),
            (AppTab::Http, _) => self.http.scroll = self.http.scroll.saturating_add(1),
            (AppTab::WebSocket, _) => self.ws.scroll = self.ws.scroll.saturating_add(1),
        }
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if self.current_input_mut().is_some() {
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn enter_char(&mut self, c: char) {
        if let Some(field) = self.current_input_mut() {
            field.insert(c);
        }
    }

    pub fn newline(&mut self) {
        if self.focused_field().is_multiline() {
            self.enter_char('\n');
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(field) = self.current_input_mut() {
            field.backspace();
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(field) = self.current_input_mut() {
            field.left();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(field) = self.current_input_mut() {
            field.right();
        }
    }

    // ========================
    // Toggles
    // ========================

    pub fn toggle_verify_tls(&mut self) {
        match self.active_tab {
            AppTab::GraphQl => self.graphql.verify_tls = !self.graphql.verify_tls,
            AppTab::Http => self.http.verify_tls = !self.http.verify_tls,
            AppTab::WebSocket => self.ws.verify_tls = !self.ws.verify_tls,
            AppTab::Docs => {}
        }
    }

    pub fn cycle_method(&mut self) {
        if !self.http.busy {
            self.http.method = self.http.method.next();
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    // ========================
    // Sending
    // ========================

    /// Send whatever the active tab sends
    pub fn send(&mut self) -> Option<NetworkCommand> {
        self.stop_editing();
        match self.active_tab {
            AppTab::GraphQl => self.graphql_send(),
            AppTab::Docs => self.load_schema(),
            AppTab::Http => self.http_send(),
            AppTab::WebSocket => self.ws_send(),
        }
    }

    pub fn graphql_send(&mut self) -> Option<NetworkCommand> {
        if self.graphql.busy {
            return None;
        }
        let endpoint = self.graphql.endpoint.as_str().trim().to_string();
        let query = self.graphql.query.as_str().trim().to_string();
        if endpoint.is_empty() {
            self.graphql.response = "Please provide an endpoint URL.".to_string();
            return None;
        }
        if query.is_empty() {
            self.graphql.response = "Query is empty. Add a GraphQL query or mutation.".to_string();
            return None;
        }
        let variables = match parse_json_object(self.graphql.variables.as_str()) {
            Ok(variables) => variables,
            Err(e) => {
                self.graphql.response = format!("Variables are not valid JSON:\n{}", e);
                return None;
            }
        };
        let mut headers = match parse_headers(self.graphql.headers.as_str()) {
            Ok(headers) => headers,
            Err(e) => {
                self.graphql.response = e.to_string();
                return None;
            }
        };
        ensure_json_content_type(&mut headers);

        let id = self.next_id();
        let verify_tls = self.graphql.verify_tls;
        self.graphql.busy = true;
        self.graphql.pending = Some(PendingRequest { id, verify_tls });
        self.graphql.response = "Sending request...".to_string();
        self.graphql.status = "Sending request...".to_string();
        self.graphql.scroll = 0;

        Some(NetworkCommand::ExecuteGraphQl {
            id,
            endpoint,
            headers,
            payload: GraphQlPayload { query, variables },
            verify_tls,
        })
    }

    pub fn http_send(&mut self) -> Option<NetworkCommand> {
        if self.http.busy {
            return None;
        }
        let endpoint = self.http.url.as_str().trim().to_string();
        if endpoint.is_empty() {
            self.http.response = "Please provide a URL.".to_string();
            return None;
        }
        let headers = match parse_headers(self.http.headers.as_str()) {
            Ok(headers) => headers,
            Err(e) => {
                self.http.response = e.to_string();
                return None;
            }
        };
        let method = self.http.method;
        let body = Some(self.http.body.as_str().to_string()).filter(|b| !b.is_empty());

        let id = self.next_id();
        let verify_tls = self.http.verify_tls;
        self.http.busy = true;
        self.http.pending = Some(PendingRequest { id, verify_tls });
        self.http.response = "Sending request...".to_string();
        self.http.status = "Sending request...".to_string();
        self.http.scroll = 0;

        Some(NetworkCommand::ExecuteHttp {
            id,
            endpoint,
            method,
            headers,
            body,
            verify_tls,
        })
    }

    /// Introspect the GraphQL tab's endpoint for the Docs tab
    pub fn load_schema(&mut self) -> Option<NetworkCommand> {
        if self.docs.busy {
            return None;
        }
        let endpoint = self.graphql.endpoint.as_str().trim().to_string();
        if endpoint.is_empty() {
            self.docs.status = "Please provide an endpoint.".to_string();
            return None;
        }
        let mut headers = match parse_headers(self.graphql.headers.as_str()) {
            Ok(headers) => headers,
            Err(e) => {
                self.docs.status = e.to_string();
                return None;
            }
        };
        ensure_json_content_type(&mut headers);

        let id = self.next_id();
        let verify_tls = self.graphql.verify_tls;
        self.docs.busy = true;
        self.docs.pending = Some(PendingRequest { id, verify_tls });
        self.docs.details = format!("Loading schema from {} ...", endpoint);
        self.docs.status = format!("Loading schema from {} ...", endpoint);

        Some(NetworkCommand::ExecuteGraphQl {
            id,
            endpoint,
            headers,
            payload: GraphQlPayload::new(INTROSPECTION_QUERY),
            verify_tls,
        })
    }

    // ========================
    // WebSocket commands
    // ========================

    fn ws_params(&mut self) -> Option<ConnectParams> {
        let url = self.ws.url.as_str().trim().to_string();
        if url.is_empty() {
            self.ws.status = "Please provide an endpoint.".to_string();
            return None;
        }
        match parse_headers(self.ws.headers.as_str()) {
            Ok(headers) => Some(ConnectParams {
                url,
                headers,
                verify_tls: self.ws.verify_tls,
            }),
            Err(e) => {
                self.ws.status = e.to_string();
                None
            }
        }
    }

    pub fn ws_connect(&mut self) -> Option<NetworkCommand> {
        if self.ws.busy {
            return None;
        }
        let params = self.ws_params()?;
        self.ws.busy = true;
        self.ws.status = "Working...".to_string();
        Some(NetworkCommand::WsConnect(params))
    }

    pub fn ws_send(&mut self) -> Option<NetworkCommand> {
        if self.ws.busy {
            return None;
        }
        let params = self.ws_params()?;
        let message = self.ws.message.as_str().to_string();
        self.ws.busy = true;
        self.ws.status = "Working...".to_string();
        Some(NetworkCommand::WsSend { params, message })
    }

    pub fn ws_disconnect(&mut self) -> Option<NetworkCommand> {
        Some(NetworkCommand::WsDisconnect)
    }

    // ========================
    // Clear / copy
    // ========================

    pub fn clear(&mut self) {
        match self.active_tab {
            AppTab::GraphQl => {
                self.graphql.response.clear();
                self.graphql.scroll = 0;
            }
            AppTab::Http => {
                self.http.response.clear();
                self.http.scroll = 0;
            }
            AppTab::Docs => {
                self.docs.tree = SchemaNode::default();
                self.docs.selected = 0;
                self.docs.details.clear();
                self.docs.details_scroll = 0;
                self.docs.status = "Cleared.".to_string();
            }
            AppTab::WebSocket => {
                self.ws.log.clear();
                self.ws.scroll = 0;
                self.ws.status = "Cleared.".to_string();
            }
        }
    }

    /// Text the active tab would copy. Blank text sets "Nothing to copy.".
    pub fn copy_text(&mut self) -> Option<String> {
        let text = match self.active_tab {
            AppTab::GraphQl => self.graphql.response.clone(),
            AppTab::Docs => self.docs.details.clone(),
            AppTab::Http => self.http.response.clone(),
            AppTab::WebSocket => self.ws.log_text(),
        };
        if text.trim().is_empty() {
            *self.status_mut() = "Nothing to copy.".to_string();
            return None;
        }
        Some(text)
    }

    pub fn copy_done(&mut self, result: Result<(), ClipboardError>) {
        let is_log = self.active_tab == AppTab::WebSocket;
        let status = match result {
            Ok(()) if is_log => "Log copied.",
            Ok(()) => "Response copied to clipboard.",
            Err(e) => {
                tracing::warn!(error = %e, "Copy failed");
                if is_log {
                    "Copy failed."
                } else {
                    "Copy failed: no clipboard available."
                }
            }
        };
        *self.status_mut() = status.to_string();
    }

    // ========================
    // Docs tree
    // ========================

    pub fn select_node(&mut self, index: usize) {
        let rows = self.docs.tree.rows();
        if rows.is_empty() {
            return;
        }
        let index = index.min(rows.len() - 1);
        let (_, node) = rows[index];
        let details = node.data.details(&node.label);
        self.docs.selected = index;
        self.docs.details = details;
        self.docs.details_scroll = 0;
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Completed { id, response } => {
                if pending_id(&self.graphql.pending) == Some(id) {
                    let insecure = self.finish_graphql();
                    self.graphql.response = format_response(&response);
                    if insecure {
                        self.graphql.status = TLS_WARNING.to_string();
                    }
                } else if pending_id(&self.http.pending) == Some(id) {
                    let insecure = self.finish_http();
                    self.http.response = format_response(&response);
                    if insecure {
                        self.http.status = TLS_WARNING.to_string();
                    }
                } else if pending_id(&self.docs.pending) == Some(id) {
                    self.finish_docs();
                    self.populate_tree(&response);
                }
            }
            NetworkResponse::Failed { id, message } => {
                if pending_id(&self.graphql.pending) == Some(id) {
                    self.finish_graphql();
                    self.graphql.response = format!("Request failed: {}", message);
                } else if pending_id(&self.http.pending) == Some(id) {
                    self.finish_http();
                    self.http.response = format!("Request failed: {}", message);
                } else if pending_id(&self.docs.pending) == Some(id) {
                    self.finish_docs();
                    self.docs.status = format!("Failed: {}", message);
                }
            }
            NetworkResponse::WsEvent(event) => self.handle_ws_event(event),
            NetworkResponse::WsCommandDone { ok } => {
                self.ws.busy = false;
                if self.ws.status == "Working..." {
                    self.ws.status.clear();
                }
                if ok {
                    self.persist_ws();
                }
            }
        }
    }

    fn handle_ws_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Log(content) => self.ws.log.push(WsLogEntry {
                content,
                timestamp: chrono::Local::now(),
            }),
            SessionEvent::Status(status) => self.ws.status = status,
            SessionEvent::State(state) => {
                let was_connected = matches!(self.ws.session, SessionState::Open | SessionState::Closing);
                self.ws.session = state;
                match state {
                    SessionState::Open => self.ws.status = "Connected.".to_string(),
                    SessionState::Idle if was_connected => {
                        self.ws.status = "Disconnected.".to_string()
                    }
                    _ => {}
                }
            }
        }
    }

    /// Returns whether the finished request skipped TLS verification
    fn finish_graphql(&mut self) -> bool {
        let insecure = self.graphql.pending.take().map_or(false, |p| !p.verify_tls);
        self.graphql.busy = false;
        self.graphql.status.clear();
        self.persist_graphql();
        insecure
    }

    fn finish_http(&mut self) -> bool {
        let insecure = self.http.pending.take().map_or(false, |p| !p.verify_tls);
        self.http.busy = false;
        self.http.status.clear();
        self.persist_http();
        insecure
    }

    fn finish_docs(&mut self) {
        self.docs.pending = None;
        self.docs.busy = false;
        self.docs.status.clear();
    }

    fn populate_tree(&mut self, response: &ResponseEnvelope) {
        self.docs.tree = SchemaNode::default();
        self.docs.selected = 0;
        self.docs.details_scroll = 0;
        let result = build_introspection_result(response);
        if result.success {
            let added = add_types_to_tree(&mut self.docs.tree, &result.types);
            tracing::debug!(types = added, "Schema tree populated");
        }
        self.docs.status = result.status;
        self.docs.details = result.details;
    }

    // ========================
    // Persistence
    // ========================

    fn persist_graphql(&mut self) {
        let spec = self.graphql.current_spec();
        if let Err(e) = self.store.save(&spec, GraphQlTabSpec::SECTION) {
            tracing::warn!(error = %e, "Could not save GraphQL tab");
            self.graphql.status = "Could not save state.".to_string();
        }
    }

    fn persist_http(&mut self) {
        let spec = self.http.current_spec();
        if let Err(e) = self.store.save(&spec, HttpTabSpec::SECTION) {
            tracing::warn!(error = %e, "Could not save HTTP tab");
            self.http.status = "Could not save state.".to_string();
        }
    }

    fn persist_ws(&mut self) {
        let spec = self.ws.current_spec();
        if let Err(e) = self.store.save(&spec, WsTabSpec::SECTION) {
            tracing::warn!(error = %e, "Could not save WebSocket tab");
            self.ws.status = "Could not save state.".to_string();
        }
    }
}

fn pending_id(pending: &Option<PendingRequest>) -> Option<u64> {
    pending.map(|p| p.id)
}

fn ensure_json_content_type(headers: &mut HeaderSet) {
    if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
    }
}
