//! App state - pure data structure with no I/O logic

use crate::introspection::{NodeData, TreeSink};
use crate::messages::ui_events::{AppTab, Field, InputMode};
use crate::messages::RenderState;
use crate::models::{GraphQlTabSpec, HttpMethod, HttpTabSpec, WsTabSpec};
use crate::network::websocket::SessionState;
use crate::storage::StateStore;

/// Editable text with a byte-offset cursor on a char boundary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextField {
    pub text: String,
    pub cursor: usize,
}

impl TextField {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        TextField { text, cursor }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn insert(&mut self, c: char) {
        if self.cursor <= self.text.len() {
            self.text.insert(self.cursor, c);
            self.cursor += c.len_utf8();
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    /// Cursor as (line, column in chars)
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0);
        (line, col)
    }
}

/// Request in flight for a tab
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub verify_tls: bool,
}

#[derive(Clone, Debug)]
pub struct GraphQlTab {
    pub id: String,
    pub title: String,
    pub endpoint: TextField,
    pub headers: TextField,
    pub variables: TextField,
    pub query: TextField,
    pub verify_tls: bool,
    pub response: String,
    pub scroll: u16,
    pub status: String,
    pub busy: bool,
    pub pending: Option<PendingRequest>,
    pub focus: usize,
}

impl GraphQlTab {
    pub fn from_spec(spec: GraphQlTabSpec) -> Self {
        GraphQlTab {
            id: spec.id,
            title: spec.title,
            endpoint: TextField::new(spec.endpoint),
            headers: TextField::new(spec.headers),
            variables: TextField::new(spec.variables),
            query: TextField::new(spec.query),
            verify_tls: spec.verify_tls,
            response: String::new(),
            scroll: 0,
            status: String::new(),
            busy: false,
            pending: None,
            focus: 0,
        }
    }

    pub fn current_spec(&self) -> GraphQlTabSpec {
        GraphQlTabSpec {
            id: self.id.clone(),
            title: self.title.clone(),
            endpoint: self.endpoint.text.clone(),
            query: self.query.text.clone(),
            variables: self.variables.text.clone(),
            headers: self.headers.text.clone(),
            verify_tls: self.verify_tls,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpTab {
    pub id: String,
    pub title: String,
    pub method: HttpMethod,
    pub url: TextField,
    pub headers: TextField,
    pub body: TextField,
    pub verify_tls: bool,
    pub response: String,
    pub scroll: u16,
    pub status: String,
    pub busy: bool,
    pub pending: Option<PendingRequest>,
    pub focus: usize,
}

impl HttpTab {
    pub fn from_spec(spec: HttpTabSpec) -> Self {
        HttpTab {
            id: spec.id,
            title: spec.title,
            method: spec.method,
            url: TextField::new(spec.url),
            headers: TextField::new(spec.headers),
            body: TextField::new(spec.body),
            verify_tls: spec.verify_tls,
            response: String::new(),
            scroll: 0,
            status: String::new(),
            busy: false,
            pending: None,
            focus: 0,
        }
    }

    pub fn current_spec(&self) -> HttpTabSpec {
        HttpTabSpec {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.text.clone(),
            method: self.method,
            body: self.body.text.clone(),
            headers: self.headers.text.clone(),
            verify_tls: self.verify_tls,
        }
    }
}

/// A node of the schema explorer. The root itself is never shown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaNode {
    pub label: String,
    pub data: NodeData,
    pub children: Vec<SchemaNode>,
}

impl TreeSink for SchemaNode {
    fn add_node(&mut self, label: String, data: NodeData) -> &mut dyn TreeSink {
        self.children.push(SchemaNode {
            label,
            data,
            children: Vec::new(),
        });
        let last = self.children.len() - 1;
        &mut self.children[last]
    }
}

impl SchemaNode {
    /// Visible rows, depth first, with their depth (top level is 0).
    pub fn rows(&self) -> Vec<(usize, &SchemaNode)> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_rows(0, &mut out);
        }
        out
    }

    fn collect_rows<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a SchemaNode)>) {
        out.push((depth, self));
        for child in &self.children {
            child.collect_rows(depth + 1, out);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DocsTab {
    pub tree: SchemaNode,
    pub selected: usize,
    pub details: String,
    pub details_scroll: u16,
    pub status: String,
    pub busy: bool,
    pub pending: Option<PendingRequest>,
    pub focus: usize,
}

/// A WebSocket log entry
#[derive(Clone, Debug)]
pub struct WsLogEntry {
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

#[derive(Clone, Debug)]
pub struct WsTab {
    pub id: String,
    pub title: String,
    pub url: TextField,
    pub headers: TextField,
    pub message: TextField,
    pub verify_tls: bool,
    pub log: Vec<WsLogEntry>,
    pub session: SessionState,
    pub scroll: u16,
    pub status: String,
    pub busy: bool,
    pub focus: usize,
}

impl WsTab {
    pub fn from_spec(spec: WsTabSpec) -> Self {
        WsTab {
            id: spec.id,
            title: spec.title,
            url: TextField::new(spec.url),
            headers: TextField::new(spec.headers),
            message: TextField::new(spec.message),
            verify_tls: spec.verify_tls,
            log: Vec::new(),
            session: SessionState::Idle,
            scroll: 0,
            status: String::new(),
            busy: false,
            focus: 0,
        }
    }

    pub fn current_spec(&self) -> WsTabSpec {
        WsTabSpec {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.text.clone(),
            message: self.message.text.clone(),
            headers: self.headers.text.clone(),
            verify_tls: self.verify_tls,
        }
    }

    pub fn connected(&self) -> bool {
        self.session == SessionState::Open
    }

    pub fn log_text(&self) -> String {
        self.log
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Main application state - pure data, no I/O
pub struct AppState {
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub show_help: bool,

    pub graphql: GraphQlTab,
    pub docs: DocsTab,
    pub http: HttpTab,
    pub ws: WsTab,

    pub next_request_id: u64,

    // Storage (persisted tab specs)
    pub store: StateStore,
}

impl AppState {
    /// Fresh state with tab specs restored from `store`.
    pub fn new(store: StateStore) -> Self {
        let graphql = store.load(GraphQlTabSpec::default(), GraphQlTabSpec::SECTION);
        let http = store.load(HttpTabSpec::default(), HttpTabSpec::SECTION);
        let ws = store.load(WsTabSpec::default(), WsTabSpec::SECTION);
        AppState {
            active_tab: AppTab::GraphQl,
            input_mode: InputMode::Normal,
            show_help: false,
            graphql: GraphQlTab::from_spec(graphql),
            docs: DocsTab::default(),
            http: HttpTab::from_spec(http),
            ws: WsTab::from_spec(ws),
            next_request_id: 1,
            store,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn focus_index(&self) -> usize {
        match self.active_tab {
            AppTab::GraphQl => self.graphql.focus,
            AppTab::Docs => self.docs.focus,
            AppTab::Http => self.http.focus,
            AppTab::WebSocket => self.ws.focus,
        }
    }

    pub fn focus_index_mut(&mut self) -> &mut usize {
        match self.active_tab {
            AppTab::GraphQl => &mut self.graphql.focus,
            AppTab::Docs => &mut self.docs.focus,
            AppTab::Http => &mut self.http.focus,
            AppTab::WebSocket => &mut self.ws.focus,
        }
    }

    pub fn focused_field(&self) -> Field {
        let fields = self.active_tab.fields();
        fields[self.focus_index() % fields.len()]
    }

    /// Text field under focus, if it is editable
    pub fn current_input_mut(&mut self) -> Option<&mut TextField> {
        let field = self.focused_field();
        match (self.active_tab, field) {
            (AppTab::GraphQl, Field::Endpoint) => Some(&mut self.graphql.endpoint),
            (AppTab::GraphQl, Field::Headers) => Some(&mut self.graphql.headers),
            (AppTab::GraphQl, Field::Variables) => Some(&mut self.graphql.variables),
            (AppTab::GraphQl, Field::Query) => Some(&mut self.graphql.query),
            (AppTab::Http, Field::Endpoint) => Some(&mut self.http.url),
            (AppTab::Http, Field::Headers) => Some(&mut self.http.headers),
            (AppTab::Http, Field::Body) => Some(&mut self.http.body),
            (AppTab::WebSocket, Field::Endpoint) => Some(&mut self.ws.url),
            (AppTab::WebSocket, Field::Headers) => Some(&mut self.ws.headers),
            (AppTab::WebSocket, Field::Message) => Some(&mut self.ws.message),
            _ => None,
        }
    }

    /// Status line of the active tab
    pub fn status_mut(&mut self) -> &mut String {
        match self.active_tab {
            AppTab::GraphQl => &mut self.graphql.status,
            AppTab::Docs => &mut self.docs.status,
            AppTab::Http => &mut self.http.status,
            AppTab::WebSocket => &mut self.ws.status,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            active_tab: self.active_tab,
            input_mode: self.input_mode,
            focused: self.focused_field(),
            show_help: self.show_help,
            graphql: self.graphql.clone(),
            docs: self.docs.clone(),
            http: self.http.clone(),
            ws: self.ws.clone(),
        }
    }
}
