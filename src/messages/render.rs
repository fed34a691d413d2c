//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{DocsTab, GraphQlTab, HttpTab, WsTab};
use crate::messages::ui_events::{AppTab, Field, InputMode};
use crate::models::{GraphQlTabSpec, HttpTabSpec, WsTabSpec};

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub focused: Field,
    pub show_help: bool,

    pub graphql: GraphQlTab,
    pub docs: DocsTab,
    pub http: HttpTab,
    pub ws: WsTab,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            active_tab: AppTab::GraphQl,
            input_mode: InputMode::Normal,
            focused: Field::Endpoint,
            show_help: false,
            graphql: GraphQlTab::from_spec(GraphQlTabSpec::default()),
            docs: DocsTab::default(),
            http: HttpTab::from_spec(HttpTabSpec::default()),
            ws: WsTab::from_spec(WsTabSpec::default()),
        }
    }
}
