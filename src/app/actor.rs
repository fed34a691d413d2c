//! App actor - message loop processing UI events and network responses

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::clipboard::{copy_off_thread, ClipboardProvider};
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use crate::storage::StateStore;

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    clipboard: Arc<dyn ClipboardProvider>,
}

impl AppActor {
    pub fn new(
        store: StateStore,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
        clipboard: Arc<dyn ClipboardProvider>,
    ) -> Self {
        AppActor {
            state: AppState::new(store),
            network_tx,
            render_tx,
            clipboard,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event).await {
                        tracing::info!("Quit requested");
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn dispatch(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    async fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Navigation
            UiEvent::SwitchTab(tab) => self.state.switch_tab(tab),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Newline => self.state.newline(),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Actions
            UiEvent::Send => {
                let cmd = self.state.send();
                self.dispatch(cmd);
            }
            UiEvent::LoadSchema => {
                self.state.stop_editing();
                let cmd = self.state.load_schema();
                self.dispatch(cmd);
            }
            UiEvent::WsConnect => {
                let cmd = self.state.ws_connect();
                self.dispatch(cmd);
            }
            UiEvent::WsDisconnect => {
                let cmd = self.state.ws_disconnect();
                self.dispatch(cmd);
            }
            UiEvent::ToggleVerifyTls => self.state.toggle_verify_tls(),
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::Clear => self.state.clear(),
            UiEvent::Copy => {
                if let Some(text) = self.state.copy_text() {
                    let result = copy_off_thread(self.clipboard.clone(), text).await;
                    self.state.copy_done(result);
                }
            }

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
