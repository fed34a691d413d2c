//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Application tabs
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AppTab {
    #[default]
    GraphQl,
    Docs,
    Http,
    WebSocket,
}

impl AppTab {
    pub const ALL: [AppTab; 4] = [AppTab::GraphQl, AppTab::Docs, AppTab::Http, AppTab::WebSocket];

    pub fn title(&self) -> &'static str {
        match self {
            AppTab::GraphQl => "GraphQL",
            AppTab::Docs => "Docs",
            AppTab::Http => "HTTP",
            AppTab::WebSocket => "WebSocket",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AppTab::GraphQl => 0,
            AppTab::Docs => 1,
            AppTab::Http => 2,
            AppTab::WebSocket => 3,
        }
    }

    /// Fields in focus order
    pub fn fields(&self) -> &'static [Field] {
        match self {
            AppTab::GraphQl => &[
                Field::Endpoint,
                Field::Headers,
                Field::Variables,
                Field::Query,
                Field::Response,
            ],
            AppTab::Docs => &[Field::Tree, Field::Details],
            AppTab::Http => &[Field::Endpoint, Field::Headers, Field::Body, Field::Response],
            AppTab::WebSocket => &[Field::Endpoint, Field::Headers, Field::Message, Field::Response],
        }
    }
}

/// Focusable area of a tab
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    Endpoint,
    Headers,
    Variables,
    Query,
    Body,
    Message,
    Response,
    Tree,
    Details,
}

impl Field {
    pub fn is_editable(&self) -> bool {
        !matches!(self, Field::Response | Field::Tree | Field::Details)
    }

    pub fn is_multiline(&self) -> bool {
        matches!(
            self,
            Field::Headers | Field::Variables | Field::Query | Field::Body | Field::Message
        )
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // Navigation
    SwitchTab(AppTab),
    NextField,
    PrevField,
    ScrollUp,
    ScrollDown,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Newline,
    Backspace,
    CursorLeft,
    CursorRight,

    // Actions
    Send,
    ToggleVerifyTls,
    CycleMethod,
    Clear,
    Copy,
    LoadSchema,
    WsConnect,
    WsDisconnect,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_tab: AppTab,
    focused: Field,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('s') => return Some(send_for(active_tab)),
            _ => {}
        }
    }
    match key.code {
        KeyCode::F(12) => return Some(UiEvent::Quit),
        KeyCode::F(5) => return Some(send_for(active_tab)),
        _ => {}
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match input_mode {
        InputMode::Editing => editing_keys(key, focused),
        InputMode::Normal => normal_keys(key, active_tab, focused),
    }
}

fn send_for(tab: AppTab) -> UiEvent {
    match tab {
        AppTab::Docs => UiEvent::LoadSchema,
        _ => UiEvent::Send,
    }
}

fn editing_keys(key: KeyEvent, focused: Field) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Enter if focused.is_multiline() => Some(UiEvent::Newline),
        KeyCode::Enter => Some(UiEvent::StopEditing),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn normal_keys(key: KeyEvent, active_tab: AppTab, focused: Field) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('1') => Some(UiEvent::SwitchTab(AppTab::GraphQl)),
        KeyCode::Char('2') => Some(UiEvent::SwitchTab(AppTab::Docs)),
        KeyCode::Char('3') => Some(UiEvent::SwitchTab(AppTab::Http)),
        KeyCode::Char('4') => Some(UiEvent::SwitchTab(AppTab::WebSocket)),
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab => Some(UiEvent::NextField),
        KeyCode::BackTab => Some(UiEvent::PrevField),
        KeyCode::Char('e') | KeyCode::Enter if focused.is_editable() => Some(UiEvent::StartEditing),
        KeyCode::Up => Some(UiEvent::ScrollUp),
        KeyCode::Down => Some(UiEvent::ScrollDown),
        KeyCode::Char('s') => Some(send_for(active_tab)),
        KeyCode::Char('y') => Some(UiEvent::Copy),
        KeyCode::Char('x') => Some(UiEvent::Clear),
        KeyCode::Char('v') if active_tab != AppTab::Docs => Some(UiEvent::ToggleVerifyTls),
        KeyCode::Char('m') if active_tab == AppTab::Http => Some(UiEvent::CycleMethod),
        KeyCode::Char('l') if active_tab == AppTab::Docs => Some(UiEvent::LoadSchema),
        KeyCode::Char('c') if active_tab == AppTab::WebSocket => Some(UiEvent::WsConnect),
        KeyCode::Char('d') if active_tab == AppTab::WebSocket => Some(UiEvent::WsDisconnect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_tab_switching_only_in_normal_mode() {
        let ev = key_to_ui_event(press(KeyCode::Char('3')), AppTab::GraphQl, Field::Endpoint, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::SwitchTab(AppTab::Http)));

        let ev = key_to_ui_event(press(KeyCode::Char('3')), AppTab::GraphQl, Field::Endpoint, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::CharInput('3')));
    }

    #[test]
    fn test_enter_inserts_newline_in_multiline_fields() {
        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::GraphQl, Field::Query, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::Newline));

        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::GraphQl, Field::Endpoint, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::StopEditing));
    }

    #[test]
    fn test_send_shortcuts_work_while_editing() {
        let ev = key_to_ui_event(ctrl('s'), AppTab::Http, Field::Body, InputMode::Editing, false);
        assert_eq!(ev, Some(UiEvent::Send));

        let ev = key_to_ui_event(press(KeyCode::F(5)), AppTab::Docs, Field::Tree, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::LoadSchema));
    }

    #[test]
    fn test_tab_specific_keys() {
        let ev = key_to_ui_event(press(KeyCode::Char('m')), AppTab::GraphQl, Field::Endpoint, InputMode::Normal, false);
        assert_eq!(ev, None);

        let ev = key_to_ui_event(press(KeyCode::Char('m')), AppTab::Http, Field::Endpoint, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::CycleMethod));

        let ev = key_to_ui_event(press(KeyCode::Char('c')), AppTab::WebSocket, Field::Message, InputMode::Normal, false);
        assert_eq!(ev, Some(UiEvent::WsConnect));

        let ev = key_to_ui_event(press(KeyCode::Enter), AppTab::Docs, Field::Tree, InputMode::Normal, false);
        assert_eq!(ev, None);
    }

    #[test]
    fn test_help_popup_swallows_keys() {
        let ev = key_to_ui_event(press(KeyCode::Char('q')), AppTab::Http, Field::Endpoint, InputMode::Normal, true);
        assert_eq!(ev, Some(UiEvent::CloseHelp));

        let ev = key_to_ui_event(ctrl('c'), AppTab::Http, Field::Endpoint, InputMode::Normal, true);
        assert_eq!(ev, Some(UiEvent::Quit));
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(
            key_to_ui_event(key, AppTab::Http, Field::Endpoint, InputMode::Normal, false),
            None
        );
    }
}
