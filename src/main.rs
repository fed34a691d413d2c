//! Voyager - terminal client for GraphQL, HTTP and WebSocket endpoints
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution and the WebSocket session

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use voyager_tui::app::state::TextField;
use voyager_tui::app::AppActor;
use voyager_tui::cli::CommandLineArgs;
use voyager_tui::clipboard::FallbackClipboard;
use voyager_tui::constants::{APP_NAME, REQUEST_TIMEOUT};
use voyager_tui::logging::init_file_logging;
use voyager_tui::messages::ui_events::{key_to_ui_event, AppTab, Field, InputMode};
use voyager_tui::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use voyager_tui::network::{NetworkActor, RequestExecutor, TungsteniteConnector};
use voyager_tui::storage::StateStore;
use voyager_tui::ui::{
    border_style, highlight_json, method_color, render_tabs, response_status, status_color,
    ws_line_color,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CommandLineArgs::parse();

    // Logging to file only with --debug; the guard flushes on exit
    let _log_guard = if args.debug() {
        match init_file_logging(args.log_file()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Could not open log file {}: {}", args.log_file().display(), e);
                None
            }
        }
    } else {
        None
    };

    let store = match args.config_dir() {
        Some(dir) => StateStore::in_dir(dir),
        None => StateStore::new(),
    };
    tracing::info!(state = %store.path().display(), "Starting {}", APP_NAME);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let executor = RequestExecutor::compose(None, REQUEST_TIMEOUT);
    tracing::info!(transport = executor.transport_name(), "HTTP transport selected");
    let network_actor = NetworkActor::new(executor, Arc::new(TungsteniteConnector), net_resp_tx);
    let network_handle = tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(
        store,
        net_cmd_tx,
        render_tx,
        Arc::new(FallbackClipboard::default()),
    );
    let app_handle = tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Give the network actor a moment to close the WebSocket session
    let _ = tokio::time::timeout(Duration::from_secs(2), async {
        let _ = app_handle.await;
        let _ = network_handle.await;
    })
    .await;
    tracing::info!("Shut down");

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_tab,
                    current_state.focused,
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    // Main layout with tab bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_tab_bar(f, state, main_chunks[0]);

    match state.active_tab {
        AppTab::GraphQl => draw_graphql_tab(f, state, main_chunks[1]),
        AppTab::Docs => draw_docs_tab(f, state, main_chunks[1]),
        AppTab::Http => draw_http_tab(f, state, main_chunks[1]),
        AppTab::WebSocket => draw_ws_tab(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let titles: Vec<String> = AppTab::ALL
        .iter()
        .map(|tab| {
            let marker = if *tab == AppTab::WebSocket && state.ws.connected() {
                " [*]"
            } else {
                ""
            };
            format!(" {}:{}{} ", tab.index() + 1, tab.title(), marker)
        })
        .collect();
    let titles: Vec<&str> = titles.iter().map(String::as_str).collect();

    f.render_widget(render_tabs(&titles, state.active_tab.index()), area);
}

fn tls_label(verify_tls: bool) -> &'static str {
    if verify_tls {
        "[TLS verify]"
    } else {
        "[TLS off]"
    }
}

fn busy_label(busy: bool) -> &'static str {
    if busy {
        " [...]"
    } else {
        ""
    }
}

/// Editable text pane; scrolls to keep the cursor visible
fn draw_text_field(
    f: &mut Frame,
    area: Rect,
    title: Line<'static>,
    field: &TextField,
    is_focused: bool,
    is_editing: bool,
    json: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, is_editing))
        .title(title);
    let inner = block.inner(area);

    let (line, col) = field.cursor_line_col();
    let v_scroll = line.saturating_sub(inner.height.saturating_sub(1) as usize) as u16;
    let h_scroll = col.saturating_sub(inner.width.saturating_sub(1) as usize) as u16;

    let text = if json {
        Text::from(highlight_json(field.as_str()))
    } else {
        Text::raw(field.as_str())
    };
    let paragraph = Paragraph::new(text).block(block).scroll((v_scroll, h_scroll));
    f.render_widget(paragraph, area);

    if is_focused && is_editing {
        let x = inner.x + (col as u16).saturating_sub(h_scroll);
        let y = inner.y + (line as u16).saturating_sub(v_scroll);
        let max_x = inner.right().saturating_sub(1);
        let max_y = inner.bottom().saturating_sub(1);
        f.set_cursor_position(Position::new(x.min(max_x), y.min(max_y)));
    }
}

fn draw_response(f: &mut Frame, area: Rect, text: &str, scroll: u16, is_focused: bool) {
    let title = match response_status(text) {
        Some(code) => Line::from(vec![
            Span::raw(" Response "),
            Span::styled(format!("{} ", code), Style::default().fg(status_color(code)).bold()),
        ]),
        None => Line::from(" Response "),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, false))
        .title(title)
        .title_bottom(Line::from(" y:copy x:clear ").right_aligned());

    let response = Paragraph::new(highlight_json(text))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(response, area);
}

fn draw_graphql_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let tab = &state.graphql;
    let editing = state.input_mode == InputMode::Editing;

    let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
    draw_text_field(
        f,
        rows[0],
        Line::from(format!(" Endpoint {}{} ", tls_label(tab.verify_tls), busy_label(tab.busy))),
        &tab.endpoint,
        state.focused == Field::Endpoint,
        editing,
        false,
    );

    let cols = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let left = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Min(5),
    ])
    .split(cols[0]);

    draw_text_field(
        f,
        left[0],
        Line::from(" Headers "),
        &tab.headers,
        state.focused == Field::Headers,
        editing,
        false,
    );
    draw_text_field(
        f,
        left[1],
        Line::from(" Variables (JSON) "),
        &tab.variables,
        state.focused == Field::Variables,
        editing,
        true,
    );
    draw_text_field(
        f,
        left[2],
        Line::from(" Query "),
        &tab.query,
        state.focused == Field::Query,
        editing,
        false,
    );
    draw_response(f, cols[1], &tab.response, tab.scroll, state.focused == Field::Response);
}

fn draw_docs_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let docs = &state.docs;
    let cols = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state.focused == Field::Tree, false))
        .title(format!(" Schema{} ", busy_label(docs.busy)));

    let rows = docs.tree.rows();
    if rows.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No schema loaded. Press 'l' to introspect the GraphQL endpoint.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block)
        .wrap(Wrap { trim: false });
        f.render_widget(hint, cols[0]);
    } else {
        let items: Vec<ListItem> = rows
            .iter()
            .map(|(depth, node)| {
                let style = if *depth == 0 {
                    Style::default().fg(Color::Cyan).bold()
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", "  ".repeat(*depth), node.label)).style(style)
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow).bold())
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        list_state.select(Some(docs.selected));
        f.render_stateful_widget(list, cols[0], &mut list_state);
    }

    let details = Paragraph::new(docs.details.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(state.focused == Field::Details, false))
                .title(" Details "),
        )
        .wrap(Wrap { trim: false })
        .scroll((docs.details_scroll, 0));
    f.render_widget(details, cols[1]);
}

fn draw_http_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let tab = &state.http;
    let editing = state.input_mode == InputMode::Editing;

    let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", tab.method.as_str()),
            Style::default().fg(method_color(tab.method.as_str())).bold(),
        ),
        Span::raw(format!("{}{} ", tls_label(tab.verify_tls), busy_label(tab.busy))),
    ]);
    draw_text_field(
        f,
        rows[0],
        title,
        &tab.url,
        state.focused == Field::Endpoint,
        editing,
        false,
    );

    let cols = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let left = Layout::vertical([Constraint::Length(6), Constraint::Min(5)]).split(cols[0]);

    draw_text_field(
        f,
        left[0],
        Line::from(" Headers "),
        &tab.headers,
        state.focused == Field::Headers,
        editing,
        false,
    );
    draw_text_field(
        f,
        left[1],
        Line::from(" Body "),
        &tab.body,
        state.focused == Field::Body,
        editing,
        true,
    );
    draw_response(f, cols[1], &tab.response, tab.scroll, state.focused == Field::Response);
}

fn draw_ws_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let tab = &state.ws;
    let editing = state.input_mode == InputMode::Editing;

    let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
    let (indicator, color) = if tab.connected() {
        (" [+] Connected", Color::Green)
    } else {
        (" [-] Disconnected", Color::DarkGray)
    };
    let title = Line::from(vec![
        Span::raw(" WebSocket"),
        Span::styled(indicator, Style::default().fg(color)),
        Span::raw(format!(" {}{} ", tls_label(tab.verify_tls), busy_label(tab.busy))),
    ]);
    draw_text_field(
        f,
        rows[0],
        title,
        &tab.url,
        state.focused == Field::Endpoint,
        editing,
        false,
    );

    let cols = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    let left = Layout::vertical([Constraint::Length(6), Constraint::Min(5)]).split(cols[0]);

    draw_text_field(
        f,
        left[0],
        Line::from(" Headers "),
        &tab.headers,
        state.focused == Field::Headers,
        editing,
        false,
    );
    draw_text_field(
        f,
        left[1],
        Line::from(" Message (s:send) "),
        &tab.message,
        state.focused == Field::Message,
        editing,
        true,
    );

    let mut lines: Vec<Line> = Vec::new();
    for entry in &tab.log {
        let style = Style::default().fg(ws_line_color(&entry.content));
        let stamp = entry.timestamp.format("%H:%M:%S").to_string();
        for (i, text) in entry.content.lines().enumerate() {
            let prefix = if i == 0 {
                format!("[{}] ", stamp)
            } else {
                " ".repeat(stamp.len() + 3)
            };
            lines.push(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(text.to_string(), style),
            ]));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No messages yet. Press 'c' to connect, 's' to send.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let log = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(state.focused == Field::Response, false))
                .title(" Log ")
                .title_bottom(Line::from(" c:connect d:disconnect y:copy x:clear ").right_aligned()),
        )
        .wrap(Wrap { trim: false })
        .scroll((tab.scroll, 0));
    f.render_widget(log, cols[1]);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = match state.active_tab {
        AppTab::GraphQl => state.graphql.status.as_str(),
        AppTab::Docs => state.docs.status.as_str(),
        AppTab::Http => state.http.status.as_str(),
        AppTab::WebSocket => state.ws.status.as_str(),
    };

    let hints = if state.input_mode == InputMode::Editing {
        " Esc:stop editing | Enter:newline | Ctrl+S:send "
    } else {
        match state.active_tab {
            AppTab::GraphQl => " Tab:field | e:edit | s:send | v:TLS | ?:help | q:quit ",
            AppTab::Docs => " Tab:pane | l:load schema | up/down:select | ?:help | q:quit ",
            AppTab::Http => " Tab:field | e:edit | m:method | s:send | v:TLS | ?:help | q:quit ",
            AppTab::WebSocket => " Tab:field | e:edit | c:connect | s:send | d:disconnect | ?:help ",
        }
    };

    let dim = Style::default().fg(Color::DarkGray);
    let line = if status.is_empty() {
        Line::from(Span::styled(hints, dim))
    } else {
        Line::from(vec![
            Span::styled(format!(" {} ", status), Style::default().fg(Color::Yellow)),
            Span::styled("|", dim),
            Span::styled(hints, dim),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 75, area);

    let help_text = r#"
 TABS
   1 / 2 / 3 / 4      GraphQL / Docs / HTTP / WebSocket

 NAVIGATION
   Tab / Shift+Tab    Next / previous field
   Up / Down          Scroll response, move schema selection
   e / Enter          Edit focused field
   Esc                Stop editing

 REQUESTS
   s / Ctrl+S / F5    Send (load schema on Docs)
   v                  Toggle TLS verification
   m                  Cycle HTTP method
   y                  Copy response, details or log
   x                  Clear response, schema or log

 WEBSOCKET
   c / d              Connect / disconnect

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C / F12   Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} - Keyboard Shortcuts ", APP_NAME))
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
