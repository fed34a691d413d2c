use ratatui::{prelude::*, widgets::*};

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Border style for a pane given focus and editing state
pub fn border_style(is_focused: bool, is_editing: bool) -> Style {
    if is_focused && is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Simple JSON syntax highlighting
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut is_key = false;
        let mut escaped = false;

        for (offset, c) in line.char_indices() {
            if in_string {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    let color = if is_key { Color::Cyan } else { Color::Green };
                    spans.push(Span::styled(current.clone(), Style::default().fg(color)));
                    current.clear();
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => {
                    flush_raw(&mut spans, &mut current);
                    in_string = true;
                    current.push(c);
                    // A key is a string followed by a colon
                    is_key = closing_quote(&line[offset + 1..])
                        .map(|end| line[offset + 1 + end + 1..].trim_start().starts_with(':'))
                        .unwrap_or(false);
                }
                ':' | ',' => {
                    flush_raw(&mut spans, &mut current);
                    spans.push(Span::styled(c.to_string(), Style::default().fg(Color::White)));
                }
                '{' | '}' | '[' | ']' => {
                    flush_raw(&mut spans, &mut current);
                    spans.push(Span::styled(c.to_string(), Style::default().fg(Color::Yellow)));
                }
                _ => current.push(c),
            }
        }
        flush_raw(&mut spans, &mut current);

        lines.push(Line::from(spans));
    }

    lines
}

fn closing_quote(rest: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Push a bare token, coloring literals and numbers
fn flush_raw(spans: &mut Vec<Span<'static>>, current: &mut String) {
    if current.is_empty() {
        return;
    }
    let token = std::mem::take(current);
    let trimmed = token.trim();
    let style = match trimmed {
        "true" | "false" | "null" => Style::default().fg(Color::Magenta),
        t if !t.is_empty() && t.parse::<f64>().is_ok() => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    spans.push(Span::styled(token, style));
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

/// Status code of a formatted response pane, if it has one
pub fn response_status(text: &str) -> Option<u16> {
    text.lines()
        .next()?
        .strip_prefix("Status: ")?
        .trim()
        .parse()
        .ok()
}

/// Color of a WebSocket log line, keyed on its prefix
pub fn ws_line_color(line: &str) -> Color {
    if line.starts_with("Sent:") {
        Color::Cyan
    } else if line.starts_with("Received:") {
        Color::Green
    } else if line.contains("failed") || line.contains("closed by server") {
        Color::Red
    } else {
        Color::Yellow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(lines: &[Line<'static>]) -> Vec<(String, Option<Color>)> {
        lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| (s.content.to_string(), s.style.fg))
            .collect()
    }

    #[test]
    fn test_highlight_json_keys_values_and_literals() {
        let lines = highlight_json("  \"ok\": true,\n  \"n\": -1.5,\n  \"s\": \"a:b\"");
        let spans = styled(&lines);
        assert!(spans.contains(&("\"ok\"".to_string(), Some(Color::Cyan))));
        assert!(spans.contains(&(" true".to_string(), Some(Color::Magenta))));
        assert!(spans.contains(&(" -1.5".to_string(), Some(Color::Yellow))));
        assert!(spans.contains(&("\"a:b\"".to_string(), Some(Color::Green))));
    }

    #[test]
    fn test_highlight_json_plain_text_untouched() {
        let lines = highlight_json("Status: 200\nBody:");
        assert_eq!(lines.len(), 2);
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "Status: 200");
    }

    #[test]
    fn test_response_status() {
        assert_eq!(response_status("Status: 404\nTime: 1.0 ms"), Some(404));
        assert_eq!(response_status("Request failed: boom"), None);
        assert_eq!(response_status(""), None);
    }

    #[test]
    fn test_ws_line_color() {
        assert_eq!(ws_line_color("Sent: hi"), Color::Cyan);
        assert_eq!(ws_line_color("Received: hi"), Color::Green);
        assert_eq!(ws_line_color("Send failed: broken pipe"), Color::Red);
        assert_eq!(ws_line_color("Connected to ws://x"), Color::Yellow);
    }

    #[test]
    fn test_colors() {
        assert_eq!(status_color(201), Color::Green);
        assert_eq!(status_color(503), Color::Magenta);
        assert_eq!(method_color("DELETE"), Color::Red);
    }
}
