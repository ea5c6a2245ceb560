use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::App;
use crate::transcript::{ChatRole, MessageEntry, Transcript};

const SEND_LABEL: &str = " Send ";

/// Convert `**bold**` and `` `code` `` markers in a reply line to styled spans.
/// Unclosed markers are kept as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let (marker, style) = if rest.starts_with("**") {
            ("**", Style::default().add_modifier(Modifier::BOLD))
        } else if rest.starts_with('`') {
            ("`", Style::default().fg(Color::Green))
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                plain.push(c);
            }
            rest = chars.as_str();
            continue;
        };

        let body = &rest[marker.len()..];
        match body.find(marker) {
            Some(end) if end > 0 => {
                if !plain.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut plain)));
                }
                spans.push(Span::styled(body[..end].to_string(), style));
                rest = &body[end + marker.len()..];
            }
            _ => {
                plain.push_str(marker);
                rest = body;
            }
        }
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input row, footer
    let [header_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_row);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let in_flight = app.controller.in_flight();
    let status = if in_flight > 0 {
        format!(" [{} waiting]", in_flight)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" chatbox ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::White)),
        Span::styled(status, Style::default().fg(Color::Yellow)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Assistant => Line::from(Span::styled(
            "Bot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn entry_lines(entry: &MessageEntry, animation_frame: u8, lines: &mut Vec<Line<'static>>) {
    lines.push(role_line(entry.role));

    if entry.pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        match entry.role {
            ChatRole::User => {
                for line in entry.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                for line in entry.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
    }

    lines.push(Line::default());
}

/// Transcript content as it is wrapped inside the pane, without the border.
///
/// Scroll limits are computed from this same paragraph so they agree with
/// what is drawn.
pub fn transcript_paragraph(transcript: &Transcript, animation_frame: u8) -> Paragraph<'static> {
    let text = if transcript.is_empty() {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for entry in transcript.entries() {
            entry_lines(entry, animation_frame, &mut lines);
        }
        Text::from(lines)
    };

    Paragraph::new(text).wrap(Wrap { trim: true })
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    // Inner size minus borders
    app.on_layout(area.width.saturating_sub(2), area.height.saturating_sub(2));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversation ");

    let chat = transcript_paragraph(app.transcript(), app.animation_frame)
        .block(block)
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);

    let total_lines = app.content_height();
    if total_lines > app.chat_height {
        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let send_width = SEND_LABEL.len() as u16 + 2;
    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(send_width),
    ])
    .areas(area);

    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ");

    // Horizontal scrolling keeps the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.controller.input().cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .controller
        .input()
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));

    let button_style = if app.controller.input().text().trim().is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    };
    let send = Paragraph::new(Span::styled(SEND_LABEL, button_style))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(send, send_area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl-End ", key_style),
        Span::styled(" latest ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
