use crate::app::{App, Mode, SETUP_INSTRUCTIONS};
use crate::session::Status;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use throbber_widgets_tui::Throbber;

const HELP_TEXT: &str = "Controls: \n\nGeneral:\n Ctrl+o: New Chat (Model Select)\n Ctrl+r: Last Chat\n Ctrl+w: Close Chat\n Ctrl+l: Clear History\n Ctrl+c: Quit\n F1: Help\n\nInsert Mode:\n Enter: Send Message\n Shift+Enter: New Line\n PageUp/PageDown: Scroll\n Esc: Switch to Normal Mode\n\nNormal Mode:\n j/k: Scroll\n Tab: Next Chat\n s: Skip Animation\n +/-: Animation Speed\n i: Switch to Insert Mode\n q: Quit\n\nModel Select:\n Enter: Open Chat\n r: Refresh Models";

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();

    // Help popup
    if app.show_help {
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);
        let area = centered_rect(60, 70, size);
        f.render_widget(Clear, area);
        f.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Conversation
            Constraint::Length(
                (3 + app.input.lines().len().saturating_sub(1) as u16).min(10),
            ), // Input grows to max 10 lines
        ])
        .split(size);

    render_header(f, app, chunks[0]);
    render_conversation(f, app, chunks[1]);
    render_input(f, app, chunks[2]);

    if app.mode == Mode::ModelSelect {
        render_model_select(f, app, size);
    }
}

fn render_header(f: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(
        " NeuraTalk - Speed: {:.0} (F1 for Help) ",
        app.config.animation_speed
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded);

    let sessions = app.manager.sessions();
    if sessions.is_empty() {
        let hint = Paragraph::new(" No open chats ").block(block);
        f.render_widget(hint, area);
    } else {
        let titles: Vec<Line> = sessions
            .iter()
            .map(|s| {
                let marker = match s.status() {
                    Status::Idle => "",
                    Status::Generating | Status::Animating => " *",
                };
                Line::from(format!("{}{}", s.model_id(), marker))
            })
            .collect();
        let selected = app
            .manager
            .current_id()
            .and_then(|id| sessions.iter().position(|s| s.id() == id))
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .block(block)
            .select(selected)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    if app.loading || app.is_generating() {
        let label = if app.loading { "Loading models..." } else { "Thinking..." };
        let width = (label.len() as u16 + 3).min(area.width.saturating_sub(2));
        let spinner_area = Rect {
            x: area.right().saturating_sub(width + 1),
            y: area.y + 1,
            width,
            height: 1,
        };
        let throbber = Throbber::default().label(label).throbber_style(
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(throbber, spinner_area, &mut app.spinner_state);
    }
}

fn render_conversation(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let Some(session) = app.manager.current() else {
        let text = if app.show_setup {
            SETUP_INSTRUCTIONS.to_string()
        } else {
            "Welcome to NeuraTalk!\n\nPress Ctrl+o to pick a model and start a chat.".to_string()
        };
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        f.render_widget(p, centered_rect(80, 50, area));
        return;
    };

    let display = session.current_display_text();
    if display.is_empty() {
        let p = Paragraph::new(format!(
            "Start a conversation with {} by typing a message below.",
            session.model_id()
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let text = Text::from(display);
    let content_width = area.width.saturating_sub(2);
    let total_height = estimate_wrapped_height(&text, content_width);
    let viewport_height = area.height.saturating_sub(2);
    let max_scroll = total_height.saturating_sub(viewport_height);

    // Follow new text only when the view was already at the bottom.
    if app.auto_scroll {
        app.vertical_scroll = max_scroll;
    } else if app.vertical_scroll >= max_scroll {
        app.vertical_scroll = max_scroll;
        app.auto_scroll = true;
    }

    let p = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.vertical_scroll, 0));
    f.render_widget(p, area);
}

fn render_input(f: &mut Frame, app: &mut App, area: Rect) {
    let notice = app.manager.current().and_then(|s| {
        s.error()
            .map(|e| (Color::Red, format!(" Error: {} ", e)))
            .or_else(|| s.notice().map(|n| (Color::Yellow, format!(" {} ", n))))
    });

    let (input_border_color, input_title) = if let Some(err) = &app.error {
        (Color::Red, format!(" Error: {} ", err))
    } else if let Some(notice) = notice {
        notice
    } else if app.is_generating() {
        (Color::DarkGray, " Waiting for reply... ".to_string())
    } else {
        match app.mode {
            Mode::Insert => (
                Color::Green,
                " Input (Insert Mode) - Esc for Normal ".to_string(),
            ),
            Mode::Normal => (Color::Blue, " Input (Normal Mode) - i to Type ".to_string()),
            Mode::ModelSelect => (Color::Magenta, " Select Model ".to_string()),
        }
    };

    match app.mode {
        Mode::Insert if !app.is_generating() => app.input.set_style(Style::default()),
        _ => app
            .input
            .set_style(Style::default().add_modifier(Modifier::DIM)),
    }

    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(input_title)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(input_border_color)),
    );
    f.render_widget(&app.input, area);
}

fn render_model_select(f: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect(60, 40, size);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" New Chat - Select Model (r: Refresh, Esc: Cancel) ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    if app.models.is_empty() {
        let text = if app.loading {
            "Loading models...".to_string()
        } else if app.show_setup {
            SETUP_INSTRUCTIONS.to_string()
        } else {
            "No models loaded. Press r to refresh.".to_string()
        };
        f.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .models
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let s = if i == app.selected_model {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(m.as_str(), s))
        })
        .collect();
    let list = List::new(items).block(block);
    f.render_widget(list, area);
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

fn estimate_wrapped_height(text: &Text, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    text.lines
        .iter()
        .map(|line| {
            let line_width = line.width() as u16;
            if line_width == 0 {
                1
            } else {
                line_width.div_ceil(width)
            }
        })
        .fold(0u16, |acc, h| acc.saturating_add(h))
}
