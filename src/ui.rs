use crate::app::{ActiveInput, App, InputMode};
use crate::models::{Priority, Task};
use crate::storage::KeyValueStore;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn get_legend(input_mode: &InputMode) -> Text<'static> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Red));
    match input_mode {
        InputMode::Normal => Text::from(Line::from(vec![
            key(" q "),
            Span::raw(": Quit "),
            key(" j "),
            Span::raw(": Down "),
            key(" k "),
            Span::raw(": Up "),
            key(" a "),
            Span::raw(": Add Task "),
            key(" e "),
            Span::raw(": Edit "),
            key(" d "),
            Span::raw(": Delete "),
            key(" ? "),
            Span::raw(": Setup Guide "),
        ])),
        InputMode::Editing => Text::from(Line::from(vec![
            key(" i "),
            Span::raw(": Insert "),
            key(" Tab "),
            Span::raw(": Switch Field "),
            key(" Enter "),
            Span::raw(": Submit "),
            key(" Esc "),
            Span::raw(": Cancel "),
        ])),
        InputMode::Insert => Text::from(Line::from(vec![
            key(" Esc "),
            Span::raw(": Stop Typing "),
            Span::raw("  @YYYY-MM-DD sets a deadline, #word a category"),
        ])),
    }
}

fn task_line(task: &Task) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("{:>5} ", task.time.as_deref().unwrap_or("--:--")),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(task.title.clone()),
    ];
    if let Some(category) = &task.category {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" {} ", category),
            Style::default().bg(Color::Blue).fg(Color::White),
        ));
    }
    Line::from(spans)
}

fn render_task_list<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let title = if app.classifier.is_enabled() {
        "Today's Tasks"
    } else {
        "Today's Tasks (AI off)"
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if app.board.tasks().is_empty() {
        let empty = Paragraph::new("No tasks yet. Press 'a' to add one.")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    let mut task_index = 0;

    for group in app.groups().iter().filter(|g| !g.tasks.is_empty()) {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{} Priority", group.priority),
            Style::default()
                .fg(priority_color(group.priority))
                .add_modifier(Modifier::BOLD),
        ))));
        for task in &group.tasks {
            if app.selected == Some(task_index) {
                selected_row = Some(items.len());
            }
            items.push(ListItem::new(task_line(task)));
            task_index += 1;
        }
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(selected_row);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_details<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");
    let Some(task) = app.selected_task() else {
        let paragraph = Paragraph::new("Select a task with j/k")
            .block(detail_block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let label = |name: &'static str| Span::styled(name, Style::default().add_modifier(Modifier::BOLD));
    let lines = vec![
        Line::from(vec![
            label("Time: "),
            Span::raw(task.time.clone().unwrap_or_else(|| "No free slot".to_string())),
        ]),
        Line::from(vec![
            label("Priority: "),
            Span::styled(
                task.priority.to_string(),
                Style::default().fg(priority_color(task.priority)),
            ),
        ]),
        Line::from(vec![
            label("Deadline: "),
            Span::raw(
                task.deadline
                    .map(|d| d.format("%B %-d, %Y").to_string())
                    .unwrap_or_else(|| "No deadline".to_string()),
            ),
        ]),
        Line::from(vec![
            label("Category: "),
            Span::raw(task.category.clone().unwrap_or_else(|| "None".to_string())),
        ]),
        Line::from(label("Description: ")),
        Line::from(Span::raw(
            task.description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_form<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let popup_width = ((u32::from(area.width) * 60 / 100) as u16)
        .max(30)
        .min(area.width);
    let popup_area = centered_rect_absolute(popup_width, 8, area);

    let heading = if app.form.editing.is_some() {
        "Edit Task (Press Enter to Submit)"
    } else {
        "Add New Task (Press Enter to Submit)"
    };
    let outer = Block::default()
        .title(heading)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let inner = outer.inner(popup_area);
    f.render_widget(Clear, popup_area);
    f.render_widget(outer, popup_area);

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)].as_ref())
        .split(inner);

    let field_style = |active: bool| {
        if active && app.input_mode == InputMode::Insert {
            Style::default().fg(Color::Yellow)
        } else if active {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let title = Paragraph::new(app.form.title.as_str())
        .style(field_style(app.active_input == ActiveInput::Title))
        .block(Block::default().borders(Borders::ALL).title("Title"));
    let description = Paragraph::new(app.form.description.as_str())
        .style(field_style(app.active_input == ActiveInput::Description))
        .block(Block::default().borders(Borders::ALL).title("Description (Optional)"));

    f.render_widget(title, fields[0]);
    f.render_widget(description, fields[1]);
}

fn render_busy(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect_absolute(30, 3, area);
    let busy = Paragraph::new("Classifying…")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Processing"));
    f.render_widget(Clear, popup_area);
    f.render_widget(busy, popup_area);
}

fn render_setup_guide(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect_absolute(70u16.min(area.width), 12u16.min(area.height), area);
    let text = vec![
        Line::from(Span::styled(
            "AI prioritization needs a Gemini API key.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("1. Open Google AI Studio and choose \"Get API key\"."),
        Line::from("2. Create a key and copy it."),
        Line::from("3. Export it as GEMINI_API_KEY (or API_KEY), put it in a .env"),
        Line::from("   file, or set api_key in config.toml."),
        Line::from("4. Restart dayplan."),
        Line::from(""),
        Line::from("Without a key every task gets the default priority."),
        Line::from("Press any key to close."),
    ];
    let guide = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Setup Guide"))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(guide, popup_area);
}

pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let size = f.area();

    // Body, status line, legend
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(2)].as_ref())
        .split(size);

    let body_chunk = chunks[0];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(body_chunk);

    render_task_list(f, app, columns[0]);
    render_details(f, app, columns[1]);

    if app.input_mode != InputMode::Normal {
        render_form(f, app, body_chunk);
    }
    if app.busy {
        render_busy(f, body_chunk);
    }
    if app.show_setup_guide {
        render_setup_guide(f, body_chunk);
    }

    if let Some(message) = &app.status_message {
        let style = if message.starts_with("Error") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };
        f.render_widget(Paragraph::new(message.as_str()).style(style), chunks[1]);
    }

    let legend = Paragraph::new(get_legend(&app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[2]);
}

pub async fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    mut app: App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Input is not read while a submission is classified
        if app.has_pending_submit() {
            app.submit_form().await;
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}
