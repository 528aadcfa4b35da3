// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode as TermKeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use std::fs;
use std::io;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tempted_app::{
    Command, Header, Key, KeyCode, Model, Msg, PageModel, ProgramOption, Screen, load_page,
};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const ISSUES_URL: &str = "https://github.com/neomantra/tempted/issues/new/choose";
const CURSOR: &str = "█";

/// Whether the loop keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app(model: &mut Model, options: &[ProgramOption]) -> Result<()> {
    let alt_screen = options.contains(&ProgramOption::AltScreen);
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    if alt_screen {
        execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let (tx, rx) = mpsc::channel();

    let result = event_loop(&mut terminal, model, &tx, &rx);

    disable_raw_mode().context("disable raw mode")?;
    if alt_screen {
        execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    }
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: &mut Model,
    tx: &Sender<Msg>,
    rx: &Receiver<Msg>,
) -> Result<()> {
    let (width, height) = terminal::size().context("read terminal size")?;
    if dispatch(model, Msg::Resize { width, height }, tx) == Flow::Quit {
        return Ok(());
    }

    loop {
        if process_pending(model, tx, rx) == Flow::Quit {
            return Ok(());
        }

        terminal
            .draw(|frame| render(frame, model))
            .context("draw frame")?;

        if !event::poll(POLL_INTERVAL).context("poll event")? {
            continue;
        }
        let msg = match event::read().context("read event")? {
            Event::Key(key) => translate_key(key).map(Msg::Key),
            Event::Resize(width, height) => Some(Msg::Resize { width, height }),
            _ => None,
        };
        if let Some(msg) = msg
            && dispatch(model, msg, tx) == Flow::Quit
        {
            return Ok(());
        }
    }
}

/// Feeds every message that background work has produced so far.
pub fn process_pending(model: &mut Model, tx: &Sender<Msg>, rx: &Receiver<Msg>) -> Flow {
    while let Ok(msg) = rx.try_recv() {
        if dispatch(model, msg, tx) == Flow::Quit {
            return Flow::Quit;
        }
    }
    Flow::Continue
}

/// Updates the model with one message and runs the resulting commands.
pub fn dispatch(model: &mut Model, msg: Msg, tx: &Sender<Msg>) -> Flow {
    let mut flow = Flow::Continue;
    for command in model.update(msg) {
        if execute_command(command, model, tx) == Flow::Quit {
            flow = Flow::Quit;
        }
    }
    flow
}

/// Runs one command. Anything that blocks runs on its own thread and
/// reports back through `tx`.
pub fn execute_command(command: Command, model: &Model, tx: &Sender<Msg>) -> Flow {
    tracing::debug!(?command, "executing command");
    match command {
        Command::Load(request) => {
            let sender = tx.clone();
            match model.source() {
                Some(source) => {
                    thread::spawn(move || {
                        let msg = load_page(&request, source.as_ref());
                        let _ = sender.send(msg);
                    });
                }
                None => {
                    let _ = sender.send(Msg::Error("no workflow source connected".to_owned()));
                }
            }
        }
        Command::ScheduleRefresh {
            generation,
            page,
            after,
        } => send_after(tx, after, Msg::RefreshTick { generation, page }),
        Command::ExpireToast { page, id, after } => {
            send_after(tx, after, Msg::ToastExpired { page, id });
        }
        Command::SaveContent {
            page,
            path,
            contents,
        } => {
            let sender = tx.clone();
            thread::spawn(move || {
                let result = save_content(&path, &contents).map_err(|error| format!("{error:#}"));
                let _ = sender.send(Msg::SaveFinished { page, result });
            });
        }
        Command::Cleanup => {
            let _ = tx.send(Msg::CleanupComplete);
        }
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn send_after(tx: &Sender<Msg>, after: Duration, msg: Msg) {
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(after);
        let _ = sender.send(msg);
    });
}

fn save_content(path: &str, contents: &str) -> Result<String> {
    fs::write(path, contents).with_context(|| format!("write {path}"))?;
    Ok(path.to_owned())
}

/// Maps a terminal key press onto the app's key type. Releases are dropped.
pub fn translate_key(event: KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let code = match event.code {
        TermKeyCode::Char(value) => KeyCode::Char(value),
        TermKeyCode::Enter => KeyCode::Enter,
        TermKeyCode::Esc => KeyCode::Esc,
        TermKeyCode::Backspace => KeyCode::Backspace,
        TermKeyCode::Tab => KeyCode::Tab,
        TermKeyCode::Up => KeyCode::Up,
        TermKeyCode::Down => KeyCode::Down,
        TermKeyCode::Left => KeyCode::Left,
        TermKeyCode::Right => KeyCode::Right,
        TermKeyCode::PageUp => KeyCode::PageUp,
        TermKeyCode::PageDown => KeyCode::PageDown,
        TermKeyCode::Home => KeyCode::Home,
        TermKeyCode::End => KeyCode::End,
        _ => KeyCode::Other,
    };
    Some(Key {
        code,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
    })
}

pub fn render(frame: &mut ratatui::Frame<'_>, model: &Model) {
    match model.screen() {
        Screen::Error(message) => {
            let body = Paragraph::new(error_text(message))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false });
            frame.render_widget(body, frame.area());
        }
        Screen::Blank => {}
        Screen::Page { header, page } => {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(header.view_height()), Constraint::Min(1)])
                .split(frame.area());
            render_header(frame, layout[0], header);
            render_page(frame, layout[1], page);
        }
    }
}

fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, header: &Header) {
    let logo_style = Style::default()
        .fg(logo_color(&header.logo_color))
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::styled(header.logo.clone(), logo_style),
        Span::raw(" "),
        Span::styled(header.version.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::raw(header.target.clone()),
    ])];
    let help = header.key_help.to_string();
    lines.extend(
        help.lines()
            .map(|line| Line::styled(line.to_owned(), Style::default().fg(Color::Gray))),
    );
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn render_page(frame: &mut ratatui::Frame<'_>, area: Rect, page: &PageModel) {
    let mut lines = vec![Line::styled(
        filter_line_text(page),
        Style::default().add_modifier(Modifier::BOLD),
    )];

    if page.loading() {
        lines.push(Line::styled(
            page.loading_label().to_owned(),
            Style::default().fg(Color::Yellow),
        ));
    } else {
        let x_offset = if page.wrap_text() { 0 } else { page.x_offset() };
        lines.extend(page.header().iter().map(|text| {
            Line::styled(
                clip_left(text, x_offset),
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
        }));
        let selected = page
            .selection()
            .and_then(|selection| selection.checked_sub(page.y_offset()));
        lines.extend(page.window().iter().enumerate().map(|(index, row)| {
            let style = if Some(index) == selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::styled(clip_left(&row.text, x_offset), style)
        }));
    }

    let toast = page.toast().map(|toast| {
        let color = if toast.is_error {
            Color::Red
        } else {
            Color::Green
        };
        Line::styled(toast.message.clone(), Style::default().fg(color))
    });

    let body_area = match toast {
        Some(toast) if area.height > 1 => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(area);
            frame.render_widget(Paragraph::new(toast), split[1]);
            split[0]
        }
        _ => area,
    };

    let mut body = Paragraph::new(Text::from(lines));
    if page.wrap_text() {
        body = body.wrap(Wrap { trim: false });
    }
    frame.render_widget(body, body_area);
}

/// Prefix line above the rows, showing the filter or save prompt when
/// active.
pub fn filter_line_text(page: &PageModel) -> String {
    if let Some(path) = page.save_path() {
        return format!("Save to: {path}{CURSOR}");
    }
    if page.entering_input() {
        return format!("{}> {}{CURSOR}", page.filter_prefix(), page.input());
    }
    if page.filter_focused() {
        return format!("{} /{}{CURSOR}", page.filter_prefix(), page.filter_text());
    }
    if page.filter_applied() {
        return format!("{} (filter: {})", page.filter_prefix(), page.filter_text());
    }
    page.filter_prefix().to_owned()
}

pub fn error_text(message: &str) -> String {
    format!(
        "Error: {message}\n\nif this seems wrong, consider opening an issue here: {ISSUES_URL}\n\nq/ctrl+c to quit"
    )
}

/// Drops the first `offset` characters for horizontal scrolling.
pub fn clip_left(text: &str, offset: usize) -> String {
    text.chars().skip(offset).collect()
}

fn logo_color(value: &str) -> Color {
    Color::from_str(value).unwrap_or(Color::Magenta)
}
