use std::ops::Range;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Terminal,
};

use crate::error::{ExperimentError, Result};
use crate::policy::Feedback;
use crate::present::{display_chars, Presenter, Screen};
use crate::text::TargetText;

const TEXT_COLUMNS: u16 = 38;
const TEXT_ROWS: u16 = 8;
const FEEDBACK_ROWS: u16 = 3;

const BACKGROUND: Color = Color::Rgb(5, 5, 5);
const WAITING_SCREEN: Color = Color::Rgb(177, 177, 177);
const NEGATIVE_FEEDBACK: Color = Color::Rgb(255, 0, 0);

/// What is currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Message(Screen),
    Typing {
        text: String,
        cursor: usize,
        feedback: Option<Feedback>,
    },
}

impl Default for View {
    fn default() -> Self {
        View::Message(Screen::Landing { ready: false })
    }
}

/// Splits `text` into lines of at most `width` characters, breaking after
/// spaces where possible. Spaces stay at the end of their line.
pub fn wrap_lines(text: &[char], width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let end = (start + width).min(text.len());
        if end == text.len() {
            lines.push(start..end);
            break;
        }
        let split = text[start..end]
            .iter()
            .rposition(|&c| c == ' ')
            .map(|i| start + i + 1)
            .unwrap_or(end);
        lines.push(start..split);
        start = split;
    }
    lines
}

impl Widget for &View {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        match self {
            View::Message(screen) => {
                let (background, foreground, text) = match screen {
                    Screen::Landing { ready } => (
                        BACKGROUND,
                        Color::White,
                        format!(
                            "EEG Typing Experiment\n\n\
                             Your task is to type out a series of paragraphs as quickly as possible.\n\n\
                             Spaces are displayed as underscores (_).\nWhen you get to an underscore, press SPACE.\n\n\
                             Following each keypress, you will get feedback indicating whether you typed that character correctly.\n\n\n{}",
                            if *ready { "Press SPACE to proceed" } else { "" }
                        ),
                    ),
                    Screen::Intermission => (
                        WAITING_SCREEN,
                        Color::Black,
                        "A story is being prepared.\n\nGet ready...".to_string(),
                    ),
                    Screen::Credits => (
                        WAITING_SCREEN,
                        Color::Black,
                        "This concludes the experiment.".to_string(),
                    ),
                };

                Block::default()
                    .style(Style::default().bg(background))
                    .render(area, buf);

                let lines = text.lines().count() as u16;
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(area.width.saturating_sub(TEXT_COLUMNS * 2) / 2)
                    .constraints([
                        Constraint::Length(area.height.saturating_sub(lines) / 2),
                        Constraint::Min(lines),
                    ])
                    .split(area);

                Paragraph::new(text)
                    .style(Style::default().fg(foreground).bg(background).patch(bold_style))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(chunks[1], buf);
            }
            View::Typing {
                text,
                cursor,
                feedback,
            } => {
                Block::default()
                    .style(Style::default().bg(BACKGROUND))
                    .render(area, buf);

                let box_width = TEXT_COLUMNS + 2;
                let column = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Length(area.width.saturating_sub(box_width) / 2),
                        Constraint::Length(box_width),
                        Constraint::Min(0),
                    ])
                    .split(area)[1];

                let used = TEXT_ROWS + 2 + FEEDBACK_ROWS;
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(area.height.saturating_sub(used) / 2),
                        Constraint::Length(TEXT_ROWS + 2),
                        Constraint::Length(FEEDBACK_ROWS),
                        Constraint::Min(0),
                    ])
                    .split(column);

                let typed_style = Style::default().fg(Color::White).patch(bold_style);
                let untyped_style = Style::default().fg(Color::DarkGray).patch(bold_style);

                let chars: Vec<char> = text.chars().collect();
                let lines: Vec<Line> = wrap_lines(&chars, TEXT_COLUMNS as usize)
                    .into_iter()
                    .map(|range| {
                        let split = (*cursor).clamp(range.start, range.end);
                        let typed: String = chars[range.start..split].iter().collect();
                        let untyped: String = chars[split..range.end].iter().collect();
                        Line::from(vec![
                            Span::styled(typed, typed_style),
                            Span::styled(untyped, untyped_style),
                        ])
                    })
                    .collect();

                Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL))
                    .style(Style::default().bg(BACKGROUND))
                    .render(chunks[1], buf);

                let fill = match feedback {
                    Some(Feedback::Negative) => NEGATIVE_FEEDBACK,
                    _ => BACKGROUND,
                };
                Block::default()
                    .style(Style::default().bg(fill))
                    .render(chunks[2], buf);
            }
        }
    }
}

/// Renders the experiment into a ratatui terminal.
pub struct TerminalPresenter<B: Backend> {
    terminal: Terminal<B>,
    view: View,
}

impl<B: Backend> TerminalPresenter<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            view: View::default(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    fn draw(&mut self) -> Result<()> {
        let view = &self.view;
        self.terminal
            .draw(|f| f.render_widget(view, f.area()))
            .map_err(|e| ExperimentError::io("drawing the screen", e))?;
        Ok(())
    }
}

impl<B: Backend> Presenter for TerminalPresenter<B> {
    fn stimulus(&mut self, text: &TargetText, cursor: usize) -> Result<()> {
        let feedback = match &self.view {
            View::Typing { feedback, .. } => *feedback,
            View::Message(_) => None,
        };
        self.view = View::Typing {
            text: display_chars(text),
            cursor,
            feedback,
        };
        self.draw()
    }

    fn feedback(&mut self, feedback: Feedback) -> Result<()> {
        if let View::Typing { feedback: shown, .. } = &mut self.view {
            *shown = Some(feedback);
        }
        self.draw()
    }

    fn screen(&mut self, screen: Screen) -> Result<()> {
        self.view = View::Message(screen);
        self.draw()
    }
}
