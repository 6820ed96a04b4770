use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::controller::Feedback;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// The cue currently on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CueView {
    pub index: usize,
    pub total: usize,
    pub display: String,
}

pub struct CuePanel<'a> {
    cue: &'a CueView,
    answer: &'a LineInput,
    feedback: Option<&'a Feedback>,
    theme: &'a Theme,
}

impl<'a> CuePanel<'a> {
    pub fn new(
        cue: &'a CueView,
        answer: &'a LineInput,
        feedback: Option<&'a Feedback>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            cue,
            answer,
            feedback,
            theme,
        }
    }
}

/// Split cue text into spans, highlighting each run of three or more
/// underscores as a blank.
fn cue_spans(display: &str, text: Color, blank: Color) -> Vec<Span<'static>> {
    let text_style = Style::default().fg(text);
    let blank_style = Style::default().fg(blank).add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut underscores = 0usize;

    let flush_underscores = |spans: &mut Vec<Span<'static>>, run: &mut String, n: usize| {
        if n >= 3 {
            if !run.is_empty() {
                spans.push(Span::styled(std::mem::take(run), text_style));
            }
            spans.push(Span::styled("_".repeat(n), blank_style));
        } else {
            run.push_str(&"_".repeat(n));
        }
    };

    for ch in display.chars() {
        if ch == '_' {
            underscores += 1;
            continue;
        }
        if underscores > 0 {
            flush_underscores(&mut spans, &mut run, underscores);
            underscores = 0;
        }
        run.push(ch);
    }
    if underscores > 0 {
        flush_underscores(&mut spans, &mut run, underscores);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, text_style));
    }
    spans
}

impl Widget for CuePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(
                " Word {} of {} ",
                self.cue.index + 1,
                self.cue.total
            ))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(Line::from(cue_spans(
            &self.cue.display,
            colors.cue(),
            colors.blank(),
        )))
        .wrap(Wrap { trim: true })
        .render(layout[0], buf);

        let answer_line = self.answer.styled_line(
            " > ",
            Style::default().fg(colors.accent()),
            Style::default().fg(colors.fg()),
            Style::default().fg(colors.bg()).bg(colors.accent()),
        );
        Paragraph::new(answer_line).render(layout[2], buf);

        let feedback_line = match self.feedback {
            Some(Feedback::Correct) => Line::from(Span::styled(
                " Correct!",
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD),
            )),
            Some(Feedback::Incorrect { expected }) => Line::from(vec![
                Span::styled(" Not quite. The word was ", Style::default().fg(colors.error())),
                Span::styled(
                    expected.to_string(),
                    Style::default()
                        .fg(colors.error())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(""),
        };
        Paragraph::new(feedback_line).render(layout[3], buf);
    }
}
