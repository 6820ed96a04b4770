use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::report::{SessionReport, Verdict};
use crate::ui::theme::Theme;

pub struct ReportView<'a> {
    pub report: &'a SessionReport,
    pub theme: &'a Theme,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a SessionReport, theme: &'a Theme) -> Self {
        Self { report, theme }
    }
}

impl Widget for ReportView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let report = self.report;

        let title = match &report.boss_outcome {
            Some(outcome) => format!(" {} ", outcome.encounter),
            None => format!(" {} complete ", capitalized(report.mode.as_str())),
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(2),
                Constraint::Length(2),
            ])
            .split(inner);

        let headline_color = match report.verdict {
            Verdict::Flawless | Verdict::BossSlain => colors.success(),
            Verdict::Strong | Verdict::Survived => colors.accent(),
            Verdict::Fallen => colors.error(),
        };
        Paragraph::new(Line::from(Span::styled(
            report.headline(),
            Style::default()
                .fg(headline_color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        Paragraph::new(Line::from(Span::styled(
            report.summary_line(),
            Style::default().fg(colors.fg()),
        )))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

        let missed = if report.mistakes.is_empty() {
            Line::from(Span::styled(
                "  No words missed.",
                Style::default().fg(colors.success()),
            ))
        } else {
            let list = report
                .mistakes
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Line::from(vec![
                Span::styled("  Missed: ", Style::default().fg(colors.fg())),
                Span::styled(list, Style::default().fg(colors.error())),
            ])
        };
        Paragraph::new(missed)
            .wrap(Wrap { trim: false })
            .render(layout[2], buf);

        let mut help = Vec::new();
        if report.retest_offered {
            help.push(Span::styled(
                "  [r] Retest missed words ",
                Style::default().fg(colors.accent()),
            ));
        }
        help.push(Span::styled(
            "  [Enter/q] Menu ",
            Style::default().fg(colors.accent()),
        ));
        Paragraph::new(Line::from(help)).render(layout[3], buf);
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
