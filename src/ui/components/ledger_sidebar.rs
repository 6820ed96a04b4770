use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::word::Word;
use crate::ui::theme::Theme;

/// Most-missed words with their counts.
pub struct LedgerSidebar<'a> {
    entries: &'a [(Word, u32)],
    theme: &'a Theme,
}

impl<'a> LedgerSidebar<'a> {
    pub fn new(entries: &'a [(Word, u32)], theme: &'a Theme) -> Self {
        Self { entries, theme }
    }
}

impl Widget for LedgerSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Most missed ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = if self.entries.is_empty() {
            vec![Line::from(Span::styled(
                " Nothing yet",
                Style::default().fg(colors.accent_dim()),
            ))]
        } else {
            self.entries
                .iter()
                .take(inner.height as usize)
                .map(|(word, count)| {
                    Line::from(vec![
                        Span::styled(
                            format!(" {count:>3} "),
                            Style::default()
                                .fg(colors.error())
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(word.to_string(), Style::default().fg(colors.fg())),
                    ])
                })
                .collect()
        };
        Paragraph::new(lines).render(inner, buf);
    }
}
