use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// Boss health gauge. Turns the enraged colour once the boss is low.
pub struct HealthBar<'a> {
    pub label: String,
    pub percent: u32,
    pub enraged: bool,
    pub theme: &'a Theme,
}

impl<'a> HealthBar<'a> {
    pub fn new(label: &str, percent: u32, enraged: bool, theme: &'a Theme) -> Self {
        Self {
            label: label.to_string(),
            percent: percent.min(100),
            enraged,
            theme,
        }
    }

    fn filled_width(&self, width: u16) -> u16 {
        (u32::from(width) * self.percent / 100) as u16
    }
}

impl Widget for HealthBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let border = if self.enraged {
            colors.bar_enraged()
        } else {
            colors.border()
        };

        let block = Block::bordered()
            .title(format!(" {} ", self.label))
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let fill = if self.enraged {
            colors.bar_enraged()
        } else {
            colors.bar_filled()
        };
        let filled_width = self.filled_width(inner.width);
        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(fill)
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let label = format!("{}%", self.percent);
        let label_x = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        buf.set_string(
            label_x,
            inner.y,
            &label,
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        );
    }
}
