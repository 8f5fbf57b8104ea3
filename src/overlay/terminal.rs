use std::io::{Stdout, stdout};
use std::str::FromStr;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use super::{Overlay, OverlayStyle, anchor_offset};
use crate::format::truncate_unicode;

const SHADOW_COLOR: Color = Color::DarkGray;

/// Draws the overlay line on a terminal, anchored like an on-screen display.
///
/// Pixel offsets map to terminal cells. A non-zero outline width draws a
/// border in the outline color; a font name containing "bold" turns on bold.
pub struct TerminalOverlay<B: Backend> {
    terminal: Terminal<B>,
    style: OverlayStyle,
    look: Look,
    color_name: String,
    text: String,
}

#[derive(Clone, Copy, Debug)]
struct Look {
    color: Color,
    outline: Color,
    modifier: Modifier,
}

impl TerminalOverlay<CrosstermBackend<Stdout>> {
    /// Takes over the terminal's alternate screen.
    pub fn open(style: OverlayStyle) -> Result<Self> {
        execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))
            .map_err(|err| eyre!("unable to create overlay: {err}"))?;
        Ok(Self::new(terminal, style))
    }

    /// Gives the screen back.
    pub fn close(self) -> Result<()> {
        drop(self.terminal);
        restore()
    }
}

/// Leaves the alternate screen and shows the cursor again. Safe to call when
/// no overlay is open.
pub fn restore() -> Result<()> {
    execute!(stdout(), cursor::Show, LeaveAlternateScreen)?;
    Ok(())
}

impl<B: Backend> TerminalOverlay<B> {
    pub fn new(terminal: Terminal<B>, style: OverlayStyle) -> Self {
        let color = parse_color(&style.color).unwrap_or(Color::Green);
        let outline = parse_color(&style.outline_color).unwrap_or(Color::Black);
        let modifier = if style.font.to_ascii_lowercase().contains("bold") {
            Modifier::BOLD
        } else {
            Modifier::empty()
        };
        Self {
            terminal,
            color_name: style.color.clone(),
            style,
            look: Look {
                color,
                outline,
                modifier,
            },
            text: String::new(),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn redraw(&mut self) -> Result<()> {
        let Self {
            terminal,
            style,
            look,
            text,
            ..
        } = self;
        terminal
            .draw(|frame| draw_line(frame, text, style, *look))
            .map_err(|err| eyre!("unable to draw overlay: {err}"))?;
        Ok(())
    }
}

impl<B: Backend> Overlay for TerminalOverlay<B> {
    fn set_color(&mut self, color: &str) -> Result<()> {
        if self.color_name == color {
            return Ok(());
        }
        self.color_name = color.to_string();
        if let Some(parsed) = parse_color(color) {
            self.look.color = parsed;
        }
        Ok(())
    }

    fn display(&mut self, text: &str) -> Result<()> {
        self.text.clear();
        self.text.push_str(text);
        self.redraw()
    }
}

fn parse_color(name: &str) -> Option<Color> {
    match Color::from_str(name) {
        Ok(color) => Some(color),
        Err(_) => {
            warn!(color = name, "unknown color name");
            None
        }
    }
}

fn draw_line(frame: &mut Frame, text: &str, style: &OverlayStyle, look: Look) {
    if text.is_empty() {
        return;
    }

    let area = frame.area();
    let border: u16 = if style.outline_width > 0 { 2 } else { 0 };
    let shadow = style.shadow;
    let usable_width = area.width.saturating_sub(shadow);
    let usable_height = area.height.saturating_sub(shadow);

    let text = truncate_unicode(text, usable_width.saturating_sub(border) as usize);
    let width = (text.width() as u16).saturating_add(border).min(usable_width);
    let height = (1 + border).min(usable_height);

    let x = anchor_offset(usable_width, width, style.horizontal.into(), style.hoffset);
    let y = anchor_offset(usable_height, height, style.vertical.into(), style.voffset);
    let rect = Rect::new(area.x + x, area.y + y, width, height);

    if shadow > 0 {
        let shadow_rect =
            Rect::new(rect.x + shadow, rect.y + shadow, width, height).intersection(area);
        frame.render_widget(
            line_widget(&text, border > 0, SHADOW_COLOR, SHADOW_COLOR, look.modifier),
            shadow_rect,
        );
    }
    frame.render_widget(
        line_widget(&text, border > 0, look.color, look.outline, look.modifier),
        rect,
    );
}

fn line_widget(
    text: &str,
    outlined: bool,
    color: Color,
    outline: Color,
    modifier: Modifier,
) -> Paragraph<'_> {
    let paragraph = Paragraph::new(text).style(Style::default().fg(color).add_modifier(modifier));
    if outlined {
        paragraph.block(Block::bordered().border_style(Style::default().fg(outline)))
    } else {
        paragraph
    }
}
