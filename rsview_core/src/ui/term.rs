//! Terminal UI backend on top of crossterm.

use crate::prelude::*;
use crate::ui::Ui;
use crate::view::line::Row;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
  Attribute, Color, ContentStyle, PrintStyledContent, StyledContent,
};
use std::io::Write;

/// Renders view grids into a terminal (or any writer speaking its escape sequences).
///
/// Styles are registered through [`Ui::syntax_style`] with a small comma-separated spec
/// grammar: `fg:<color>`, `bg:<color>`, `bold`, `dim`, `italic`, `underlined`, `reverse`.
/// Colors are named ansi colors, `#rrggbb` values or 0-255 ansi indices. Cells flagged as
/// selected or holding a cursor render reversed.
pub struct TermUi<W: Write> {
  out: W,
  origin: U16Pos,
  styles: HashMap<usize, ContentStyle>,
}

impl<W: Write> TermUi<W> {
  /// Make new terminal UI writing to `out`, drawing at the top left corner.
  pub fn new(out: W) -> Self {
    TermUi {
      out,
      origin: geo::point!(x: 0_u16, y: 0_u16),
      styles: HashMap::new(),
    }
  }

  /// Set the top left corner the grid is drawn at.
  pub fn set_origin(&mut self, origin: U16Pos) {
    self.origin = origin;
  }

  /// Get a registered style.
  pub fn style(&self, index: usize) -> Option<&ContentStyle> {
    self.styles.get(&index)
  }
}

fn parse_color(name: &str) -> Option<Color> {
  if let Some(hex) = name.strip_prefix('#') {
    if hex.len() == 6 {
      let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
      let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
      let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
      return Some(Color::Rgb { r, g, b });
    }
    return None;
  }
  if let Ok(index) = name.parse::<u8>() {
    return Some(Color::AnsiValue(index));
  }
  match name {
    "black" => Some(Color::Black),
    "red" => Some(Color::DarkRed),
    "green" => Some(Color::DarkGreen),
    "yellow" => Some(Color::DarkYellow),
    "blue" => Some(Color::DarkBlue),
    "magenta" => Some(Color::DarkMagenta),
    "cyan" => Some(Color::DarkCyan),
    "white" => Some(Color::White),
    "grey" | "gray" => Some(Color::Grey),
    "bright-red" => Some(Color::Red),
    "bright-green" => Some(Color::Green),
    "bright-yellow" => Some(Color::Yellow),
    "bright-blue" => Some(Color::Blue),
    "bright-magenta" => Some(Color::Magenta),
    "bright-cyan" => Some(Color::Cyan),
    _ => None,
  }
}

/// Parse a style spec string, unknown tokens are skipped.
pub fn parse_style(spec: &str) -> ContentStyle {
  let mut style = ContentStyle::default();
  for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
    if let Some(color) = token.strip_prefix("fg:") {
      style.foreground_color = parse_color(color);
    } else if let Some(color) = token.strip_prefix("bg:") {
      style.background_color = parse_color(color);
    } else {
      match token {
        "bold" => style.attributes.set(Attribute::Bold),
        "dim" => style.attributes.set(Attribute::Dim),
        "italic" => style.attributes.set(Attribute::Italic),
        "underlined" | "underline" => style.attributes.set(Attribute::Underlined),
        "reverse" => style.attributes.set(Attribute::Reverse),
        _ => {}
      }
    }
  }
  style
}

impl<W: Write> Ui for TermUi<W> {
  fn draw_text(&mut self, rows: &[Row]) -> IoResult<()> {
    for (y, row) in rows.iter().enumerate() {
      queue!(
        self.out,
        MoveTo(self.origin.x(), self.origin.y() + y as u16)
      )?;
      for cell in row.cells() {
        if cell.symbol().is_empty() {
          // Continuation column, covered by the previous glyph.
          continue;
        }
        let mut style = self
          .styles
          .get(&cell.attr())
          .cloned()
          .unwrap_or_default();
        if cell.is_selected() || cell.is_cursor() {
          style.attributes.set(Attribute::Reverse);
        }
        queue!(
          self.out,
          PrintStyledContent(StyledContent::new(style, cell.symbol().as_str()))
        )?;
      }
    }
    self.out.flush()
  }

  fn syntax_style(&mut self, style: usize, spec: &str) -> IoResult<()> {
    self.styles.insert(style, parse_style(spec));
    Ok(())
  }
}
