//! The draw pass: stream buffer bytes into the viewport grid.
//!
//! One pass reads up to `width * height` bytes from the anchor, decodes them into display
//! cells (tab expansion, wide glyphs, control-char escaping, CRLF folding, U+FFFD replacement
//! for invalid sequences), interleaves the syntax regex matches to attribute cell runs, and
//! finally applies the selection and cursor overlays. The grid is a pure function of the
//! buffer content and the view configuration; overlays are applied post hoc, cursor overlays
//! win where they coincide with selections.

use crate::buf::{Text, TextRange};
use crate::syn::{SymbolKind, Syntax};
use crate::view::cell::Cell;
use crate::view::View;

use compact_str::{CompactString, ToCompactString};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{error, trace};
use unicode_width::UnicodeWidthChar;

// One scanned character of the working buffer.
enum Scan {
  // A decoded char and its encoded byte length.
  Char(char, usize),
  // An invalid sequence spanning this many bytes, up to the next UTF-8 lead byte.
  Invalid(usize),
  // The buffer ends in the middle of a sequence.
  Incomplete,
}

fn scan_char(bytes: &[u8]) -> Scan {
  debug_assert!(!bytes.is_empty());
  let prefix = &bytes[..bytes.len().min(4)];
  match std::str::from_utf8(prefix) {
    Ok(s) => {
      let ch = s.chars().next().unwrap();
      Scan::Char(ch, ch.len_utf8())
    }
    Err(e) if e.valid_up_to() > 0 => {
      let s = std::str::from_utf8(&prefix[..e.valid_up_to()]).unwrap();
      let ch = s.chars().next().unwrap();
      Scan::Char(ch, ch.len_utf8())
    }
    Err(e) if e.error_len().is_none() => Scan::Incomplete,
    Err(_) => {
      let mut len = 1_usize;
      while len < bytes.len() && bytes[len] & 0xC0 == 0x80 {
        len += 1;
      }
      Scan::Invalid(len)
    }
  }
}

// Match window of one syntax rule, relative to the working buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RuleWindow {
  // Known match span; `Span(0, 0)` means the rule needs a (re-)search.
  Span(usize, usize),
  // No further match anywhere in the working buffer.
  Done,
}

// Interleaves the regex matches of the syntax rules with the decoded char stream.
struct SyntaxOverlay {
  syntax: Arc<Syntax>,
  windows: SmallVec<[RuleWindow; 8]>,
  // Index of the rule whose match currently covers the stream.
  active: Option<usize>,
}

impl SyntaxOverlay {
  fn new(syntax: Arc<Syntax>) -> Self {
    let windows = syntax.rules().iter().map(|_| RuleWindow::Span(0, 0)).collect();
    SyntaxOverlay {
      syntax,
      windows,
      active: None,
    }
  }

  // The style attribute for the char at working-buffer offset `off`.
  fn attr_at(&mut self, buf: &[u8], off: usize) -> usize {
    if let Some(active) = self.active {
      let RuleWindow::Span(_, eo) = self.windows[active] else {
        unreachable!()
      };
      if off >= eo {
        // End of the current match: rules whose window overlaps the just-ended region must
        // search again.
        self.active = None;
        for window in self.windows.iter_mut() {
          if let RuleWindow::Span(so, eo) = *window {
            if so <= off && off < eo {
              *window = RuleWindow::Span(0, 0);
            }
          }
        }
      }
    }

    if self.active.is_none() {
      for (i, rule) in self.syntax.rules().iter().enumerate() {
        match self.windows[i] {
          RuleWindow::Done => continue,
          RuleWindow::Span(_, eo) if off >= eo => {
            // Past the recorded match, continue the search from the current position. A
            // zero-width match cannot make progress and exhausts the rule.
            match rule.regex().find(&buf[off..]) {
              Some(m) if m.start() != m.end() => {
                self.windows[i] = RuleWindow::Span(off + m.start(), off + m.end());
              }
              _ => {
                self.windows[i] = RuleWindow::Done;
                continue;
              }
            }
          }
          RuleWindow::Span(_, _) => { /* Still usable. */ }
        }
        if let RuleWindow::Span(so, eo) = self.windows[i] {
          if so <= off && off < eo {
            // Within the matched expression; the first rule in declaration order wins.
            self.active = Some(i);
            break;
          }
        }
      }
    }

    match self.active {
      Some(i) => self.syntax.rules()[i].style(),
      None => 0,
    }
  }
}

impl View {
  /// Redraw the complete grid with data starting from `start` bytes into the buffer. Stops
  /// once the grid is full, updates `end` and `lastline`, then applies the selection and
  /// cursor overlays and hands the grid to the UI backend.
  pub fn draw(&mut self, text: &mut Text) {
    self.clear(text);

    // Current absolute buffer position.
    let mut pos = self.start;
    // Number of bytes to read in one go.
    let text_len = self.size.width() as usize * self.size.height() as usize;
    // Working buffer.
    let mut buf = text.bytes_get(pos, text_len).to_vec();
    // Current offset into the working buffer from which to interpret a character.
    let mut cur = 0_usize;
    let mut overlay = self.syntax.clone().map(SyntaxOverlay::new);

    while cur < buf.len() {
      let attr = match overlay.as_mut() {
        Some(overlay) => overlay.attr_at(&buf, cur),
        None => 0,
      };

      let (ch, len, width) = match scan_char(&buf[cur..]) {
        Scan::Char(ch, len) => {
          let width = if ch == '\0' {
            0
          } else {
            UnicodeWidthChar::width(ch).unwrap_or(1)
          };
          (ch, len, width)
        }
        Scan::Invalid(len) => ('\u{FFFD}', len, 1),
        Scan::Incomplete => {
          // Not enough bytes available to decode the sequence: refill from the current
          // position and restart at the buffer begin. When the buffer itself ends here the
          // partial sequence is rendered as the replacement character instead.
          let refilled = text.bytes_get(pos, text_len);
          if refilled.len() > buf.len() - cur {
            buf = refilled.to_vec();
            cur = 0;
            continue;
          }
          ('\u{FFFD}', buf.len() - cur, 1)
        }
      };

      // Fold the two-byte `\r\n` newline into a single eol cell with `len` 2.
      let (ch, len, width) = if buf[cur] == b'\r' && cur + 1 < buf.len() && buf[cur + 1] == b'\n'
      {
        ('\n', 2, 1)
      } else {
        (ch, len, width)
      };

      if !self.addch(ch, len, width, attr) {
        break;
      }

      pos += len;
      cur += len;
    }

    // Set end of the viewed region.
    self.end = pos;
    self.lastline = self.cur_line.unwrap_or_else(|| self.bottomline());
    if let Some(row) = self.cur_line {
      let width = self.size.width() as usize;
      self.lines[row].fill_blank(self.cur_col, width);
    }

    // Rows below the content show the end-of-buffer symbol in their first column.
    let eof = self.symbols[SymbolKind::Eof as usize].clone();
    let width = self.size.width() as usize;
    for row in (self.lastline + 1)..=self.bottomline() {
      let line = &mut self.lines[row];
      *line.cell_mut(0) = Cell::new(eof.symbol().clone(), 0, 1, eof.style());
      line.fill_blank(1, width);
      line.set_width(1);
      line.set_len(0);
    }

    self.draw_selections(text);
    self.draw_cursors(text);

    if let Some(ui) = self.ui.as_mut() {
      if let Err(e) = ui.draw_text(&self.lines) {
        error!("Failed to draw view content: {e:?}");
      }
    }
  }

  // Reset the grid and re-resolve the anchor before a draw pass.
  //
  // When the anchor moved since the last draw the mark is reset to the new position;
  // otherwise the anchor is resolved from the mark, so edits above the viewport keep it
  // attached to the same content.
  fn clear(&mut self, text: &mut Text) {
    if self.start != self.start_last {
      self.start_mark = text.mark_set(self.start);
    } else if let Some(start) = text.mark_get(self.start_mark) {
      self.start = start;
    }
    self.start_last = self.start;
    for row in self.lines.iter_mut() {
      row.reset();
    }
    let lineno = text.lineno_by_pos(self.start);
    self.lines[0].set_lineno(lineno);
    self.lastline = 0;
    self.cur_line = Some(0);
    self.cur_col = 0;
  }

  // Try to add another character to the grid, returns whether there was space left.
  fn addch(&mut self, ch: char, len: usize, width: usize, attr: usize) -> bool {
    let Some(mut row) = self.cur_line else {
      return false;
    };
    let view_width = self.size.width() as usize;
    let lineno = self.lines[row].lineno();

    match ch {
      '\t' => {
        let tab = self.symbols[SymbolKind::Tab as usize].clone();
        let fill = self.symbols[SymbolKind::TabFill as usize].clone();
        let expand = self.tabwidth - (self.cur_col % self.tabwidth);
        for w in 0..expand {
          if self.cur_col + 1 > view_width {
            if row == self.bottomline() {
              self.cur_line = None;
              return false;
            }
            row += 1;
            self.cur_line = Some(row);
            self.cur_col = 0;
            self.lines[row].set_lineno(lineno);
          }
          let symbol = if w == 0 { &tab } else { &fill };
          let mut cell = Cell::new(
            symbol.symbol().clone(),
            if w == 0 { len } else { 0 },
            1,
            symbol.style(),
          );
          cell.set_tab(true);
          let col = self.cur_col;
          self.lines[row].put(col, cell);
          self.cur_col += 1;
        }
        true
      }
      '\n' => {
        if self.cur_col + 1 > view_width {
          if row == self.bottomline() {
            self.cur_line = None;
            return false;
          }
          row += 1;
          self.cur_line = Some(row);
          self.cur_col = 0;
          self.lines[row].set_lineno(lineno);
        }
        let eol = self.symbols[SymbolKind::Eol as usize].clone();
        let col = self.cur_col;
        self
          .lines[row]
          .put(col, Cell::new(eol.symbol().clone(), len, 1, eol.style()));
        self.lines[row].fill_blank(col + 1, view_width);
        if row == self.bottomline() {
          self.cur_line = None;
        } else {
          row += 1;
          self.cur_line = Some(row);
          self.lines[row].set_lineno(lineno + 1);
        }
        self.cur_col = 0;
        true
      }
      _ => {
        // Non-printable ascii chars render as ^ plus the shifted letter, two columns wide.
        let (symbol, cont, len, width, attr) = if (ch as u32) < 0x20 {
          let letter = ((ch as u8) + 0x40) as char;
          let cont = Cell::new(letter.to_compact_string(), 0, 0, attr);
          (CompactString::const_new("^"), Some(cont), len, 2, attr)
        } else if ch == ' ' {
          let space = self.symbols[SymbolKind::Space as usize].clone();
          (space.symbol().clone(), None, len, width, space.style())
        } else {
          (ch.to_compact_string(), None, len, width, attr)
        };

        // A glyph wider than the whole grid still has to fit one row.
        let width = width.min(view_width);

        if self.cur_col + width > view_width {
          let col = self.cur_col;
          self.lines[row].fill_blank(col, view_width);
          if row == self.bottomline() {
            self.cur_line = None;
            self.cur_col = 0;
            return false;
          }
          row += 1;
          self.cur_line = Some(row);
          self.cur_col = 0;
        }

        self.lines[row].set_lineno(lineno);
        let col = self.cur_col;
        self.lines[row].put(col, Cell::new(symbol, len, width, attr));
        self.cur_col += 1;
        // Mark cells of a character which uses multiple columns.
        for i in 1..width {
          let col = self.cur_col;
          let cell = match (i, cont.as_ref()) {
            (1, Some(cont)) => cont.clone(),
            _ => Cell::unused(),
          };
          self.lines[row].put(col, cell);
          self.cur_col += 1;
        }
        true
      }
    }
  }

  // Mark the cells covered by each selection, then report the drawn ranges.
  fn draw_selections(&mut self, text: &Text) {
    let mut drawn: Vec<TextRange> = Vec::new();
    for i in 0..self.cursors.len() {
      let Some(sel) = self.cursors[i].sel() else {
        continue;
      };
      let (Some(anchor), Some(cursor)) =
        (text.mark_get(sel.anchor()), text.mark_get(sel.cursor()))
      else {
        continue;
      };
      let range = TextRange::new(anchor, cursor);
      let start_coord = self.coord(range.start());
      let end_coord = self.coord(range.end());
      if start_coord.is_some() || end_coord.is_some() {
        let (start_row, start_col) = start_coord.unwrap_or((0, 0));
        let (end_row, end_col) =
          end_coord.unwrap_or_else(|| (self.lastline, self.lines[self.lastline].width()));
        for row in start_row..=end_row {
          let from = if row == start_row { start_col } else { 0 };
          let to = if row == end_row {
            end_col
          } else {
            self.lines[row].width()
          };
          for col in from..to.min(self.size.width() as usize) {
            self.lines[row].cell_mut(col).set_selected(true);
          }
        }
      }
      drawn.push(range);
    }
    if let Some(events) = self.events.as_mut() {
      for range in drawn {
        events.selection(range);
      }
    }
  }

  // Refresh every cursor's grid position and mark its cell; the main cursor snaps to the top
  // left corner when its position left the viewport.
  fn draw_cursors(&mut self, text: &Text) {
    for i in 0..self.cursors.len() {
      let resolved = text.mark_get(self.cursors[i].mark());
      match resolved.and_then(|pos| self.coord(pos).map(|coord| (pos, coord))) {
        Some((pos, (row, col))) => {
          self.cursors[i].place(pos, row, col);
          if col < self.size.width() as usize {
            self.lines[row].cell_mut(col).set_cursor(true);
          }
          if self.ui.is_some() && self.syntax.is_some() {
            let matched = text.bracket_match_except(pos, "<>");
            if matched != pos {
              if let Some((mrow, mcol)) = self.coord(matched) {
                if mcol < self.size.width() as usize {
                  self.lines[mrow].cell_mut(mcol).set_selected(true);
                }
              }
            }
          }
        }
        None => {
          if self.cursors[i].id() == self.main {
            trace!("Main cursor left the viewport, snap to the top left corner");
            self.cursors[i].place_grid(0, 0);
          } else {
            self.cursors[i].clear_grid();
          }
        }
      }
    }
  }
}
