//! Viewport over a text buffer.
//!
//! The view lays the buffer bytes starting at its anchor out into a rectangular grid of
//! display cells (see [`draw`](View::draw)), and keeps a set of cursors with optional
//! selections placed inside that grid. The buffer itself is borrowed per operation: the view
//! never owns it, and positions are carried across edits through buffer marks only.

use crate::buf::{Mark, Text, TextRange};
use crate::coord::U16Size;
use crate::syn::{
  symbol_default, symbol_none, SymbolFlags, SymbolKind, Syntax, SyntaxSymbol, SYMBOL_COUNT,
};
use crate::ui::Ui;
use crate::view::cursors::{Cursor, CursorId};
use crate::view::line::Row;

use compact_str::CompactString;
use std::sync::Arc;
use tracing::error;

pub mod cell;
pub mod cursors;
pub mod draw;
pub mod line;


/// Receiver of view events.
pub trait ViewEvents {
  /// A selection was drawn, covering the given buffer range.
  fn selection(&mut self, range: TextRange);
}

/// Viewable area showing part of a buffer.
///
/// At all times there exists at least one cursor, the main one, which is placed back into the
/// visible viewport by every operation. Additional cursors can be created and positioned
/// anywhere in the buffer.
pub struct View {
  // Size of the display area.
  size: U16Size,
  // Currently displayed area `[start, end)` in bytes from the start of the buffer.
  start: usize,
  end: usize,
  // Previously used start of the visible area, detects when the anchor mark must be reset.
  start_last: usize,
  // Mark keeping track of the start of the visible area across edits.
  start_mark: Mark,
  // Grid rows, `height` of them; index 0 is the top line.
  lines: Vec<Row>,
  // Last row populated by the current draw, always <= `height - 1`.
  lastline: usize,
  // Row/column where the next char will be drawn, `None` once the grid is full.
  cur_line: Option<usize>,
  cur_col: usize,
  // How many display columns a tab character expands to.
  tabwidth: usize,
  // Resolved symbols for whitespace etc.
  symbols: [SyntaxSymbol; SYMBOL_COUNT],
  symbol_flags: SymbolFlags,
  // Syntax highlighting definitions for this view.
  syntax: Option<Arc<Syntax>>,
  // UI backend handle.
  ui: Option<Box<dyn Ui>>,
  events: Option<Box<dyn ViewEvents>>,
  // All cursors currently active, the `main` one is always kept in the viewport.
  cursors: Vec<Cursor>,
  main: CursorId,
}

impl View {
  /// Make new view over a buffer, with one cursor at offset 0 and a 1x1 grid. Callers resize
  /// it to the real dimensions afterwards.
  pub fn new(text: &mut Text, events: Option<Box<dyn ViewEvents>>) -> Self {
    let mut view = View {
      size: U16Size::default(),
      start: 0,
      end: 0,
      start_last: 0,
      start_mark: text.mark_set(0),
      lines: Vec::new(),
      lastline: 0,
      cur_line: None,
      cur_col: 0,
      tabwidth: crate::defaults::view::TAB_WIDTH,
      symbols: SymbolKind::ALL.map(symbol_none),
      symbol_flags: SymbolFlags::empty(),
      syntax: None,
      ui: None,
      events,
      cursors: Vec::new(),
      main: 0,
    };
    view.cursors_new(text);
    view.resize(text, U16Size::new(1, 1));
    view.cursor_to(text, 0);
    view
  }

  /// Attach the UI backend.
  pub fn set_ui(&mut self, ui: Box<dyn Ui>) {
    self.ui = Some(ui);
  }

  /// Rebind the view to a (new) buffer: drop all selections, reset the anchor, move the main
  /// cursor back to offset 0.
  pub fn reload(&mut self, text: &mut Text) {
    self.start = 0;
    self.start_last = 0;
    self.start_mark = text.mark_set(0);
    self.selections_clear(text);
    self.cursor_to(text, 0);
  }

  /// Resize the display area and redraw. The grid backing store only ever grows.
  pub fn resize(&mut self, text: &mut Text, size: U16Size) {
    debug_assert!(size.width() > 0 && size.height() > 0);
    self.size = size;
    for row in self.lines.iter_mut() {
      row.resize(size.width() as usize);
    }
    while self.lines.len() < size.height() as usize {
      self.lines.push(Row::new(size.width() as usize));
    }
    self.lines.truncate(size.height() as usize);
    self.draw(text);
  }

  /// Set the tab display width and redraw.
  pub fn tabwidth_set(&mut self, text: &mut Text, tabwidth: usize) {
    debug_assert!(tabwidth > 0);
    self.tabwidth = tabwidth;
    self.draw(text);
  }

  /// Get the tab display width.
  pub fn tabwidth(&self) -> usize {
    self.tabwidth
  }

  /// Get the display area size.
  pub fn size(&self) -> U16Size {
    self.size
  }

  /// Get display width.
  pub fn width(&self) -> u16 {
    self.size.width()
  }

  /// Get display height.
  pub fn height(&self) -> u16 {
    self.size.height()
  }

  /// Get the currently displayed byte range.
  pub fn viewport(&self) -> TextRange {
    TextRange::new(self.start, self.end)
  }

  /// Get the grid rows, top line first.
  pub fn lines(&self) -> &[Row] {
    &self.lines
  }

  /// Get the index of the last row populated by the most recent draw.
  pub fn lastline(&self) -> usize {
    self.lastline
  }

  // Index of the bottom allocated row.
  pub(crate) fn bottomline(&self) -> usize {
    self.size.height() as usize - 1
  }

  // Symbols {

  /// Select which symbol categories render with their visible glyph. A set bit picks the
  /// syntax-provided glyph when there is one, the built-in default otherwise; a cleared bit
  /// picks the invisible glyph.
  pub fn symbols_set(&mut self, flags: SymbolFlags) {
    for kind in SymbolKind::ALL {
      let i = kind as usize;
      self.symbols[i] = if flags.contains(kind.flag()) {
        match self.syntax.as_ref().and_then(|s| s.symbols()[i].clone()) {
          Some(symbol) => symbol,
          None => symbol_default(kind),
        }
      } else {
        symbol_none(kind)
      };
    }
    self.symbol_flags = flags;
  }

  /// Get the enabled symbol categories.
  pub fn symbols_get(&self) -> SymbolFlags {
    self.symbol_flags
  }

  // Symbols }

  // Syntax {

  /// Set the syntax definition, resolve the symbol table from it and register its styles with
  /// the UI backend.
  pub fn syntax_set(&mut self, syntax: Option<Arc<Syntax>>) {
    self.syntax = syntax;
    let mut flags = SymbolFlags::empty();
    for kind in SymbolKind::ALL {
      let i = kind as usize;
      match self.syntax.as_ref().and_then(|s| s.symbols()[i].clone()) {
        Some(symbol) => {
          self.symbols[i] = symbol;
          flags.insert(kind.flag());
        }
        None => self.symbols[i] = symbol_none(kind),
      }
    }
    self.symbol_flags = flags;

    if let Some(syntax) = self.syntax.clone() {
      if let Some(ui) = self.ui.as_mut() {
        for (i, style) in syntax.styles().iter().enumerate() {
          if let Err(e) = ui.syntax_style(i, style) {
            error!("Failed to register syntax style {i}: {e:?}");
          }
        }
      }
    }
  }

  /// Get the syntax definition.
  pub fn syntax_get(&self) -> Option<Arc<Syntax>> {
    self.syntax.clone()
  }

  // Syntax }

  // Coordinate map {

  /// Map a byte offset inside the displayed range onto its grid position.
  ///
  /// Returns `(row, col)`, or `None` when `pos` is outside `[start, end]`. The column is the
  /// first cell of the character containing `pos`, continuation columns are skipped over.
  pub fn coord(&self, pos: usize) -> Option<(usize, usize)> {
    if pos < self.start || pos > self.end {
      return None;
    }

    let mut cur = self.start;
    let mut row = 0_usize;
    while row != self.lastline && cur < pos {
      let len = self.lines[row].len();
      if cur + len > pos {
        break;
      }
      cur += len;
      row += 1;
    }

    let line = &self.lines[row];
    let max_col = (self.size.width() as usize).min(line.width());
    let mut col = 0_usize;
    while cur < pos && col < max_col {
      cur += line.cell(col).len();
      // Skip over columns occupied by the same character.
      col += 1;
      while col < max_col && line.cell(col).len() == 0 {
        col += 1;
      }
    }

    Some((row, col))
  }

  // Coordinate map }

  // Viewport navigation {

  /// Advance the viewport by `n` screen lines. Refuses at the end of the buffer.
  pub fn viewport_down(&mut self, text: &mut Text, n: usize) -> bool {
    if self.end == text.size() {
      return false;
    }
    if n >= self.size.height() as usize {
      self.start = self.end;
    } else {
      for row in 0..n {
        self.start += self.lines[row].len();
      }
    }
    self.draw(text);
    true
  }

  /// Move the viewport `n` logical lines back. Refuses at the begin of the buffer.
  ///
  /// Scrolling up is somewhat tricky because the line starts above the viewport are unknown,
  /// so scan backwards counting newlines, but stop at a reasonable maximum in case the buffer
  /// contains no newlines at all.
  pub fn viewport_up(&mut self, text: &mut Text, n: usize) -> bool {
    if self.start == 0 {
      return false;
    }
    let max = self.size.width() as usize * self.size.height() as usize;
    let mut n = n as isize;
    let mut it = text.iterator(self.start - 1);
    let Some(mut c) = it.byte_get() else {
      return false;
    };
    let mut off = 0_usize;
    // Skip newlines immediately before the display area.
    if c == b'\n' {
      if let Some(prev) = it.byte_prev() {
        off += 1;
        c = prev;
      }
    }
    if c == b'\r' {
      if let Some(prev) = it.byte_prev() {
        off += 1;
        c = prev;
      }
    }
    loop {
      if c == b'\n' {
        n -= 1;
        if n == 0 {
          break;
        }
      }
      off += 1;
      if off > max {
        break;
      }
      match it.byte_prev() {
        Some(prev) => c = prev,
        None => break,
      }
    }
    if c == b'\r' {
      off += 1;
    }
    self.start = self.start.saturating_sub(off);
    self.draw(text);
    true
  }

  /// Slide the viewport down by `n` lines and keep the main cursor on its screen position,
  /// clamping it onto the grid when it would fall off.
  pub fn scroll_up(&mut self, text: &mut Text, n: usize) -> usize {
    let id = self.main;
    if self.viewport_up(text, n) {
      let row = match self.cursor(id).line() {
        Some(row) => row.min(self.lastline),
        None => self.lastline,
      };
      let col = self.cursor(id).col();
      self.cursor_set(text, id, row, col);
    } else {
      self.cursor_to(text, 0);
    }
    self.cursor(id).pos()
  }

  /// Slide the viewport up by `n` lines and keep the main cursor on its screen position,
  /// clamping it onto the grid when it would fall off.
  pub fn scroll_down(&mut self, text: &mut Text, n: usize) -> usize {
    let id = self.main;
    if self.viewport_down(text, n) {
      let row = self.cursor(id).line().unwrap_or(0);
      let col = self.cursor(id).col();
      self.cursor_set(text, id, row, col);
    } else {
      let max = text.size();
      self.cursor_to(text, max);
    }
    self.cursor(id).pos()
  }

  /// Slide the viewport content up `n` lines, keeping the main cursor visible by moving it one
  /// screen line down when it would leave the grid.
  pub fn slide_up(&mut self, text: &mut Text, n: usize) -> usize {
    let id = self.main;
    if self.viewport_down(text, n) {
      if self.cursor(id).line() == Some(0) {
        let col = self.cursor(id).col();
        self.cursor_set(text, id, 0, col);
      } else {
        let pos = self.cursor(id).pos();
        self.cursor_to(text, pos);
      }
    } else {
      self.screenline_down(text, id);
    }
    self.cursor(id).pos()
  }

  /// Slide the viewport content down `n` lines, keeping the main cursor visible by moving it
  /// one screen line up when it would leave the grid.
  pub fn slide_down(&mut self, text: &mut Text, n: usize) -> usize {
    let id = self.main;
    if self.viewport_up(text, n) {
      if self.cursor(id).line() == Some(self.lastline) {
        let col = self.cursor(id).col();
        let row = self.lastline;
        self.cursor_set(text, id, row, col);
      } else {
        let pos = self.cursor(id).pos();
        self.cursor_to(text, pos);
      }
    } else {
      self.screenline_up(text, id);
    }
    self.cursor(id).pos()
  }

  /// Re-anchor the viewport so the main cursor line becomes the top line.
  pub fn redraw_top(&mut self, text: &mut Text) {
    let Some(row) = self.cursor(self.main).line() else {
      return;
    };
    for r in 0..row {
      self.start += self.lines[r].len();
    }
    self.draw(text);
    let pos = self.cursor(self.main).pos();
    self.cursor_to(text, pos);
  }

  /// Re-anchor the viewport so the main cursor line sits in the middle of the grid.
  ///
  /// Recentering may itself reflow the grid, so iterate twice to converge.
  pub fn redraw_center(&mut self, text: &mut Text) {
    let center = (self.size.height() / 2) as usize;
    let pos = self.cursor(self.main).pos();
    for _ in 0..2 {
      let mut linenr = self.cursor(self.main).line().unwrap_or(0);
      if linenr < center {
        self.slide_down(text, center - linenr);
        continue;
      }
      let mut row = 0_usize;
      while row < self.cursor(self.main).line().unwrap_or(0) && linenr > center {
        self.start += self.lines[row].len();
        row += 1;
        linenr -= 1;
      }
      break;
    }
    self.draw(text);
    self.cursor_to(text, pos);
  }

  /// Re-anchor the viewport so the main cursor line becomes the bottom line.
  pub fn redraw_bottom(&mut self, text: &mut Text) {
    let Some(row) = self.cursor(self.main).line() else {
      return;
    };
    if row == self.lastline {
      return;
    }
    let pos = self.cursor(self.main).pos();
    self.slide_down(text, self.size.height() as usize - row - 1);
    self.cursor_to(text, pos);
  }

  /// Get the byte position at the begin of the 1-based `n`-th screen line.
  pub fn screenline_goto(&self, n: usize) -> usize {
    let mut pos = self.start;
    let mut n = n;
    let mut row = 0_usize;
    while n > 1 && row != self.lastline {
      pos += self.lines[row].len();
      row += 1;
      n -= 1;
    }
    pos
  }

  // Viewport navigation }

  /// Get raw symbols of all cells.
  ///
  /// NOTE: This method is mostly for debugging and testing.
  pub fn raw_symbols(&self) -> Vec<Vec<CompactString>> {
    self
      .lines
      .iter()
      .map(|row| row.cells().iter().map(|c| c.symbol().clone()).collect())
      .collect()
  }

  /// Get raw symbols of all cells, with printable placeholder for empty symbol ("").
  ///
  /// NOTE: This method is mostly for debugging and testing.
  pub fn raw_symbols_with_placeholder(&self, printable: CompactString) -> Vec<Vec<CompactString>> {
    self
      .lines
      .iter()
      .map(|row| {
        row
          .cells()
          .iter()
          .map(|c| {
            if c.symbol().is_empty() {
              printable.clone()
            } else {
              c.symbol().clone()
            }
          })
          .collect()
      })
      .collect()
  }
}

impl std::fmt::Debug for View {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("View")
      .field("size", &self.size)
      .field("start", &self.start)
      .field("end", &self.end)
      .field("lastline", &self.lastline)
      .field("tabwidth", &self.tabwidth)
      .field("cursors", &self.cursors)
      .finish_non_exhaustive()
  }
}

// Test helper, keep the grid comparable against expected row strings.
#[cfg(test)]
impl View {
  pub(crate) fn rendered_rows(&self) -> Vec<String> {
    self
      .raw_symbols()
      .iter()
      .map(|row| row.join(""))
      .collect()
  }
}
