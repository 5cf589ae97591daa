//! Cursors and selections of a view.
//!
//! Every cursor tracks its buffer position through a mark, so it survives edits made
//! elsewhere. The grid coordinates (`row`, `col`, `line`) are only valid after the most recent
//! draw that found the cursor inside the viewport. A cursor optionally drives a selection: a
//! directed pair of marks whose orientation flips when the cursor crosses its anchor.

use crate::buf::{Mark, Text, TextRange};
use crate::view::View;

use std::sync::atomic::{AtomicI32, Ordering};

/// Cursor ID.
pub type CursorId = i32;

/// Next unique cursor ID.
///
/// NOTE: Start from 1.
fn next_cursor_id() -> CursorId {
  static VALUE: AtomicI32 = AtomicI32::new(1);
  VALUE.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Default)]
/// Per cursor register to support yank/put operations.
pub struct Register {
  content: Vec<u8>,
}

impl Register {
  /// Make new empty register.
  pub fn new() -> Self {
    Register {
      content: Vec::new(),
    }
  }

  /// Get the register content.
  pub fn content(&self) -> &[u8] {
    &self.content
  }

  /// Replace the register content.
  pub fn put(&mut self, content: &[u8]) {
    self.content = content.to_vec();
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// A selection: the fixed `anchor` endpoint where it was created, and the mobile `cursor`
/// endpoint that follows the owning cursor.
pub struct Selection {
  anchor: Mark,
  cursor: Mark,
}

impl Selection {
  /// Get the anchor mark.
  pub fn anchor(&self) -> Mark {
    self.anchor
  }

  /// Get the mobile end mark.
  pub fn cursor(&self) -> Mark {
    self.cursor
  }
}

#[derive(Debug, Clone)]
/// A cursor of a view.
pub struct Cursor {
  id: CursorId,
  // Mark keeping track of the position across edits.
  mark: Mark,
  // Cached position in bytes from the start of the buffer.
  pos: usize,
  // Zero based screen coordinates, valid after the most recent draw that found the cursor.
  row: usize,
  col: usize,
  // Remembered column used when moving across lines, cleared by horizontal motion.
  lastcol: Option<usize>,
  // Grid row on which the cursor currently resides.
  line: Option<usize>,
  // Selection (if any) which follows the cursor upon movement.
  sel: Option<Selection>,
  // Previously used selection marks, kept to restore it.
  lastsel: Option<(Mark, Mark)>,
  reg: Register,
}

impl Cursor {
  fn new(mark: Mark) -> Self {
    Cursor {
      id: next_cursor_id(),
      mark,
      pos: 0,
      row: 0,
      col: 0,
      lastcol: None,
      line: None,
      sel: None,
      lastsel: None,
      reg: Register::new(),
    }
  }

  /// Get the cursor ID.
  pub fn id(&self) -> CursorId {
    self.id
  }

  /// Get the position mark.
  pub fn mark(&self) -> Mark {
    self.mark
  }

  /// Get the cached byte position.
  pub fn pos(&self) -> usize {
    self.pos
  }

  /// Get the grid row index.
  pub fn row(&self) -> usize {
    self.row
  }

  /// Get the grid column index.
  pub fn col(&self) -> usize {
    self.col
  }

  /// Get the remembered column for vertical motion.
  pub fn lastcol(&self) -> Option<usize> {
    self.lastcol
  }

  /// Get the grid row currently holding the cursor, `None` when it is outside the viewport.
  pub fn line(&self) -> Option<usize> {
    self.line
  }

  /// Get the selection driven by this cursor.
  pub fn sel(&self) -> Option<Selection> {
    self.sel
  }

  /// Get the register.
  pub fn register(&self) -> &Register {
    &self.reg
  }

  // Refresh the cached position and grid coordinates.
  pub(crate) fn place(&mut self, pos: usize, row: usize, col: usize) {
    self.pos = pos;
    self.row = row;
    self.col = col;
    self.line = Some(row);
  }

  // Refresh the grid coordinates only.
  pub(crate) fn place_grid(&mut self, row: usize, col: usize) {
    self.row = row;
    self.col = col;
    self.line = Some(row);
  }

  // The cursor is not inside the viewport anymore.
  pub(crate) fn clear_grid(&mut self) {
    self.line = None;
  }
}

impl View {
  // Cursor access {

  /// Get a cursor.
  ///
  /// # Panics
  ///
  /// If the ID does not belong to this view.
  pub fn cursor(&self, id: CursorId) -> &Cursor {
    self.try_cursor(id).unwrap()
  }

  /// Try to get a cursor, non-panic version of [`cursor`](View::cursor).
  pub fn try_cursor(&self, id: CursorId) -> Option<&Cursor> {
    self.cursors.iter().find(|c| c.id == id)
  }

  fn cursor_mut(&mut self, id: CursorId) -> &mut Cursor {
    self.cursors.iter_mut().find(|c| c.id == id).unwrap()
  }

  /// Get the main cursor ID. The main cursor always exists and is always placed back into the
  /// visible viewport.
  pub fn main_cursor(&self) -> CursorId {
    self.main
  }

  /// Get all cursors, in no particular order.
  pub fn cursors(&self) -> impl Iterator<Item = &Cursor> {
    self.cursors.iter()
  }

  /// Get active cursors count.
  pub fn cursors_count(&self) -> usize {
    self.cursors.len()
  }

  /// Get the mutable register of a cursor.
  pub fn cursors_register(&mut self, id: CursorId) -> &mut Register {
    &mut self.cursor_mut(id).reg
  }

  /// Resolve the current position of a cursor, `None` once an edit dropped it.
  pub fn cursors_pos(&self, text: &Text, id: CursorId) -> Option<usize> {
    text.mark_get(self.cursor(id).mark)
  }

  // Cursor access }

  // Cursor lifecycle {

  /// Make new cursor at offset 0, it becomes the main cursor.
  pub fn cursors_new(&mut self, text: &mut Text) -> CursorId {
    let cursor = Cursor::new(text.mark_set(0));
    let id = cursor.id;
    self.cursors.push(cursor);
    self.main = id;
    id
  }

  /// Remove a cursor and its selection. Refuses to remove the last one.
  pub fn cursors_dispose(&mut self, text: &mut Text, id: CursorId) -> bool {
    if self.cursors.len() <= 1 {
      return false;
    }
    let Some(i) = self.cursors.iter().position(|c| c.id == id) else {
      return false;
    };
    self.cursors.remove(i);
    if self.main == id {
      self.main = self.cursors[i.min(self.cursors.len() - 1)].id;
    }
    self.draw(text);
    true
  }

  /// Remove all cursors except the main one.
  pub fn cursors_clear(&mut self, text: &mut Text) {
    let main = self.main;
    self.cursors.retain(|c| c.id == main);
    self.draw(text);
  }

  // Cursor lifecycle }

  // Cursor motion {

  /// Move the main cursor to the character at `pos` bytes from the begin of the buffer. If
  /// `pos` is not in the current viewport, redraw the view to make it visible.
  pub fn cursor_to(&mut self, text: &mut Text, pos: usize) {
    let id = self.main;
    self.cursors_to(text, id, pos);
  }

  /// Move a cursor to `pos`. For the main cursor the viewport is re-anchored when `pos` lies
  /// outside of it: first draft anchors at the begin of the target line, and when the line
  /// itself needs more space than the grid, directly at `pos`.
  pub fn cursors_to(&mut self, text: &mut Text, id: CursorId, pos: usize) {
    if id == self.main {
      self.cursor_mut(id).mark = text.mark_set(pos);

      let max = text.size();
      if pos == max && self.end != max {
        // Do not display an empty screen when showing the end of the buffer.
        self.start = pos;
        let up = (self.size.height() / 2) as usize;
        self.viewport_up(text, up);
      } else {
        for i in 0..2 {
          if pos >= self.start && pos <= self.end {
            break;
          }
          self.start = if i == 0 { text.line_begin(pos) } else { pos };
          self.draw(text);
        }
      }
    }

    self.cursor_update(text, id, pos);
  }

  /// Scroll the viewport one line at a time toward `pos` until it is in range, then move the
  /// cursor there. Only the main cursor scrolls the viewport.
  pub fn cursors_scroll_to(&mut self, text: &mut Text, id: CursorId, pos: usize) {
    if id == self.main {
      while pos < self.start && self.viewport_up(text, 1) {}
      while pos > self.end && self.viewport_down(text, 1) {}
    }
    self.cursors_to(text, id, pos);
  }

  /// Scroll the viewport toward `pos`, then move the main cursor there.
  pub fn scroll_to(&mut self, text: &mut Text, pos: usize) {
    let id = self.main;
    self.cursors_scroll_to(text, id, pos);
  }

  // Move a cursor, refreshing its mark, its selection endpoints and its grid coordinates.
  fn cursor_update(&mut self, text: &mut Text, id: CursorId, pos: usize) {
    {
      let cursor = self.cursor_mut(id);
      cursor.mark = text.mark_set(pos);
      if pos != cursor.pos {
        cursor.lastcol = None;
      }
      cursor.pos = pos;
    }

    if let Some(sel) = self.cursor(id).sel {
      if let (Some(mut anchor), Some(sel_cursor)) =
        (text.mark_get(sel.anchor), text.mark_get(sel.cursor))
      {
        // Does the orientation of the selection change?
        if pos < anchor && anchor < sel_cursor {
          // Right extend -> left extend: the anchored character moves over to the other side.
          anchor = text.char_next(anchor);
          self.cursor_mut(id).sel.as_mut().unwrap().anchor = text.mark_set(anchor);
        } else if sel_cursor < anchor && anchor <= pos {
          // Left extend -> right extend.
          anchor = text.char_prev(anchor);
          self.cursor_mut(id).sel.as_mut().unwrap().anchor = text.mark_set(anchor);
        }
        // The mobile end stays one character past the cursor while extending rightward.
        let end = if anchor <= pos {
          text.char_next(pos)
        } else {
          pos
        };
        self.cursor_mut(id).sel.as_mut().unwrap().cursor = text.mark_set(end);
      }
    }

    match self.coord(pos) {
      Some((row, col)) => {
        self.cursor_mut(id).place(pos, row, col);
        self.draw(text);
      }
      None => {
        if id == self.main {
          self.cursor_mut(id).place_grid(0, 0);
        }
      }
    }
  }

  /// Set/move a cursor to a given `(row, col)` grid position, returns the byte position it
  /// resolved to.
  ///
  /// For characters which use more than 1 column the cursor is placed on the left most cell,
  /// tab filler cells are skipped to the right.
  pub fn cursor_set(&mut self, text: &mut Text, id: CursorId, row: usize, col: usize) -> usize {
    let mut pos = self.start;
    // Byte offset at the begin of the given row.
    for r in 0..row {
      pos += self.lines[r].len();
    }

    let line = &self.lines[row];
    let mut col = col.min(self.size.width() as usize - 1);
    while col > 0 && line.cell(col).len() == 0 && !line.cell(col).is_tab() {
      col -= 1;
    }
    while col < line.width() && line.cell(col).len() == 0 && line.cell(col).is_tab() {
      col += 1;
    }

    // Offset within the row.
    for i in 0..col {
      pos += line.cell(i).len();
    }

    {
      let cursor = self.cursor_mut(id);
      cursor.col = col;
      cursor.row = row;
      cursor.line = Some(row);
    }
    self.cursor_update(text, id, pos);
    pos
  }

  /// Move a cursor one line up. Uses screen-line motion while the logical line is soft
  /// wrapped onto the neighbouring row, logical line motion otherwise; either way the
  /// remembered column is re-applied on the target row.
  pub fn line_up(&mut self, text: &mut Text, id: CursorId) -> usize {
    let (line, col, last, cur_pos) = {
      let cursor = self.cursor(id);
      (cursor.line, cursor.col, cursor.lastcol, cursor.pos)
    };
    let wrapped = match line {
      Some(row) if row > 0 => self.lines[row - 1].lineno() == self.lines[row].lineno(),
      _ => false,
    };
    if wrapped {
      return self.screenline_up(text, id);
    }
    let lastcol = last.unwrap_or(col);
    let pos = text.line_up(cur_pos);
    self.cursors_to(text, id, pos);
    if let Some(row) = self.cursor(id).line {
      self.cursor_set(text, id, row, lastcol);
    }
    self.cursor_mut(id).lastcol = Some(lastcol);
    self.cursor(id).pos
  }

  /// Move a cursor one line down, the mirror of [`line_up`](View::line_up).
  pub fn line_down(&mut self, text: &mut Text, id: CursorId) -> usize {
    let (line, col, last, cur_pos) = {
      let cursor = self.cursor(id);
      (cursor.line, cursor.col, cursor.lastcol, cursor.pos)
    };
    let wrapped = match line {
      Some(row) if row + 1 < self.lines.len() => {
        self.lines[row + 1].lineno() == self.lines[row].lineno()
      }
      _ => false,
    };
    if wrapped {
      return self.screenline_down(text, id);
    }
    let lastcol = last.unwrap_or(col);
    let pos = text.line_down(cur_pos);
    self.cursors_to(text, id, pos);
    if let Some(row) = self.cursor(id).line {
      self.cursor_set(text, id, row, lastcol);
    }
    self.cursor_mut(id).lastcol = Some(lastcol);
    self.cursor(id).pos
  }

  /// Move a cursor one screen line up, scrolling the viewport by one when it already sits on
  /// the top row. The remembered column is preserved across the motion.
  pub fn screenline_up(&mut self, text: &mut Text, id: CursorId) -> usize {
    let (line, col, last, cur_pos) = {
      let cursor = self.cursor(id);
      (cursor.line, cursor.col, cursor.lastcol, cursor.pos)
    };
    let lastcol = last.unwrap_or(col);
    match line {
      None => return cur_pos,
      Some(0) => {
        self.scroll_up(text, 1);
      }
      Some(_) => {}
    }
    if let Some(row) = self.cursor(id).line {
      if row > 0 {
        self.cursor_set(text, id, row - 1, lastcol);
      }
    }
    self.cursor_mut(id).lastcol = Some(lastcol);
    self.cursor(id).pos
  }

  /// Move a cursor one screen line down, scrolling the viewport by one when it already sits
  /// on the bottom row. The remembered column is preserved across the motion.
  pub fn screenline_down(&mut self, text: &mut Text, id: CursorId) -> usize {
    let (line, col, last, cur_pos) = {
      let cursor = self.cursor(id);
      (cursor.line, cursor.col, cursor.lastcol, cursor.pos)
    };
    let lastcol = last.unwrap_or(col);
    let bottom = self.bottomline();
    match line {
      None => return cur_pos,
      Some(row) if row == bottom => {
        self.scroll_down(text, 1);
      }
      Some(_) => {}
    }
    if let Some(row) = self.cursor(id).line {
      if row < self.bottomline() {
        self.cursor_set(text, id, row + 1, lastcol);
      }
    }
    self.cursor_mut(id).lastcol = Some(lastcol);
    self.cursor(id).pos
  }

  /// Move a cursor to the begin of its screen line.
  pub fn screenline_begin(&mut self, text: &mut Text, id: CursorId) -> usize {
    match self.cursor(id).line {
      Some(row) => self.cursor_set(text, id, row, 0),
      None => self.cursor(id).pos,
    }
  }

  /// Move a cursor to the middle of its screen line.
  pub fn screenline_middle(&mut self, text: &mut Text, id: CursorId) -> usize {
    match self.cursor(id).line {
      Some(row) => {
        let col = self.lines[row].width() / 2;
        self.cursor_set(text, id, row, col)
      }
      None => self.cursor(id).pos,
    }
  }

  /// Move a cursor to the end of its screen line.
  pub fn screenline_end(&mut self, text: &mut Text, id: CursorId) -> usize {
    match self.cursor(id).line {
      Some(row) => {
        let col = self.lines[row].width().saturating_sub(1);
        self.cursor_set(text, id, row, col)
      }
      None => self.cursor(id).pos,
    }
  }

  /// Get the 1-based logical line number and display column of the main cursor, columns
  /// summed up across soft-wrapped rows.
  pub fn cursor_getpos(&self) -> (usize, usize) {
    let cursor = self.cursor(self.main);
    let Some(mut row) = cursor.line else {
      return (1, 1);
    };
    let lineno = self.lines[row].lineno();
    let mut col = cursor.col;
    while row > 0 && self.lines[row - 1].lineno() == lineno {
      row -= 1;
      col += self.lines[row].width();
    }
    (lineno, col + 1)
  }

  // Cursor motion }

  // Selections {

  /// Start a selection anchored at the current cursor position. Does nothing when the cursor
  /// already drives one.
  pub fn selection_start(&mut self, text: &mut Text, id: CursorId) {
    if self.cursor(id).sel.is_some() {
      return;
    }
    let Some(pos) = text.mark_get(self.cursor(id).mark) else {
      return;
    };
    let next = text.char_next(pos);
    self.cursor_mut(id).sel = Some(Selection {
      anchor: text.mark_set(pos),
      cursor: text.mark_set(next),
    });
    self.draw(text);
  }

  /// Free the selection of a cursor, remembering its endpoints for a later restore.
  pub fn selection_clear(&mut self, text: &mut Text, id: CursorId) {
    self.selection_free(id);
    self.draw(text);
  }

  fn selection_free(&mut self, id: CursorId) {
    let cursor = self.cursor_mut(id);
    if let Some(sel) = cursor.sel.take() {
      cursor.lastsel = Some((sel.anchor, sel.cursor));
    }
  }

  /// Restore the previously cleared selection of a cursor, when its endpoints still resolve.
  pub fn selection_restore(&mut self, text: &mut Text, id: CursorId) {
    if self.cursor(id).sel.is_some() {
      return;
    }
    let Some((last_anchor, last_cursor)) = self.cursor(id).lastsel else {
      return;
    };
    let (Some(anchor), Some(cursor)) =
      (text.mark_get(last_anchor), text.mark_get(last_cursor))
    else {
      return;
    };
    let range = TextRange::new(anchor, cursor);
    self.cursor_mut(id).sel = Some(Selection {
      anchor: text.mark_set(range.start()),
      cursor: text.mark_set(range.end()),
    });
    self.selection_sync(text, id);
    self.draw(text);
  }

  /// Exchange the two endpoints of the selection, the cursor moves onto the new mobile end.
  pub fn selection_swap(&mut self, text: &mut Text, id: CursorId) {
    let Some(sel) = self.cursor(id).sel else {
      return;
    };
    self.cursor_mut(id).sel = Some(Selection {
      anchor: sel.cursor,
      cursor: sel.anchor,
    });
    self.selection_sync(text, id);
  }

  /// Place the cursor onto the mobile end of its selection.
  pub fn selection_sync(&mut self, text: &mut Text, id: CursorId) {
    let Some(sel) = self.cursor(id).sel else {
      return;
    };
    let (Some(anchor), Some(mut cursor)) =
      (text.mark_get(sel.anchor), text.mark_get(sel.cursor))
    else {
      return;
    };
    let right_extending = anchor < cursor;
    if right_extending {
      cursor = text.char_prev(cursor);
    }
    self.cursors_to(text, id, cursor);
  }

  /// Get the normalized buffer range covered by the selection of a cursor.
  pub fn selection_get(&self, text: &Text, id: CursorId) -> Option<TextRange> {
    let sel = self.cursor(id).sel?;
    let anchor = text.mark_get(sel.anchor)?;
    let cursor = text.mark_get(sel.cursor)?;
    Some(TextRange::new(anchor, cursor))
  }

  /// Cover `range` with the selection of a cursor, creating one when needed. The current
  /// extend direction is preserved.
  pub fn selection_set(&mut self, text: &mut Text, id: CursorId, range: &TextRange) {
    let left_extending = match self.cursor(id).sel {
      Some(sel) => match (text.mark_get(sel.anchor), text.mark_get(sel.cursor)) {
        (Some(anchor), Some(cursor)) => anchor > cursor,
        _ => false,
      },
      None => false,
    };
    let (anchor, cursor) = if left_extending {
      (range.end(), range.start())
    } else {
      (range.start(), range.end())
    };
    self.cursor_mut(id).sel = Some(Selection {
      anchor: text.mark_set(anchor),
      cursor: text.mark_set(cursor),
    });
    self.draw(text);
  }

  /// Free the selections of all cursors.
  pub fn selections_clear(&mut self, text: &mut Text) {
    let ids: Vec<CursorId> = self.cursors.iter().map(|c| c.id).collect();
    for id in ids {
      self.selection_free(id);
    }
    self.draw(text);
  }

  // Selections }
}
