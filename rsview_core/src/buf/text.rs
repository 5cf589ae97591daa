//! Byte-addressed text content with stable marks.
//!
//! The buffer stores raw bytes, not chars: file contents are rendered as-is, including invalid
//! UTF-8 sequences, so all addressing here is byte-based. Positions held across an edit are only
//! meaningful through [`Mark`] tokens, plain byte offsets are invalidated by every mutation.

use crate::prelude::*;

/// Opaque token that keeps resolving to the byte offset of the originally marked content, or
/// to nothing once an edit dropped that content.
pub type Mark = u64;

/// The `[start,end)` byte range inside a buffer, always normalized with `start <= end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextRange {
  start: usize,
  end: usize,
}

impl TextRange {
  /// Make new range from two byte offsets in no particular order.
  pub fn new(a: usize, b: usize) -> Self {
    TextRange {
      start: a.min(b),
      end: a.max(b),
    }
  }

  /// Get start offset (inclusive).
  pub fn start(&self) -> usize {
    self.start
  }

  /// Get end offset (exclusive).
  pub fn end(&self) -> usize {
    self.end
  }

  /// Whether the range is well-formed, i.e. the start does not lie past the end.
  /// [`new`](TextRange::new) normalizes its endpoints, so constructed ranges always are; kept
  /// for callers probing ranges assembled from raw offsets.
  pub fn is_valid(&self) -> bool {
    self.start <= self.end
  }

  /// Whether the range covers zero bytes.
  pub fn is_empty(&self) -> bool {
    self.end <= self.start
  }

  /// Whether the position is inside the range.
  pub fn contains(&self, pos: usize) -> bool {
    self.start <= pos && pos < self.end
  }

  /// Get covered bytes count.
  pub fn len(&self) -> usize {
    self.end - self.start
  }
}

#[derive(Debug, Copy, Clone)]
enum MarkState {
  // Still resolvable at the byte offset.
  At(usize),
  // The marked content was deleted.
  Gone,
}

#[derive(Debug, Clone, Default)]
/// The text buffer.
///
/// Mutations keep the mark table up to date: a mark placed before an edit is unaffected, a mark
/// at/after an insertion shifts right with the inserted bytes, a mark inside a deleted range
/// resolves to nothing afterwards, a mark after it shifts left.
pub struct Text {
  bytes: Vec<u8>,
  marks: HashMap<Mark, MarkState>,
  next_mark: Mark,
}

impl Text {
  /// Make new buffer from raw content.
  pub fn new(bytes: Vec<u8>) -> Self {
    Text {
      bytes,
      marks: HashMap::new(),
      next_mark: 1,
    }
  }

  /// Get content size in bytes.
  pub fn size(&self) -> usize {
    self.bytes.len()
  }

  /// Get up to `max` bytes starting at `pos`. Out-of-range parts are clamped away.
  pub fn bytes_get(&self, pos: usize, max: usize) -> &[u8] {
    let start = pos.min(self.bytes.len());
    let end = pos.saturating_add(max).min(self.bytes.len());
    &self.bytes[start..end]
  }

  /// Get the byte at `pos`.
  pub fn byte(&self, pos: usize) -> Option<u8> {
    self.bytes.get(pos).copied()
  }

  // Marks {

  /// Place a mark at `pos`, clamped to the buffer size.
  pub fn mark_set(&mut self, pos: usize) -> Mark {
    let mark = self.next_mark;
    self.next_mark += 1;
    self
      .marks
      .insert(mark, MarkState::At(pos.min(self.bytes.len())));
    mark
  }

  /// Resolve a mark to its current byte offset, `None` once the marked content is gone or the
  /// mark was never placed in this buffer.
  pub fn mark_get(&self, mark: Mark) -> Option<usize> {
    match self.marks.get(&mark) {
      Some(MarkState::At(pos)) => Some(*pos),
      _ => None,
    }
  }

  // Marks }

  // Mutations {

  /// Insert bytes at `pos`.
  pub fn insert(&mut self, pos: usize, data: &[u8]) {
    let pos = pos.min(self.bytes.len());
    let tail = self.bytes.split_off(pos);
    self.bytes.extend_from_slice(data);
    self.bytes.extend_from_slice(&tail);
    for state in self.marks.values_mut() {
      if let MarkState::At(p) = state {
        if *p >= pos {
          *p += data.len();
        }
      }
    }
  }

  /// Delete a byte range.
  pub fn delete(&mut self, range: TextRange) {
    let start = range.start().min(self.bytes.len());
    let end = range.end().min(self.bytes.len());
    if start >= end {
      return;
    }
    self.bytes.drain(start..end);
    for state in self.marks.values_mut() {
      if let MarkState::At(p) = state {
        if *p >= end {
          *p -= end - start;
        } else if *p >= start {
          *state = MarkState::Gone;
        }
      }
    }
  }

  // Mutations }

  // Lines {

  /// Get 1-based logical line number at `pos`.
  pub fn lineno_by_pos(&self, pos: usize) -> usize {
    let pos = pos.min(self.bytes.len());
    1 + self.bytes[..pos].iter().filter(|b| **b == b'\n').count()
  }

  /// Get the begin offset of the line containing `pos`.
  pub fn line_begin(&self, pos: usize) -> usize {
    let pos = pos.min(self.bytes.len());
    match self.bytes[..pos].iter().rposition(|b| *b == b'\n') {
      Some(nl) => nl + 1,
      None => 0,
    }
  }

  // Get the offset of the `\n` ending the line containing `pos`, or the buffer size on the
  // last line.
  fn line_end(&self, pos: usize) -> usize {
    let pos = pos.min(self.bytes.len());
    match self.bytes[pos..].iter().position(|b| *b == b'\n') {
      Some(nl) => pos + nl,
      None => self.bytes.len(),
    }
  }

  /// Move `pos` one logical line up, keeping the byte column clamped to the target line. Stays
  /// put on the first line.
  pub fn line_up(&self, pos: usize) -> usize {
    let begin = self.line_begin(pos);
    if begin == 0 {
      return pos.min(self.bytes.len());
    }
    let col = pos.min(self.bytes.len()) - begin;
    let prev_begin = self.line_begin(begin - 1);
    let prev_len = (begin - 1) - prev_begin;
    self.char_begin(prev_begin + col.min(prev_len))
  }

  /// Move `pos` one logical line down, keeping the byte column clamped to the target line.
  /// Stays put on the last line.
  pub fn line_down(&self, pos: usize) -> usize {
    let end = self.line_end(pos);
    if end >= self.bytes.len() {
      return pos.min(self.bytes.len());
    }
    let col = pos.min(self.bytes.len()) - self.line_begin(pos);
    let next_begin = end + 1;
    let next_len = self.line_end(next_begin) - next_begin;
    self.char_begin(next_begin + col.min(next_len))
  }

  // Lines }

  // Chars {

  // Align `pos` down to the begin of the UTF-8 sequence it points into.
  fn char_begin(&self, pos: usize) -> usize {
    let mut pos = pos.min(self.bytes.len());
    while pos > 0 && pos < self.bytes.len() && self.bytes[pos] & 0xC0 == 0x80 {
      pos -= 1;
    }
    pos
  }

  /// Move `pos` to the begin of the next UTF-8 sequence, clamped to the buffer size.
  pub fn char_next(&self, pos: usize) -> usize {
    if pos >= self.bytes.len() {
      return self.bytes.len();
    }
    let mut pos = pos + 1;
    while pos < self.bytes.len() && self.bytes[pos] & 0xC0 == 0x80 {
      pos += 1;
    }
    pos
  }

  /// Move `pos` to the begin of the previous UTF-8 sequence, clamped to 0.
  pub fn char_prev(&self, pos: usize) -> usize {
    if pos == 0 {
      return 0;
    }
    let mut pos = pos.min(self.bytes.len()) - 1;
    while pos > 0 && self.bytes[pos] & 0xC0 == 0x80 {
      pos -= 1;
    }
    pos
  }

  // Chars }

  /// Make a byte iterator at `pos`.
  pub fn iterator(&self, pos: usize) -> TextIterator<'_> {
    TextIterator { text: self, pos }
  }

  /// Find the matching bracket for the byte at `pos`, skipping the bracket symbols listed in
  /// `except`. Returns `pos` when there is nothing to match.
  pub fn bracket_match_except(&self, pos: usize, except: &str) -> usize {
    let Some(b) = self.byte(pos) else {
      return pos;
    };
    if except.as_bytes().contains(&b) {
      return pos;
    }
    match b {
      b'(' => self.bracket_forward(pos, b'(', b')'),
      b'[' => self.bracket_forward(pos, b'[', b']'),
      b'{' => self.bracket_forward(pos, b'{', b'}'),
      b'<' => self.bracket_forward(pos, b'<', b'>'),
      b')' => self.bracket_backward(pos, b'(', b')'),
      b']' => self.bracket_backward(pos, b'[', b']'),
      b'}' => self.bracket_backward(pos, b'{', b'}'),
      b'>' => self.bracket_backward(pos, b'<', b'>'),
      b'"' | b'\'' | b'`' => self.quote_match(pos, b),
      _ => pos,
    }
  }

  fn bracket_forward(&self, pos: usize, open: u8, close: u8) -> usize {
    let mut depth = 0_usize;
    for (i, b) in self.bytes.iter().enumerate().skip(pos) {
      if *b == open {
        depth += 1;
      } else if *b == close {
        depth -= 1;
        if depth == 0 {
          return i;
        }
      }
    }
    pos
  }

  fn bracket_backward(&self, pos: usize, open: u8, close: u8) -> usize {
    let mut depth = 0_usize;
    for i in (0..=pos).rev() {
      let b = self.bytes[i];
      if b == close {
        depth += 1;
      } else if b == open {
        depth -= 1;
        if depth == 0 {
          return i;
        }
      }
    }
    pos
  }

  // Quotes have no nesting, pair with the next occurrence, or the previous one when the
  // current quote is the last.
  fn quote_match(&self, pos: usize, quote: u8) -> usize {
    match self.bytes.iter().skip(pos + 1).position(|b| *b == quote) {
      Some(i) => pos + 1 + i,
      None => match self.bytes[..pos].iter().rposition(|b| *b == quote) {
        Some(i) => i,
        None => pos,
      },
    }
  }
}

impl From<&str> for Text {
  fn from(value: &str) -> Self {
    Text::new(value.as_bytes().to_vec())
  }
}

#[derive(Debug, Clone)]
/// Byte iterator over a buffer, movable in both directions.
pub struct TextIterator<'a> {
  text: &'a Text,
  pos: usize,
}

impl<'a> TextIterator<'a> {
  /// Get the byte at the current position.
  pub fn byte_get(&self) -> Option<u8> {
    self.text.byte(self.pos)
  }

  /// Move one byte forward, then get it.
  pub fn byte_next(&mut self) -> Option<u8> {
    if self.pos >= self.text.size() {
      return None;
    }
    self.pos += 1;
    self.byte_get()
  }

  /// Move one byte backward, then get it.
  pub fn byte_prev(&mut self) -> Option<u8> {
    if self.pos == 0 {
      return None;
    }
    self.pos -= 1;
    self.byte_get()
  }

  /// Get the current position.
  pub fn pos(&self) -> usize {
    self.pos
  }
}
