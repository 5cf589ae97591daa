//! Buffer utils for testing.

#![allow(unused_imports)]

use crate::buf::Text;

/// Make a buffer from text lines.
pub fn make_text_from_lines(lines: Vec<&str>) -> Text {
  let mut bytes: Vec<u8> = Vec::new();
  for line in lines.iter() {
    bytes.extend_from_slice(line.as_bytes());
  }
  Text::new(bytes)
}

/// Make a buffer from raw bytes.
pub fn make_text_from_bytes(bytes: &[u8]) -> Text {
  Text::new(bytes.to_vec())
}

/// Make an empty buffer.
pub fn make_empty_text() -> Text {
  Text::new(Vec::new())
}
