//! Text buffers.

pub mod text;


pub use text::{Mark, Text, TextIterator, TextRange};
