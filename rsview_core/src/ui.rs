//! User interface backends.

use crate::prelude::*;
use crate::view::line::Row;

pub mod term;

#[cfg(test)]
mod term_tests;

pub use term::TermUi;

/// The backend a view renders into.
pub trait Ui {
  /// Draw the grid rows, top line first.
  fn draw_text(&mut self, rows: &[Row]) -> IoResult<()>;

  /// Register a style spec under a style index, styles are later referenced by the `attr` of
  /// the drawn cells.
  fn syntax_style(&mut self, style: usize, spec: &str) -> IoResult<()>;
}
