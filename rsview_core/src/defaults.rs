//! Default options.

pub mod view {
  /// How many display columns a tab character uses, by default is 8.
  pub const TAB_WIDTH: usize = 8;
}
