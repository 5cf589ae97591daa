//! The RSVIEW demo binary: renders a file through the viewport engine the way the editor
//! would, then waits for a key before restoring the screen.

use rsview_core::buf::Text;
use rsview_core::prelude::*;
use rsview_core::syn::{SymbolFlags, Syntax, SyntaxRule};
use rsview_core::ui::TermUi;
use rsview_core::view::View;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::info;

#[derive(Debug, ThisError)]
/// Demo argument/IO error code implemented by [`thiserror::Error`].
enum CliErr {
  #[error("Failed to read {0:?}: {1}")]
  Read(PathBuf, IoErr),

  #[error("Invalid highlight pattern {0:?}: {1}")]
  Pattern(String, regex::Error),
}

#[derive(Debug, Parser)]
#[command(name = "rsview", about = "Render a file through the RSVIEW viewport engine.")]
struct Cli {
  /// File to render.
  file: PathBuf,

  /// Tab display width.
  #[arg(long, default_value_t = 8)]
  tabwidth: usize,

  /// Grid width, defaults to the terminal width.
  #[arg(long)]
  width: Option<u16>,

  /// Grid height, defaults to the terminal height.
  #[arg(long)]
  height: Option<u16>,

  /// Render whitespace/eol symbols visibly.
  #[arg(long)]
  symbols: bool,

  /// Highlight every match of this regex.
  #[arg(long)]
  highlight: Option<String>,

  /// Byte offset to place the cursor at.
  #[arg(long, default_value_t = 0)]
  cursor: usize,
}

fn main() -> AnyResult<()> {
  rsview_core::log::init();
  let cli = Cli::parse();

  let bytes =
    std::fs::read(&cli.file).map_err(|e| CliErr::Read(cli.file.clone(), e))?;
  let text = Arc::new(RwLock::new(Text::new(bytes)));

  let (term_width, term_height) = crossterm::terminal::size().unwrap_or((80, 24));
  let width = cli.width.unwrap_or(term_width).max(1);
  let height = cli.height.unwrap_or(term_height).max(1);

  execute!(std::io::stdout(), EnterAlternateScreen)?;
  enable_raw_mode()?;

  let result = render(&cli, &text, width, height);

  disable_raw_mode()?;
  execute!(std::io::stdout(), LeaveAlternateScreen)?;

  result
}

fn render(cli: &Cli, text: &Arc<RwLock<Text>>, width: u16, height: u16) -> AnyResult<()> {
  let mut text = text.write();

  let mut view = View::new(&mut text, None);
  view.set_ui(Box::new(TermUi::new(std::io::stdout())));

  if let Some(pattern) = &cli.highlight {
    let regex = regex::bytes::Regex::new(pattern)
      .map_err(|e| CliErr::Pattern(pattern.clone(), e))?;
    let syntax = Syntax::new(
      "highlight",
      vec![SyntaxRule::new(regex, 1)],
      vec![String::new(), "fg:red,bold".to_string()],
    );
    view.syntax_set(Some(Arc::new(syntax)));
  }
  view.symbols_set(if cli.symbols {
    SymbolFlags::all()
  } else {
    SymbolFlags::empty()
  });

  view.tabwidth_set(&mut text, cli.tabwidth.max(1));
  view.resize(&mut text, U16Size::new(width, height));
  let cursor = cli.cursor.min(text.size());
  view.cursor_to(&mut text, cursor);
  info!("view:{:?}", view);

  // Any key restores the screen.
  crossterm::event::read()?;
  Ok(())
}
