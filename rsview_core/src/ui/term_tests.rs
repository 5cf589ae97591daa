use super::term::{parse_style, TermUi};
use crate::buf::Text;
use crate::coord::U16Size;
use crate::syn::SymbolFlags;
use crate::test::log::init as test_log_init;
use crate::ui::Ui;
use crate::view::View;

use crossterm::style::{Attribute, Color};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

#[test]
fn parse_style1() {
  let style = parse_style("fg:red,bg:blue,bold");
  assert_eq!(style.foreground_color, Some(Color::DarkRed));
  assert_eq!(style.background_color, Some(Color::DarkBlue));
  assert!(style.attributes.has(Attribute::Bold));
  assert!(!style.attributes.has(Attribute::Italic));
}

#[test]
fn parse_style2() {
  let style = parse_style("fg:#A0B0C0, underlined , reverse");
  assert_eq!(
    style.foreground_color,
    Some(Color::Rgb {
      r: 0xA0,
      g: 0xB0,
      b: 0xC0
    })
  );
  assert!(style.attributes.has(Attribute::Underlined));
  assert!(style.attributes.has(Attribute::Reverse));
}

#[test]
fn parse_style3() {
  let style = parse_style("fg:42,unknown-token");
  assert_eq!(style.foreground_color, Some(Color::AnsiValue(42)));
  assert_eq!(style.background_color, None);
}

#[test]
fn syntax_style1() {
  let mut ui = TermUi::new(Vec::new());
  ui.syntax_style(1, "fg:green,bold").unwrap();
  let style = ui.style(1).unwrap();
  assert_eq!(style.foreground_color, Some(Color::DarkGreen));
  assert!(style.attributes.has(Attribute::Bold));
  assert!(ui.style(2).is_none());
}

#[test]
fn draw_text1() {
  test_log_init();
  let sink = SharedSink::default();
  let mut text = Text::from("hi\nthere");
  let mut view = View::new(&mut text, None);
  view.symbols_set(SymbolFlags::all());
  view.set_ui(Box::new(TermUi::new(sink.clone())));
  view.resize(&mut text, U16Size::new(8, 2));

  let bytes = sink.0.lock().unwrap().clone();
  let out = String::from_utf8_lossy(&bytes);
  info!("payload:{:?}", out);
  assert!(out.contains("hi"));
  assert!(out.contains("there"));
}

#[test]
fn draw_text_skips_continuations1() {
  test_log_init();
  let sink = SharedSink::default();
  let mut text = Text::from("\u{4F60}x");
  let mut view = View::new(&mut text, None);
  view.set_ui(Box::new(TermUi::new(sink.clone())));
  view.resize(&mut text, U16Size::new(4, 1));

  let bytes = sink.0.lock().unwrap().clone();
  let out = String::from_utf8_lossy(&bytes);
  info!("payload:{:?}", out);
  // The wide glyph is printed once, its continuation column emits nothing.
  assert!(out.contains("\u{4F60}x"));
}
