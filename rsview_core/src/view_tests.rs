#![allow(unused_imports)]

use crate::buf::{Text, TextRange};
use crate::coord::U16Size;
use crate::syn::{SymbolFlags, SymbolKind, Syntax, SyntaxRule, SyntaxSymbol};
use crate::test::buf::{make_empty_text, make_text_from_bytes, make_text_from_lines};
use crate::test::log::init as test_log_init;
use crate::ui::TermUi;
use crate::view::View;

use regex::bytes::Regex;
use std::sync::Arc;
use tracing::info;

fn make_view(text: &mut Text, width: u16, height: u16) -> View {
  let mut view = View::new(text, None);
  view.symbols_set(SymbolFlags::all());
  view.resize(text, U16Size::new(width, height));
  view
}

fn do_test_rendered_rows(view: &View, expect: &[&str]) {
  let actual = view.rendered_rows();
  info!("actual:{}", actual.len());
  for a in actual.iter() {
    info!("{:?}", a);
  }
  info!("expect:{}", expect.len());
  for e in expect.iter() {
    info!("{:?}", e);
  }
  assert_eq!(actual.len(), expect.len());
  for i in 0..actual.len() {
    assert_eq!(&actual[i], expect[i], "row {i}");
  }
}

// Every populated row accounts its cells exactly, and the viewed byte range matches the grid.
fn do_check_grid(view: &View) {
  for row in view.lines().iter() {
    let cells_len: usize = row.cells().iter().map(|c| c.len()).sum();
    assert_eq!(cells_len, row.len());
    let cells_width: usize = row.cells().iter().map(|c| c.width()).sum();
    assert_eq!(cells_width, row.width());
    assert!(row.width() <= view.width() as usize);
  }
  let total: usize = view.lines().iter().map(|r| r.len()).sum();
  assert_eq!(view.viewport().len(), total);
}

// Every char boundary inside the viewport maps onto a grid position and back.
fn do_check_roundtrip(view: &mut View, text: &mut Text) {
  let range = view.viewport();
  let id = view.main_cursor();
  let mut pos = range.start();
  while pos < range.end() {
    let (row, col) = view.coord(pos).unwrap();
    let got = view.cursor_set(text, id, row, col);
    assert_eq!(got, pos, "roundtrip at pos {pos} row {row} col {col}");
    pos = text.char_next(pos);
  }
}

#[test]
fn draw_plain1() {
  test_log_init();
  let mut text = Text::from("hello\nworld");
  let mut view = make_view(&mut text, 10, 2);
  let expect = vec!["hello\u{23CE}    ", "world     "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].len(), 6);
  assert_eq!(view.lines()[1].len(), 5);
  assert_eq!(view.viewport().start(), 0);
  assert_eq!(view.viewport().end(), 11);
  let main = view.main_cursor();
  assert_eq!(view.cursor(main).row(), 0);
  assert_eq!(view.cursor(main).col(), 0);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_tab1() {
  test_log_init();
  let mut text = Text::from("AB\tCD");
  let mut view = View::new(&mut text, None);
  view.symbols_set(SymbolFlags::all());
  view.tabwidth_set(&mut text, 4);
  view.resize(&mut text, U16Size::new(4, 2));
  let expect = vec!["AB\u{25B6} ", "CD  "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].len(), 3);
  assert_eq!(view.lines()[1].len(), 2);
  assert_eq!(view.viewport().end(), 5);
  let tab = view.lines()[0].cell(2);
  assert_eq!(tab.len(), 1);
  assert_eq!(tab.width(), 1);
  assert!(tab.is_tab());
  let fill = view.lines()[0].cell(3);
  assert_eq!(fill.len(), 0);
  assert!(fill.is_tab());
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_tab_at_wrap1() {
  test_log_init();
  // The tab expansion stops at the row boundary, the consumed bytes do not change.
  let mut text = Text::from("ab\t");
  let mut view = View::new(&mut text, None);
  view.symbols_set(SymbolFlags::all());
  view.tabwidth_set(&mut text, 4);
  view.resize(&mut text, U16Size::new(4, 2));
  let expect = vec!["ab\u{25B6} ", "~   "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].width(), 4);
  assert_eq!(view.viewport().end(), 3);
  do_check_grid(&view);
}

#[test]
fn draw_tab_cross_wrap1() {
  test_log_init();
  // A tab whose expansion crosses the view width continues on the next row, with the same
  // logical line number.
  let mut text = Text::from("abc\tx");
  let mut view = View::new(&mut text, None);
  view.symbols_set(SymbolFlags::all());
  view.tabwidth_set(&mut text, 8);
  view.resize(&mut text, U16Size::new(4, 3));
  // Expansion: 8 - 3 = 5 cells, one on row 0 and four on row 1.
  let expect = vec!["abc\u{25B6}", "    ", "x   "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].lineno(), 1);
  assert_eq!(view.lines()[1].lineno(), 1);
  assert_eq!(view.lines()[0].len(), 4);
  assert_eq!(view.lines()[1].len(), 0);
  assert_eq!(view.lines()[2].len(), 1);
  do_check_grid(&view);
}

#[test]
fn draw_invalid_utf8_1() {
  test_log_init();
  let mut text = make_text_from_bytes(b"\xFFxy");
  let mut view = make_view(&mut text, 6, 1);
  let expect = vec!["\u{FFFD}xy   "];
  do_test_rendered_rows(&view, &expect);
  let replaced = view.lines()[0].cell(0);
  assert_eq!(replaced.len(), 1);
  assert_eq!(replaced.width(), 1);
  assert_eq!(view.viewport().end(), 3);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_invalid_utf8_2() {
  test_log_init();
  // A broken multibyte prefix collapses into one replacement cell covering its bytes.
  let mut text = make_text_from_bytes(b"\xE4\xBDx");
  let mut view = make_view(&mut text, 6, 1);
  let expect = vec!["\u{FFFD}x    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].cell(0).len(), 2);
  assert_eq!(view.viewport().end(), 3);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_truncated_tail1() {
  test_log_init();
  // The buffer ends in the middle of a sequence, no refill can complete it.
  let mut text = make_text_from_bytes(b"a\xE4\xBD");
  let view = make_view(&mut text, 6, 1);
  let expect = vec!["a\u{FFFD}    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.viewport().end(), 3);
  do_check_grid(&view);
}

#[test]
fn draw_control1() {
  test_log_init();
  let mut text = make_text_from_bytes(b"a\x01b");
  let mut view = make_view(&mut text, 8, 1);
  let expect = vec!["a^Ab    "];
  do_test_rendered_rows(&view, &expect);
  let caret = view.lines()[0].cell(1);
  assert_eq!(caret.len(), 1);
  assert_eq!(caret.width(), 2);
  let letter = view.lines()[0].cell(2);
  assert_eq!(letter.len(), 0);
  assert_eq!(letter.width(), 0);
  assert_eq!(view.viewport().end(), 3);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_nul1() {
  test_log_init();
  let mut text = make_text_from_bytes(b"a\x00b");
  let mut view = make_view(&mut text, 8, 1);
  let expect = vec!["a^@b    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].cell(1).len(), 1);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_crlf1() {
  test_log_init();
  let mut text = Text::from("a\r\nb");
  let view = make_view(&mut text, 10, 2);
  let expect = vec!["a\u{23CE}        ", "b         "];
  do_test_rendered_rows(&view, &expect);
  let eol = view.lines()[0].cell(1);
  assert_eq!(eol.len(), 2);
  assert_eq!(eol.width(), 1);
  assert_eq!(view.lines()[0].len(), 3);
  assert_eq!(view.viewport().end(), 4);
  do_check_grid(&view);
}

#[test]
fn draw_lone_cr1() {
  test_log_init();
  // A carriage return not followed by a newline renders as a control char.
  let mut text = Text::from("a\rb");
  let view = make_view(&mut text, 8, 1);
  let expect = vec!["a^Mb    "];
  do_test_rendered_rows(&view, &expect);
  do_check_grid(&view);
}

#[test]
fn draw_softwrap1() {
  test_log_init();
  let mut text = Text::from("abcdefgh");
  let mut view = make_view(&mut text, 5, 3);
  let expect = vec!["abcde", "fgh  ", "~    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.lines()[0].len(), 5);
  assert_eq!(view.lines()[1].len(), 3);
  assert_eq!(view.lines()[0].lineno(), 1);
  assert_eq!(view.lines()[1].lineno(), 1);
  assert_eq!(view.viewport().end(), 8);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_wide1() {
  test_log_init();
  // Wide glyphs occupy two columns, the second one a continuation cell; one that does not
  // fit at the row end wraps as a whole.
  let mut text = Text::from("a\u{4F60}\u{597D}b");
  let mut view = make_view(&mut text, 4, 2);
  let expect = vec!["a\u{4F60} ", "\u{597D}b "];
  do_test_rendered_rows(&view, &expect);
  let wide = view.lines()[0].cell(1);
  assert_eq!(wide.len(), 3);
  assert_eq!(wide.width(), 2);
  let cont = view.lines()[0].cell(2);
  assert_eq!(cont.len(), 0);
  assert_eq!(cont.width(), 0);
  assert_eq!(view.lines()[0].lineno(), view.lines()[1].lineno());
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn draw_space_symbol1() {
  test_log_init();
  let mut text = Text::from("a b");
  let view = make_view(&mut text, 5, 1);
  let expect = vec!["a\u{00B7}b  "];
  do_test_rendered_rows(&view, &expect);
  do_check_grid(&view);
}

#[test]
fn draw_symbols_disabled1() {
  test_log_init();
  // With all symbol categories disabled, whitespace renders invisible and eof rows keep the
  // tilde.
  let mut text = Text::from("a b\nc");
  let mut view = View::new(&mut text, None);
  view.resize(&mut text, U16Size::new(5, 3));
  let expect = vec!["a b  ", "c    ", "~    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.symbols_get(), SymbolFlags::empty());
}

#[test]
fn draw_empty1() {
  test_log_init();
  let mut text = make_empty_text();
  let view = make_view(&mut text, 4, 3);
  let expect = vec!["    ", "~   ", "~   "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.viewport().start(), 0);
  assert_eq!(view.viewport().end(), 0);
  assert_eq!(view.lastline(), 0);
  do_check_grid(&view);
}

#[test]
fn draw_grid_mixed1() {
  test_log_init();
  // Tabs, wide glyphs, control chars and invalid bytes all in one grid.
  let mut bytes: Vec<u8> = Vec::new();
  bytes.extend_from_slice("first\tline\n".as_bytes());
  bytes.extend_from_slice(b"bad\xFFbyte\x02\n");
  bytes.extend_from_slice("wide \u{4F60}\u{597D} glyphs\n".as_bytes());
  bytes.extend_from_slice("the last line".as_bytes());
  let mut text = Text::new(bytes);
  let mut view = make_view(&mut text, 10, 8);
  do_check_grid(&view);
  do_check_roundtrip(&mut view, &mut text);
}

#[test]
fn mark_stability1() {
  test_log_init();
  // Edits above the viewport keep the anchor attached to the same content.
  let mut text = make_text_from_lines(vec!["aaa\n", "bbb\n", "ccc\n", "ddd\n"]);
  let mut view = make_view(&mut text, 10, 2);
  assert!(view.viewport_down(&mut text, 1));
  assert_eq!(view.viewport().start(), 4);
  let before = view.rendered_rows();

  text.insert(0, b"xx");
  view.draw(&mut text);
  assert_eq!(view.viewport().start(), 6);
  assert_eq!(view.rendered_rows(), before);

  text.delete(TextRange::new(0, 2));
  view.draw(&mut text);
  assert_eq!(view.viewport().start(), 4);
  assert_eq!(view.rendered_rows(), before);
}

#[test]
fn viewport_down_up1() {
  test_log_init();
  let mut text = make_text_from_lines(vec!["aaa\n", "bbb\n", "ccc\n", "ddd"]);
  let mut view = make_view(&mut text, 10, 2);
  assert_eq!(view.viewport(), TextRange::new(0, 8));

  assert!(view.viewport_down(&mut text, 1));
  assert_eq!(view.viewport(), TextRange::new(4, 12));
  let expect = vec!["bbb\u{23CE}      ", "ccc\u{23CE}      "];
  do_test_rendered_rows(&view, &expect);

  assert!(view.viewport_down(&mut text, 1));
  assert_eq!(view.viewport(), TextRange::new(8, 15));
  // At the end of the buffer, further scrolling is refused.
  assert!(!view.viewport_down(&mut text, 1));

  assert!(view.viewport_up(&mut text, 1));
  assert_eq!(view.viewport().start(), 4);
  assert!(view.viewport_up(&mut text, 1));
  assert_eq!(view.viewport().start(), 0);
  // At the begin of the buffer, further scrolling is refused.
  assert!(!view.viewport_up(&mut text, 1));
}

#[test]
fn viewport_down_jump1() {
  test_log_init();
  let mut text = make_text_from_lines(vec!["aaa\n", "bbb\n", "ccc\n", "ddd\n", "eee"]);
  let mut view = make_view(&mut text, 10, 2);
  // Scrolling by at least a screen jumps to the current end.
  assert!(view.viewport_down(&mut text, 2));
  assert_eq!(view.viewport().start(), 8);
}

#[test]
fn viewport_up_crlf1() {
  test_log_init();
  let mut text = Text::from("aa\r\nbb\r\ncc");
  let mut view = make_view(&mut text, 10, 1);
  assert!(view.viewport_down(&mut text, 1));
  assert_eq!(view.viewport().start(), 4);
  assert!(view.viewport_down(&mut text, 1));
  assert_eq!(view.viewport().start(), 8);
  // Scrolling up folds the CRLF pair back.
  assert!(view.viewport_up(&mut text, 1));
  assert_eq!(view.viewport().start(), 4);
  assert!(view.viewport_up(&mut text, 1));
  assert_eq!(view.viewport().start(), 0);
}

#[test]
fn viewport_up_no_newline1() {
  test_log_init();
  // A buffer without newlines cannot scan back forever, the distance is capped by the grid
  // size.
  let mut text = Text::from("abcdefghijklmnopqrstuvwxyz");
  let mut view = make_view(&mut text, 4, 2);
  assert!(view.viewport_down(&mut text, 1));
  assert!(view.viewport_down(&mut text, 1));
  let start = view.viewport().start();
  assert!(start > 0);
  assert!(view.viewport_up(&mut text, 1));
  assert!(view.viewport().start() < start);
}

#[test]
fn screenline_goto1() {
  test_log_init();
  let mut text = make_text_from_lines(vec!["aaa\n", "bbb\n", "ccc"]);
  let view = make_view(&mut text, 10, 3);
  assert_eq!(view.screenline_goto(1), 0);
  assert_eq!(view.screenline_goto(2), 4);
  assert_eq!(view.screenline_goto(3), 8);
  // Past the last populated row the position saturates.
  assert_eq!(view.screenline_goto(9), 8);
}

#[test]
fn syntax_overlay1() {
  test_log_init();
  let rules = vec![
    SyntaxRule::new(Regex::new(r"[0-9]+").unwrap(), 1),
    SyntaxRule::new(Regex::new(r"ab").unwrap(), 2),
  ];
  let syntax = Syntax::new("test", rules, vec!["".to_string(), "fg:red".to_string()]);
  let mut text = Text::from("ab 12 ab");
  let mut view = View::new(&mut text, None);
  view.syntax_set(Some(Arc::new(syntax)));
  view.resize(&mut text, U16Size::new(10, 1));

  let attrs: Vec<usize> = (0..8).map(|col| view.lines()[0].cell(col).attr()).collect();
  info!("attrs:{:?}", attrs);
  assert_eq!(attrs, vec![2, 2, 0, 1, 1, 0, 2, 2]);
}

#[test]
fn syntax_overlay_first_rule_wins1() {
  test_log_init();
  let rules = vec![
    SyntaxRule::new(Regex::new(r"b+").unwrap(), 1),
    SyntaxRule::new(Regex::new(r"ab").unwrap(), 2),
  ];
  let syntax = Syntax::new("test", rules, vec![]);
  let mut text = Text::from("abb");
  let mut view = View::new(&mut text, None);
  view.syntax_set(Some(Arc::new(syntax)));
  view.resize(&mut text, U16Size::new(5, 1));

  let attrs: Vec<usize> = (0..3).map(|col| view.lines()[0].cell(col).attr()).collect();
  // "ab" covers the first two chars, then the earlier declared rule takes the tail.
  assert_eq!(attrs, vec![2, 2, 1]);
}

#[test]
fn syntax_overlay_no_match1() {
  test_log_init();
  let rules = vec![SyntaxRule::new(Regex::new(r"zzz").unwrap(), 1)];
  let syntax = Syntax::new("test", rules, vec![]);
  let mut text = Text::from("abcdef");
  let mut view = View::new(&mut text, None);
  view.syntax_set(Some(Arc::new(syntax)));
  view.resize(&mut text, U16Size::new(8, 1));
  for col in 0..6 {
    assert_eq!(view.lines()[0].cell(col).attr(), 0);
  }
}

#[test]
fn syntax_symbols1() {
  test_log_init();
  // A syntax definition can override symbol glyphs; enabled categories prefer them.
  let mut syntax = Syntax::new("test", vec![], vec![]);
  syntax.set_symbol(SymbolKind::Eol, SyntaxSymbol::new("$", 0));
  let mut text = Text::from("a\nb");
  let mut view = View::new(&mut text, None);
  view.syntax_set(Some(Arc::new(syntax)));
  view.resize(&mut text, U16Size::new(4, 2));
  let expect = vec!["a$  ", "b   "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.symbols_get(), SymbolKind::Eol.flag());
}

#[test]
fn symbols_flags1() {
  test_log_init();
  let mut text = Text::from("a b");
  let mut view = View::new(&mut text, None);
  assert_eq!(view.symbols_get(), SymbolFlags::empty());
  view.symbols_set(SymbolFlags::SPACE | SymbolFlags::EOF);
  view.resize(&mut text, U16Size::new(5, 2));
  let expect = vec!["a\u{00B7}b  ", "~    "];
  do_test_rendered_rows(&view, &expect);
  assert_eq!(view.symbols_get(), SymbolFlags::SPACE | SymbolFlags::EOF);
}

#[test]
fn resize_grows1() {
  test_log_init();
  let mut text = Text::from("abcdef\nghi");
  let mut view = make_view(&mut text, 3, 2);
  do_check_grid(&view);
  view.resize(&mut text, U16Size::new(8, 4));
  assert_eq!(view.width(), 8);
  assert_eq!(view.height(), 4);
  do_check_grid(&view);
  view.resize(&mut text, U16Size::new(2, 1));
  assert_eq!(view.width(), 2);
  assert_eq!(view.height(), 1);
  do_check_grid(&view);
}

#[test]
fn reload1() {
  test_log_init();
  let mut text = Text::from("one\ntwo\nthree");
  let mut view = make_view(&mut text, 10, 2);
  view.cursor_to(&mut text, 8);
  let mut other = Text::from("fresh");
  view.reload(&mut other);
  assert_eq!(view.viewport().start(), 0);
  let main = view.main_cursor();
  assert_eq!(view.cursor(main).pos(), 0);
  let expect = vec!["fresh     ", "~         "];
  do_test_rendered_rows(&view, &expect);
}
