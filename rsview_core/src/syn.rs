//! Syntax highlighting definitions and whitespace symbols.
//!
//! A syntax definition is an ordered list of compiled regex rules, each tagged with a style
//! index, plus an optional symbol table for whitespace/eol/eof glyphs. Rule order is
//! significant: when several rules match the same byte, the earliest declared rule wins.
//! Regex compilation happens outside the engine, callers hand in compiled
//! [`regex::bytes::Regex`] values (the rendered content may contain invalid UTF-8, so the
//! byte-oriented regex flavor is required).

use crate::flags_impl;

use compact_str::CompactString;
use regex::bytes::Regex;

/// Total count of symbol categories.
pub const SYMBOL_COUNT: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Symbol categories, keying the per-view symbol table.
pub enum SymbolKind {
  /// Space character.
  Space = 0,
  /// First cell of a tab expansion.
  Tab = 1,
  /// Remaining cells of a tab expansion.
  TabFill = 2,
  /// End of line.
  Eol = 3,
  /// Lines past the end of the buffer.
  Eof = 4,
}

impl SymbolKind {
  /// All categories in table order.
  pub const ALL: [SymbolKind; SYMBOL_COUNT] = [
    SymbolKind::Space,
    SymbolKind::Tab,
    SymbolKind::TabFill,
    SymbolKind::Eol,
    SymbolKind::Eof,
  ];

  /// Get the flag bit of this category.
  pub fn flag(&self) -> SymbolFlags {
    SymbolFlags::from_bits_truncate(1 << (*self as usize))
  }
}

flags_impl!(pub SymbolFlags, u8, SPACE, TAB, TAB_FILL, EOL, EOF);

#[derive(Debug, Clone, PartialEq, Eq)]
/// A display symbol: the UTF-8 glyph plus the style to render it with.
pub struct SyntaxSymbol {
  symbol: CompactString,
  style: usize,
}

impl SyntaxSymbol {
  /// Make new symbol.
  pub fn new(symbol: &str, style: usize) -> Self {
    SyntaxSymbol {
      symbol: CompactString::new(symbol),
      style,
    }
  }

  /// Get the glyph.
  pub fn symbol(&self) -> &CompactString {
    &self.symbol
  }

  /// Get the style index.
  pub fn style(&self) -> usize {
    self.style
  }
}

/// The invisible symbol of a category, used when the category is disabled.
pub fn symbol_none(kind: SymbolKind) -> SyntaxSymbol {
  match kind {
    SymbolKind::Eof => SyntaxSymbol::new("~", 0),
    _ => SyntaxSymbol::new(" ", 0),
  }
}

/// The built-in visible symbol of a category, used when the category is enabled and the view's
/// syntax definition provides no replacement.
pub fn symbol_default(kind: SymbolKind) -> SyntaxSymbol {
  match kind {
    SymbolKind::Space => SyntaxSymbol::new("\u{00B7}", 0),
    SymbolKind::Tab => SyntaxSymbol::new("\u{25B6}", 0),
    SymbolKind::TabFill => SyntaxSymbol::new(" ", 0),
    SymbolKind::Eol => SyntaxSymbol::new("\u{23CE}", 0),
    SymbolKind::Eof => SyntaxSymbol::new("~", 0),
  }
}

#[derive(Debug, Clone)]
/// One highlighting rule: a compiled regex and the style its matches render with.
pub struct SyntaxRule {
  regex: Regex,
  style: usize,
}

impl SyntaxRule {
  /// Make new rule.
  pub fn new(regex: Regex, style: usize) -> Self {
    SyntaxRule { regex, style }
  }

  /// Get the compiled regex.
  pub fn regex(&self) -> &Regex {
    &self.regex
  }

  /// Get the style index.
  pub fn style(&self) -> usize {
    self.style
  }
}

#[derive(Debug, Clone, Default)]
/// A syntax definition.
pub struct Syntax {
  name: String,
  rules: Vec<SyntaxRule>,
  symbols: [Option<SyntaxSymbol>; SYMBOL_COUNT],
  styles: Vec<String>,
}

impl Syntax {
  /// Make new syntax definition.
  ///
  /// The `styles` are backend style specs (see [`Ui::syntax_style`](crate::ui::Ui)) indexed by
  /// the style indices the rules and symbols carry.
  pub fn new(name: &str, rules: Vec<SyntaxRule>, styles: Vec<String>) -> Self {
    Syntax {
      name: name.to_string(),
      rules,
      symbols: [const { None }; SYMBOL_COUNT],
      styles,
    }
  }

  /// Get the definition name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Get the rules in declaration order.
  pub fn rules(&self) -> &[SyntaxRule] {
    &self.rules
  }

  /// Get the symbol table.
  pub fn symbols(&self) -> &[Option<SyntaxSymbol>; SYMBOL_COUNT] {
    &self.symbols
  }

  /// Provide a symbol for a category.
  pub fn set_symbol(&mut self, kind: SymbolKind, symbol: SyntaxSymbol) {
    self.symbols[kind as usize] = Some(symbol);
  }

  /// Get the backend style specs.
  pub fn styles(&self) -> &[String] {
    &self.styles
  }
}
