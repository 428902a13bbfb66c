use super::Found;
use crate::err::LexError;
use crate::err::LexErrorType;
use crate::err::Loc;
use crate::tag::Occurrence;
use crate::tag::TagKind;
use memchr::memchr;
use memchr::memchr2;
use memchr::memmem;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TT {
  AtKeyword,
  Comment,
  Delim(u8),
  Hash,
  Ident,
  Number,
  String,
  Whitespace,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Token {
  pub typ: TT,
  pub loc: Loc,
}

fn is_name_start(c: u8) -> bool {
  c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_name(c: u8) -> bool {
  is_name_start(c) || c.is_ascii_digit() || c == b'-'
}

/// Lossless CSS tokenizer: the tokens' locations tile the whole input.
pub struct Lexer<'a> {
  source: &'a [u8],
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a [u8]) -> Lexer<'a> {
    Lexer { source, next: 0 }
  }

  fn at(&self, i: usize) -> Option<u8> {
    self.source.get(i).copied()
  }

  fn is_escape(&self, i: usize) -> bool {
    self.at(i) == Some(b'\\') && !matches!(self.at(i + 1), None | Some(b'\n' | b'\r' | b'\x0c'))
  }

  fn starts_ident(&self, i: usize) -> bool {
    match self.at(i) {
      Some(b'-') => match self.at(i + 1) {
        Some(b'-') => true,
        Some(c) if is_name_start(c) => true,
        _ => self.is_escape(i + 1),
      },
      Some(b'\\') => self.is_escape(i),
      Some(c) => is_name_start(c),
      None => false,
    }
  }

  fn starts_number(&self, i: usize) -> bool {
    let digit_at = |j: usize| self.at(j).is_some_and(|c| c.is_ascii_digit());
    match self.at(i) {
      Some(b'+' | b'-') => digit_at(i + 1) || (self.at(i + 1) == Some(b'.') && digit_at(i + 2)),
      Some(b'.') => digit_at(i + 1),
      Some(c) => c.is_ascii_digit(),
      None => false,
    }
  }

  fn consume_escape(&mut self) {
    self.next += 1;
    let hex = self.source[self.next..]
      .iter()
      .take(6)
      .take_while(|c| c.is_ascii_hexdigit())
      .count();
    if hex == 0 {
      // Any trailing UTF-8 continuation bytes are name characters.
      self.next += 1;
      return;
    }
    self.next += hex;
    match (self.at(self.next), self.at(self.next + 1)) {
      (Some(b'\r'), Some(b'\n')) => self.next += 2,
      (Some(c), _) if c.is_ascii_whitespace() => self.next += 1,
      _ => {}
    }
  }

  fn consume_name(&mut self) {
    loop {
      if self.at(self.next).is_some_and(is_name) {
        self.next += 1;
      } else if self.is_escape(self.next) {
        self.consume_escape();
      } else {
        break;
      }
    }
  }

  fn consume_digits(&mut self) {
    while self.at(self.next).is_some_and(|c| c.is_ascii_digit()) {
      self.next += 1;
    }
  }

  fn consume_number(&mut self) {
    if matches!(self.at(self.next), Some(b'+' | b'-')) {
      self.next += 1;
    }
    self.consume_digits();
    if self.at(self.next) == Some(b'.') && self.at(self.next + 1).is_some_and(|c| c.is_ascii_digit()) {
      self.next += 1;
      self.consume_digits();
    }
    if self.starts_ident(self.next) {
      self.consume_name();
    } else if self.at(self.next) == Some(b'%') {
      self.next += 1;
    }
  }

  fn consume_string(&mut self, quote: u8) -> Result<(), LexError> {
    let start = self.next;
    self.next += 1;
    loop {
      match memchr2(quote, b'\\', &self.source[self.next..]) {
        None => {
          return Err(LexError::new(
            LexErrorType::UnterminatedString,
            Loc(start, self.source.len()),
          ))
        }
        Some(i) if self.source[self.next + i] == quote => {
          self.next += i + 1;
          return Ok(());
        }
        Some(i) => {
          // Skip the escaped byte; a multibyte char's tail can't be a quote.
          self.next = (self.next + i + 2).min(self.source.len());
        }
      }
    }
  }

  fn consume_comment(&mut self) -> Result<(), LexError> {
    let start = self.next;
    match memmem::find(&self.source[start + 2..], b"*/") {
      Some(i) => {
        self.next = start + 2 + i + 2;
        Ok(())
      }
      None => Err(LexError::new(
        LexErrorType::UnterminatedComment,
        Loc(start, self.source.len()),
      )),
    }
  }

  pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
    let start = self.next;
    let Some(c) = self.at(start) else {
      return Ok(None);
    };
    let typ = match c {
      c if c.is_ascii_whitespace() => {
        while self.at(self.next).is_some_and(|c| c.is_ascii_whitespace()) {
          self.next += 1;
        }
        TT::Whitespace
      }
      b'/' if self.at(start + 1) == Some(b'*') => {
        self.consume_comment()?;
        TT::Comment
      }
      b'"' | b'\'' => {
        self.consume_string(c)?;
        TT::String
      }
      b'#' if self.at(start + 1).is_some_and(is_name) || self.is_escape(start + 1) => {
        self.next += 1;
        self.consume_name();
        TT::Hash
      }
      b'@' if self.starts_ident(start + 1) => {
        self.next += 1;
        self.consume_name();
        TT::AtKeyword
      }
      _ if self.starts_number(start) => {
        self.consume_number();
        TT::Number
      }
      _ if self.starts_ident(start) => {
        self.consume_name();
        TT::Ident
      }
      c => {
        self.next += 1;
        TT::Delim(c)
      }
    };
    Ok(Some(Token {
      typ,
      loc: Loc(start, self.next),
    }))
  }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Block {
  Rules,
  Declarations,
}

// At-rules whose block holds further style rules rather than declarations.
const GROUPING_AT_RULES: &[&str] = &[
  "media", "supports", "document", "-moz-document", "layer", "container", "scope", "starting-style",
];

fn groups_rules(at_keyword: &[u8]) -> bool {
  GROUPING_AT_RULES
    .iter()
    .any(|rule| rule.as_bytes().eq_ignore_ascii_case(at_keyword))
}

/// Decodes CSS escapes in an identifier: `md\:flex` is `md:flex` and `\31 0`
/// is `10`. Code points that can't be represented become U+FFFD.
pub fn unescape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars().peekable();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    let mut hex = String::new();
    while hex.len() < 6 && chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
      hex.extend(chars.next());
    }
    if hex.is_empty() {
      out.extend(chars.next());
      continue;
    }
    if chars.peek() == Some(&'\r') {
      chars.next();
      chars.next_if_eq(&'\n');
    } else {
      chars.next_if(|c| c.is_ascii_whitespace());
    }
    let decoded = u32::from_str_radix(&hex, 16)
      .ok()
      .filter(|cp| *cp != 0)
      .and_then(char::from_u32);
    out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
  }
  out
}

/// Reports selector ids (`#name`) and classes (`.name`) as referential
/// occurrences.
///
/// Only selector preludes count. Inside a declaration block, candidates are
/// held back until the statement turns out to be a nested rule (it reaches
/// `{`); they are dropped at `;` or `}`, so values like `color: #fff` never
/// match an id.
pub fn scan(source: &[u8], found: &mut impl FnMut(Found)) -> Result<(), LexError> {
  let mut lexer = Lexer::new(source);
  let mut blocks: Vec<Block> = Vec::new();
  let mut pending: Vec<Found> = Vec::new();
  let mut prelude_at: Option<Loc> = None;
  let mut prelude_started = false;
  let mut prev: Option<TT> = None;

  while let Some(token) = lexer.next_token()? {
    let in_rules = blocks.last().map_or(true, |b| *b == Block::Rules);
    let candidate = match token.typ {
      TT::Hash => Some((TagKind::Id, Loc(token.loc.0 + 1, token.loc.1))),
      TT::Ident if prev == Some(TT::Delim(b'.')) => Some((TagKind::Class, token.loc)),
      _ => None,
    }
    .map(|(kind, loc)| Found {
      kind,
      loc,
      occurrence: Occurrence::Referential,
      escaped: memchr(b'\\', &source[loc.0..loc.1]).is_some(),
    });
    if let Some(candidate) = candidate.filter(|_| prelude_at.is_none()) {
      if in_rules {
        found(candidate);
      } else {
        pending.push(candidate);
      }
    }

    match token.typ {
      TT::AtKeyword if !prelude_started => {
        prelude_at = Some(token.loc);
        prelude_started = true;
      }
      TT::Delim(b'{') => {
        let block = match prelude_at {
          Some(at) if in_rules && groups_rules(&source[at.0 + 1..at.1]) => Block::Rules,
          _ => Block::Declarations,
        };
        if prelude_at.is_none() {
          pending.drain(..).for_each(&mut *found);
        }
        pending.clear();
        blocks.push(block);
        prelude_at = None;
        prelude_started = false;
      }
      TT::Delim(b'}' | b';') => {
        if token.typ == TT::Delim(b'}') {
          blocks.pop();
        }
        pending.clear();
        prelude_at = None;
        prelude_started = false;
      }
      TT::Whitespace | TT::Comment => {}
      _ => prelude_started = true,
    }
    prev = Some(token.typ);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(source: &str) -> Vec<(TagKind, &str)> {
    let mut out = Vec::new();
    scan(source.as_bytes(), &mut |f: Found| {
      out.push((f.kind, &source[f.loc.0..f.loc.1]))
    })
    .unwrap();
    out
  }

  #[test]
  fn tokens_cover_the_whole_input() {
    let src = "a.b#c > .d:hover{color:#fff;margin:.5em -1px}/* x */@media (x){}'s'";
    let mut lexer = Lexer::new(src.as_bytes());
    let mut end = 0;
    while let Some(t) = lexer.next_token().unwrap() {
      assert_eq!(t.loc.0, end);
      end = t.loc.1;
    }
    assert_eq!(end, src.len());
  }

  #[test]
  fn finds_selector_ids_and_classes() {
    assert_eq!(
      names("div.menu > #nav .item-2, .a.b { color: red }"),
      vec![
        (TagKind::Class, "menu"),
        (TagKind::Id, "nav"),
        (TagKind::Class, "item-2"),
        (TagKind::Class, "a"),
        (TagKind::Class, "b"),
      ]
    );
  }

  #[test]
  fn ignores_declaration_values() {
    assert_eq!(
      names(".x { color: #fff; width: .5em; background: url(#y) } p{margin:1.5px}"),
      vec![(TagKind::Class, "x")]
    );
  }

  #[test]
  fn descends_into_grouping_at_rules_only() {
    assert_eq!(
      names("@media (max-width: 10px) { .m { color: #abc } } @font-face { src: x }"),
      vec![(TagKind::Class, "m")]
    );
    assert_eq!(names("@import url('#z.css'); #after {}"), vec![(TagKind::Id, "after")]);
  }

  #[test]
  fn nested_rules_count() {
    assert_eq!(
      names(".card { color: #f00; & .title { x: y } .body:hover { } }"),
      vec![
        (TagKind::Class, "card"),
        (TagKind::Class, "title"),
        (TagKind::Class, "body"),
      ]
    );
  }

  #[test]
  fn whitespace_breaks_a_class() {
    assert_eq!(names(". foo, /**/.bar"), vec![(TagKind::Class, "bar")]);
  }

  #[test]
  fn unterminated_tokens_are_errors() {
    let err = scan(b".a { content: \"oops }", &mut |_| {}).unwrap_err();
    assert_eq!(err.typ, LexErrorType::UnterminatedString);
    let err = scan(b".a /* never closed", &mut |_| {}).unwrap_err();
    assert_eq!(err.typ, LexErrorType::UnterminatedComment);
  }

  #[test]
  fn occurrences_before_an_error_are_reported() {
    let mut seen = Vec::new();
    let src = b".ok {} .bad \"";
    let res = scan(src, &mut |f: Found| seen.push(f.name(src).into_owned()));
    assert!(res.is_err());
    assert_eq!(seen, vec!["ok", "bad"]);
  }

  #[test]
  fn escaped_names_are_decoded() {
    let src = br".md\:flex:hover, #\31 0x, .a\.b { }";
    let mut seen = Vec::new();
    scan(src, &mut |f: Found| seen.push((f.kind, f.escaped, f.name(src).into_owned()))).unwrap();
    assert_eq!(
      seen,
      vec![
        (TagKind::Class, true, "md:flex".to_string()),
        (TagKind::Id, true, "10x".to_string()),
        (TagKind::Class, true, "a.b".to_string()),
      ]
    );
    assert_eq!(unescape(r"\0 \110000 x\"), "\u{fffd}\u{fffd}x");
  }
}
