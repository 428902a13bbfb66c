use super::Found;
use crate::err::Loc;
use crate::tag::Occurrence;
use crate::tag::TagKind;
use memchr::memchr;
use memchr::memmem;

// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &[
  "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

struct Lexer<'a> {
  source: &'a [u8],
  next: usize,
}

impl<'a> Lexer<'a> {
  fn at(&self, i: usize) -> Option<u8> {
    self.source.get(i).copied()
  }

  fn skip_past(&mut self, needle: &[u8]) {
    self.next = match memmem::find(&self.source[self.next..], needle) {
      Some(i) => self.next + i + needle.len(),
      None => self.source.len(),
    };
  }

  fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
    while self.at(self.next).is_some_and(&pred) {
      self.next += 1;
    }
  }

  fn skip_raw_text(&mut self, tag: &[u8]) {
    while let Some(i) = memmem::find(&self.source[self.next..], b"</") {
      let name_start = self.next + i + 2;
      let name_end = name_start + tag.len();
      self.next = name_start;
      if self
        .source
        .get(name_start..name_end)
        .is_some_and(|n| n.eq_ignore_ascii_case(tag))
        && !self.at(name_end).is_some_and(|c| c.is_ascii_alphanumeric())
      {
        // Leave `</` for the end tag handling.
        self.next -= 2;
        return;
      }
    }
    self.next = self.source.len();
  }

  /// Reads one attribute. Returns the name and, if present, the value's range
  /// without quotes.
  fn attribute(&mut self) -> (Loc, Option<Loc>) {
    let name_start = self.next;
    // The first character may be `=`; that is part of the name.
    self.next += 1;
    self.skip_while(|c| !c.is_ascii_whitespace() && !matches!(c, b'/' | b'>' | b'='));
    let name = Loc(name_start, self.next);

    let after_name = self.next;
    self.skip_while(|c| c.is_ascii_whitespace());
    if self.at(self.next) != Some(b'=') {
      self.next = after_name;
      return (name, None);
    }
    self.next += 1;
    self.skip_while(|c| c.is_ascii_whitespace());
    let value = match self.at(self.next) {
      Some(q @ (b'"' | b'\'')) => {
        let start = self.next + 1;
        let end = match memchr(q, &self.source[start..]) {
          Some(i) => start + i,
          None => self.source.len(),
        };
        self.next = (end + 1).min(self.source.len());
        Loc(start, end)
      }
      _ => {
        let start = self.next;
        self.skip_while(|c| !c.is_ascii_whitespace() && c != b'>');
        Loc(start, self.next)
      }
    };
    (name, Some(value))
  }

  /// Scans a start tag's attributes up to and including `>`.
  fn start_tag(&mut self, found: &mut impl FnMut(Found)) -> Loc {
    let name_start = self.next;
    self.skip_while(|c| !c.is_ascii_whitespace() && !matches!(c, b'/' | b'>'));
    let tag = Loc(name_start, self.next);
    loop {
      self.skip_while(|c| c.is_ascii_whitespace() || c == b'/');
      match self.at(self.next) {
        None => break,
        Some(b'>') => {
          self.next += 1;
          break;
        }
        Some(_) => {}
      }
      let (name, value) = self.attribute();
      if let Some(value) = value {
        self.report(name, value, found);
      }
    }
    tag
  }

  fn report(&self, name: Loc, value: Loc, found: &mut impl FnMut(Found)) {
    let name = &self.source[name.0..name.1];
    if name.eq_ignore_ascii_case(b"id") {
      if value.0 < value.1 {
        found(Found {
          kind: TagKind::Id,
          loc: value,
          occurrence: Occurrence::Authoritative,
          escaped: false,
        });
      }
    } else if name.eq_ignore_ascii_case(b"class") {
      let mut i = value.0;
      while i < value.1 {
        if self.source[i].is_ascii_whitespace() {
          i += 1;
          continue;
        }
        let start = i;
        while i < value.1 && !self.source[i].is_ascii_whitespace() {
          i += 1;
        }
        found(Found {
          kind: TagKind::Class,
          loc: Loc(start, i),
          occurrence: Occurrence::Authoritative,
          escaped: false,
        });
      }
    }
  }
}

/// Reports every `id` value and every token of every `class` value as an
/// authoritative occurrence.
///
/// Comments, doctypes and the content of raw text elements such as `<script>`
/// are skipped. Malformed markup never fails; scanning just resumes at the
/// next `<`.
pub fn scan(source: &[u8], found: &mut impl FnMut(Found)) {
  let mut lexer = Lexer { source, next: 0 };
  while let Some(i) = memchr(b'<', &lexer.source[lexer.next..]) {
    lexer.next += i + 1;
    match lexer.at(lexer.next) {
      Some(b'!') if lexer.source[lexer.next..].starts_with(b"!--") => {
        lexer.next += 3;
        lexer.skip_past(b"-->");
      }
      Some(b'!' | b'?' | b'/') => lexer.skip_past(b">"),
      Some(c) if c.is_ascii_alphabetic() => {
        let tag = lexer.start_tag(found);
        let tag = &lexer.source[tag.0..tag.1];
        if let Some(raw) = RAW_TEXT_ELEMENTS
          .iter()
          .find(|raw| raw.as_bytes().eq_ignore_ascii_case(tag))
        {
          lexer.skip_raw_text(raw.as_bytes());
        }
      }
      _ => {}
    }
  }
}
