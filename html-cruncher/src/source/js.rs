use super::css;
use super::Found;
use crate::err::Loc;
use crate::tag::Occurrence;
use crate::tag::TagKind;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

// A DOM or jQuery call with a single string literal argument. Byte-oriented,
// so literals may hold text that isn't UTF-8.
static CALL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"(?-u)(getElementById|getElementsByClassName|hasClass|addClass|removeClass|toggleClass|querySelectorAll|querySelector|\$)\(("[^"]*"|'[^']*')\)"#,
  )
  .unwrap()
});

enum Argument {
  Id,
  ClassList,
  Selector,
}

fn argument(method: &[u8]) -> Option<Argument> {
  Some(match method {
    b"getElementById" => Argument::Id,
    b"getElementsByClassName" | b"hasClass" | b"addClass" | b"removeClass" | b"toggleClass" => {
      Argument::ClassList
    }
    b"querySelector" | b"querySelectorAll" | b"$" => Argument::Selector,
    _ => return None,
  })
}

// Non-ASCII bytes count too, so `éaddClass` is an identifier of its own.
fn is_ident_byte(c: u8) -> bool {
  c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80
}

/// Reports string arguments of id, class and selector calls as referential
/// occurrences. Only the literal's contents are ever reported, never the
/// quotes or the call around them.
pub fn scan(source: &[u8], found: &mut impl FnMut(Found)) {
  for caps in CALL.captures_iter(source) {
    let (Some(method), Some(literal)) = (caps.get(1), caps.get(2)) else {
      continue;
    };
    // `myaddClass(...)` is some other function.
    if method.start() > 0 && is_ident_byte(source[method.start() - 1]) {
      continue;
    }
    let Some(arg) = argument(method.as_bytes()) else {
      continue;
    };
    let inner = Loc(literal.start() + 1, literal.end() - 1);
    let text = &source[inner.0..inner.1];
    match arg {
      Argument::Id => {
        if !text.is_empty() {
          found(Found {
            kind: TagKind::Id,
            loc: inner,
            occurrence: Occurrence::Referential,
            escaped: false,
          });
        }
      }
      Argument::ClassList => {
        let mut i = 0;
        while i < text.len() {
          if text[i].is_ascii_whitespace() {
            i += 1;
            continue;
          }
          let start = i;
          while i < text.len() && !text[i].is_ascii_whitespace() {
            i += 1;
          }
          found(Found {
            kind: TagKind::Class,
            loc: Loc(inner.0 + start, inner.0 + i),
            occurrence: Occurrence::Referential,
            escaped: false,
          });
        }
      }
      Argument::Selector => {
        let mut selector = Vec::new();
        let res = css::scan(text, &mut |f: Found| selector.push(f));
        match res {
          Ok(()) => selector
            .into_iter()
            .for_each(|f| found(f.shifted(inner.0))),
          Err(err) => debug!(
            selector = %String::from_utf8_lossy(text),
            %err,
            "skipping malformed selector literal"
          ),
        }
      }
    }
  }
}
