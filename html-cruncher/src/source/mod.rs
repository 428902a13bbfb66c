//! Per-format scanners that find id and class occurrences in source text.
//!
//! Every scanner reports occurrences in source order as byte ranges, which is
//! all the registry needs while collecting and all a rewrite needs to splice
//! in new names. Text between occurrences is copied through untouched.
//!
//! Sources are plain bytes. Only ASCII is significant to any scanner, so files
//! in Latin-1 or another ASCII-compatible encoding scan and rewrite fine.

use crate::err::LexError;
use crate::err::Loc;
use crate::registry::RenameTable;
use crate::registry::TagRegistry;
use crate::tag::Occurrence;
use crate::tag::TagKind;
use std::borrow::Cow;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;

pub mod css;
pub mod html;
pub mod js;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Found {
  pub kind: TagKind,
  pub loc: Loc,
  pub occurrence: Occurrence,
  /// The span contains CSS escapes (`.md\:flex`).
  pub escaped: bool,
}

impl Found {
  /// The identifier this occurrence spells, with CSS escapes decoded.
  pub fn name<'a>(&self, source: &'a [u8]) -> Cow<'a, str> {
    let raw = String::from_utf8_lossy(&source[self.loc.0..self.loc.1]);
    if self.escaped {
      Cow::Owned(css::unescape(&raw))
    } else {
      raw
    }
  }

  fn shifted(self, offset: usize) -> Found {
    Found {
      loc: Loc(self.loc.0 + offset, self.loc.1 + offset),
      ..self
    }
  }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SourceKind {
  Html,
  Css,
  Js,
}

impl SourceKind {
  pub fn from_path(path: &Path) -> Option<SourceKind> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("html") => Some(SourceKind::Html),
      Some("css") => Some(SourceKind::Css),
      Some("js") => Some(SourceKind::Js),
      _ => None,
    }
  }

  /// Calls `found` for every occurrence in `source`, in order.
  ///
  /// On a lex error, occurrences before the error have already been reported.
  pub fn scan(&self, source: &[u8], found: &mut impl FnMut(Found)) -> Result<(), LexError> {
    match self {
      SourceKind::Html => {
        html::scan(source, found);
        Ok(())
      }
      SourceKind::Css => css::scan(source, found),
      SourceKind::Js => {
        js::scan(source, found);
        Ok(())
      }
    }
  }

  /// Adds every occurrence in `source` to the registry on behalf of `file`.
  pub fn collect(&self, registry: &TagRegistry, file: &Path, source: &[u8]) -> Result<(), LexError> {
    self.scan(source, &mut |f| {
      registry.add(f.kind, &f.name(source), file, f.occurrence)
    })
  }

  /// Returns `source` with every renamed occurrence replaced.
  ///
  /// Occurrences missing from the table are left as they are, so a source
  /// with nothing to rename comes back byte-identical.
  pub fn rewrite(&self, table: &RenameTable, source: &[u8]) -> Result<Vec<u8>, LexError> {
    let mut out = Vec::with_capacity(source.len());
    let mut copied = 0;
    self.scan(source, &mut |f| {
      if let Some(new_name) = table.lookup(f.kind, &f.name(source)) {
        out.extend_from_slice(&source[copied..f.loc.0]);
        out.extend_from_slice(new_name.as_bytes());
        copied = f.loc.1;
      }
    })?;
    out.extend_from_slice(&source[copied..]);
    Ok(out)
  }
}

impl Display for SourceKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SourceKind::Html => "html",
      SourceKind::Css => "css",
      SourceKind::Js => "js",
    })
  }
}
