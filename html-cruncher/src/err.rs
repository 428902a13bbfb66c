use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io;
use std::path::PathBuf;

/// Half-open byte range into a source file.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Loc(pub usize, pub usize);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LexErrorType {
  UnterminatedComment,
  UnterminatedString,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexError {
  pub typ: LexErrorType,
  pub loc: Loc,
}

impl LexError {
  pub fn new(typ: LexErrorType, loc: Loc) -> LexError {
    LexError { typ, loc }
  }
}

impl Display for LexError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let what = match self.typ {
      LexErrorType::UnterminatedComment => "unterminated comment",
      LexErrorType::UnterminatedString => "unterminated string",
    };
    write!(f, "{what} at bytes {}..{}", self.loc.0, self.loc.1)
  }
}

impl Error for LexError {}

/// Why a single file could not be processed. Never affects other files.
#[derive(Debug)]
pub enum FileError {
  Unreadable(io::Error),
  Unwritable(PathBuf, io::Error),
  /// An earlier input already maps to this output path.
  OutputClash(PathBuf),
  Lex(LexError),
}

impl Display for FileError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      FileError::Unreadable(err) => write!(f, "can't read source: {err}"),
      FileError::Unwritable(dest, err) => write!(f, "can't write {}: {err}", dest.display()),
      FileError::OutputClash(dest) => {
        write!(f, "output {} is already written by another input", dest.display())
      }
      FileError::Lex(err) => write!(f, "malformed source: {err}"),
    }
  }
}

impl Error for FileError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      FileError::Unreadable(err) | FileError::Unwritable(_, err) => Some(err),
      FileError::OutputClash(_) => None,
      FileError::Lex(err) => Some(err),
    }
  }
}

impl From<LexError> for FileError {
  fn from(err: LexError) -> Self {
    FileError::Lex(err)
  }
}

/// Failures that stop a whole batch before any file is touched.
#[derive(Debug)]
pub enum CrunchError {
  NoHtmlInput,
  ThreadPool(String),
}

impl Display for CrunchError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      CrunchError::NoHtmlInput => f.write_str("no html files given"),
      CrunchError::ThreadPool(msg) => write!(f, "failed to start worker pool: {msg}"),
    }
  }
}

impl Error for CrunchError {}
