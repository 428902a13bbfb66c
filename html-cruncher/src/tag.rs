use ahash::HashMap;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::PathBuf;

/// The namespace an identifier lives in. An id and a class with the same
/// spelling are unrelated and are renamed independently.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum TagKind {
  Id,
  Class,
}

impl Display for TagKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      TagKind::Id => "id",
      TagKind::Class => "class",
    })
  }
}

/// How strongly an occurrence vouches for an identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Occurrence {
  /// Declared in markup (an HTML `id` or `class` attribute). May create a record.
  Authoritative,
  /// Only referenced (a CSS selector or a JS DOM call). Only strengthens an
  /// existing record.
  Referential,
}

/// One map per kind, keyed by name, so lookups by `&str` don't allocate.
#[derive(Debug)]
pub(crate) struct KindMap<T> {
  ids: HashMap<String, T>,
  classes: HashMap<String, T>,
}

impl<T> Default for KindMap<T> {
  fn default() -> Self {
    KindMap {
      ids: HashMap::default(),
      classes: HashMap::default(),
    }
  }
}

impl<T> KindMap<T> {
  pub fn of(&self, kind: TagKind) -> &HashMap<String, T> {
    match kind {
      TagKind::Id => &self.ids,
      TagKind::Class => &self.classes,
    }
  }

  pub fn of_mut(&mut self, kind: TagKind) -> &mut HashMap<String, T> {
    match kind {
      TagKind::Id => &mut self.ids,
      TagKind::Class => &mut self.classes,
    }
  }

  pub fn len(&self) -> usize {
    self.ids.len() + self.classes.len()
  }

  pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
    self.ids.retain(|_, v| keep(&*v));
    self.classes.retain(|_, v| keep(&*v));
  }

  pub fn into_values(self) -> impl Iterator<Item = T> {
    self.ids.into_values().chain(self.classes.into_values())
  }

  pub fn values(&self) -> impl Iterator<Item = &T> {
    self.ids.values().chain(self.classes.values())
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRecord {
  pub kind: TagKind,
  pub name: String,
  /// Unset until names are assigned.
  pub new_name: Option<String>,
  /// Sum of `name.len()` over every counted occurrence.
  pub weight: usize,
  pub first_file: PathBuf,
  pub single_file: bool,
  /// Creation sequence number; breaks weight ties.
  pub discovered: u64,
}

impl TagRecord {
  pub(crate) fn new(kind: TagKind, name: String, file: PathBuf, discovered: u64) -> TagRecord {
    TagRecord {
      kind,
      weight: name.len(),
      name,
      new_name: None,
      first_file: file,
      single_file: true,
      discovered,
    }
  }
}
