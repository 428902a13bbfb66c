use crate::source::SourceKind;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

/// The files of one batch, grouped by format, in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct SourceSet {
  pub html: Vec<PathBuf>,
  pub css: Vec<PathBuf>,
  pub js: Vec<PathBuf>,
}

impl SourceSet {
  pub fn new() -> SourceSet {
    SourceSet::default()
  }

  pub fn files_mut(&mut self, kind: SourceKind) -> &mut Vec<PathBuf> {
    match kind {
      SourceKind::Html => &mut self.html,
      SourceKind::Css => &mut self.css,
      SourceKind::Js => &mut self.js,
    }
  }

  /// Adds `path` unless it is already part of the batch. Processing a file
  /// twice would count its tags twice and race on its output.
  pub fn push(&mut self, kind: SourceKind, path: PathBuf) {
    let files = self.files_mut(kind);
    if !files.contains(&path) {
      files.push(path);
    }
  }

  /// Adds every `.html`, `.css` and `.js` file under `dir`, recursively, in
  /// file name order.
  pub fn scan_dir(&mut self, dir: &Path) {
    for entry in WalkDir::new(dir).sort_by_file_name() {
      let entry = match entry {
        Ok(entry) => entry,
        Err(err) => {
          warn!(dir = %dir.display(), %err, "skipping unreadable directory entry");
          continue;
        }
      };
      if !entry.file_type().is_file() {
        continue;
      }
      if let Some(kind) = SourceKind::from_path(entry.path()) {
        self.push(kind, entry.into_path());
      }
    }
  }

  pub fn len(&self) -> usize {
    self.html.len() + self.css.len() + self.js.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Every file with its format: HTML first, then CSS, then JS.
  pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &Path)> {
    self
      .html
      .iter()
      .map(|p| (SourceKind::Html, p.as_path()))
      .chain(self.css.iter().map(|p| (SourceKind::Css, p.as_path())))
      .chain(self.js.iter().map(|p| (SourceKind::Js, p.as_path())))
  }
}
