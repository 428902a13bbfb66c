use crate::err::CrunchError;
use crate::err::FileError;
use crate::input::SourceSet;
use crate::registry::RenameTable;
use crate::registry::TagRegistry;
use crate::source::SourceKind;
use ahash::HashSet;
use rayon::prelude::*;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Batch settings.
#[derive(Clone, Debug)]
pub struct CrunchOptions {
  /// Where rewritten files go, mirroring their input paths.
  pub out_dir: PathBuf,
  /// Only rename tags seen in more than one file.
  pub common_only: bool,
  /// Worker threads; `None` lets rayon decide.
  pub threads: Option<usize>,
}

impl CrunchOptions {
  pub fn new(out_dir: impl Into<PathBuf>) -> CrunchOptions {
    CrunchOptions {
      out_dir: out_dir.into(),
      common_only: true,
      threads: None,
    }
  }

  pub fn with_common_only(mut self, common_only: bool) -> CrunchOptions {
    self.common_only = common_only;
    self
  }

  pub fn with_threads(mut self, threads: Option<usize>) -> CrunchOptions {
    self.threads = threads;
    self
  }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
  Collecting,
  Finalizing,
  Rewriting,
  Done,
}

impl Display for Phase {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Phase::Collecting => "collecting",
      Phase::Finalizing => "finalizing",
      Phase::Rewriting => "rewriting",
      Phase::Done => "done",
    })
  }
}

#[derive(Debug)]
pub enum FileOutcome {
  Rewritten { bytes_in: u64, bytes_out: u64 },
  /// The source could not be rewritten and was written out as is.
  CopiedUnchanged { bytes: u64, error: FileError },
  /// Nothing was written for this file.
  Skipped(FileError),
}

#[derive(Debug)]
pub struct FileReport {
  pub path: PathBuf,
  pub kind: SourceKind,
  pub outcome: FileOutcome,
}

impl FileReport {
  fn bytes(&self) -> (u64, u64) {
    match self.outcome {
      FileOutcome::Rewritten { bytes_in, bytes_out } => (bytes_in, bytes_out),
      FileOutcome::CopiedUnchanged { bytes, .. } => (bytes, bytes),
      FileOutcome::Skipped(_) => (0, 0),
    }
  }
}

#[derive(Debug)]
pub struct CrunchReport {
  /// The final renames, heaviest first.
  pub table: RenameTable,
  /// One entry per input file, in input order.
  pub files: Vec<FileReport>,
}

impl CrunchReport {
  /// Input bytes of every file that was written out.
  pub fn bytes_in(&self) -> u64 {
    self.files.iter().map(|f| f.bytes().0).sum()
  }

  pub fn bytes_out(&self) -> u64 {
    self.files.iter().map(|f| f.bytes().1).sum()
  }

  pub fn saved(&self) -> i64 {
    self.bytes_in() as i64 - self.bytes_out() as i64
  }

  /// Output size as a percentage of input size.
  pub fn ratio(&self) -> f64 {
    percent(self.bytes_in(), self.bytes_out())
  }
}

fn percent(bytes_in: u64, bytes_out: u64) -> f64 {
  if bytes_in == 0 {
    100.0
  } else {
    bytes_out as f64 / bytes_in as f64 * 100.0
  }
}

/// Where the rewrite of `file` is written: `out_dir` followed by the normal
/// components of `file`, so `../site/index.html` lands at
/// `out_dir/site/index.html`.
pub fn output_path(out_dir: &Path, file: &Path) -> PathBuf {
  let mut dest = out_dir.to_path_buf();
  for component in file.components() {
    if let Component::Normal(part) = component {
      dest.push(part);
    }
  }
  dest
}

/// Renames ids and classes across every file in `sources`.
///
/// Collection runs HTML files first, since CSS and JS occurrences only count
/// for tags some HTML file declared. Names are assigned once every file has
/// been collected, and no file is rewritten before that. A failure in one
/// file is logged and recorded in the report; it never stops the batch.
pub fn crunch(options: &CrunchOptions, sources: &SourceSet) -> Result<CrunchReport, CrunchError> {
  if sources.html.is_empty() {
    return Err(CrunchError::NoHtmlInput);
  }
  let mut pool = rayon::ThreadPoolBuilder::new();
  if let Some(threads) = options.threads {
    pool = pool.num_threads(threads);
  }
  let pool = pool
    .build()
    .map_err(|err| CrunchError::ThreadPool(err.to_string()))?;
  Ok(pool.install(|| run(options, sources)))
}

fn run(options: &CrunchOptions, sources: &SourceSet) -> CrunchReport {
  let files: Vec<_> = sources.iter().collect();
  let (html, others) = files.split_at(sources.html.len());

  info!(
    phase = %Phase::Collecting,
    html = sources.html.len(),
    css = sources.css.len(),
    js = sources.js.len(),
    "collecting tags"
  );
  let registry = TagRegistry::new();
  let collect = |&(kind, path): &(SourceKind, &Path)| collect_file(&registry, kind, path);
  // Each `collect` into a Vec is a barrier: every file of the step is done.
  let mut unreadable: Vec<Option<FileError>> = html.par_iter().map(collect).collect();
  unreadable.extend(others.par_iter().map(collect).collect::<Vec<_>>());

  let table = finalize(registry, options.common_only);

  // Distinct inputs like `a/b.html` and `a/x/../b.html` share an output path.
  // The first in input order writes it; later ones are skipped.
  let mut claimed = HashSet::default();
  let dests: Vec<Result<PathBuf, FileError>> = files
    .iter()
    .zip(unreadable)
    .map(|(&(kind, path), unreadable)| {
      if let Some(err) = unreadable {
        return Err(err);
      }
      let dest = output_path(&options.out_dir, path);
      if claimed.insert(dest.clone()) {
        return Ok(dest);
      }
      let err = FileError::OutputClash(dest);
      warn!(%kind, path = %path.display(), %err, "skipping file");
      Err(err)
    })
    .collect();

  info!(phase = %Phase::Rewriting, renamed = table.len(), "rewriting files");
  let reports: Vec<FileReport> = files
    .into_par_iter()
    .zip(dests)
    .map(|((kind, path), dest)| FileReport {
      path: path.to_path_buf(),
      kind,
      outcome: match dest {
        Ok(dest) => rewrite_file(&table, kind, path, dest),
        Err(err) => FileOutcome::Skipped(err),
      },
    })
    .collect();

  let report = CrunchReport {
    table,
    files: reports,
  };
  info!(
    phase = %Phase::Done,
    bytes_in = report.bytes_in(),
    bytes_out = report.bytes_out(),
    "finished"
  );
  report
}

// Returns the error only when the file could not be read at all; such files
// are left out of the rewrite too.
fn collect_file(registry: &TagRegistry, kind: SourceKind, path: &Path) -> Option<FileError> {
  debug!(%kind, path = %path.display(), "loading tags");
  let source = match fs::read(path) {
    Ok(source) => source,
    Err(err) => {
      let err = FileError::Unreadable(err);
      warn!(%kind, path = %path.display(), %err, "skipping file");
      return Some(err);
    }
  };
  if let Err(err) = kind.collect(registry, path, &source) {
    warn!(%kind, path = %path.display(), %err, "stopped loading tags early");
  }
  None
}

fn finalize(mut registry: TagRegistry, common_only: bool) -> RenameTable {
  info!(phase = %Phase::Finalizing, tags = registry.len(), common_only, "assigning names");
  if common_only {
    registry.filter_uncommon();
  }
  let table = registry.assign_names();
  for (rank, record) in table.records().iter().enumerate() {
    debug!(
      rank,
      weight = record.weight,
      kind = %record.kind,
      name = %record.name,
      new_name = record.new_name.as_deref().unwrap_or_default(),
      "rename"
    );
  }
  table
}

fn rewrite_file(table: &RenameTable, kind: SourceKind, path: &Path, dest: PathBuf) -> FileOutcome {
  debug!(%kind, path = %path.display(), "replacing tags");
  let outcome = write_rewrite(table, kind, path, dest);
  match &outcome {
    FileOutcome::Rewritten { bytes_in, bytes_out } => debug!(
      %kind,
      path = %path.display(),
      bytes_in,
      bytes_out,
      percent = percent(*bytes_in, *bytes_out),
      "replaced tags"
    ),
    FileOutcome::CopiedUnchanged { error, .. } => {
      warn!(%kind, path = %path.display(), err = %error, "copied unchanged")
    }
    FileOutcome::Skipped(err) => warn!(%kind, path = %path.display(), %err, "skipping file"),
  }
  outcome
}

fn write_rewrite(table: &RenameTable, kind: SourceKind, path: &Path, dest: PathBuf) -> FileOutcome {
  let source = match fs::read(path) {
    Ok(source) => source,
    Err(err) => return FileOutcome::Skipped(FileError::Unreadable(err)),
  };
  let bytes_in = source.len() as u64;
  if let Some(parent) = dest.parent() {
    if let Err(err) = fs::create_dir_all(parent) {
      return FileOutcome::Skipped(FileError::Unwritable(parent.to_path_buf(), err));
    }
  }
  let (output, lex_error) = match kind.rewrite(table, &source) {
    Ok(output) => (output, None),
    Err(err) => (source, Some(err)),
  };
  if let Err(err) = fs::write(&dest, &output) {
    return FileOutcome::Skipped(FileError::Unwritable(dest, err));
  }
  let bytes_out = output.len() as u64;
  match lex_error {
    None => FileOutcome::Rewritten {
      bytes_in,
      bytes_out,
    },
    Some(err) => FileOutcome::CopiedUnchanged {
      bytes: bytes_out,
      error: FileError::Lex(err),
    },
  }
}
