use anyhow::Result;
use clap::{ArgAction, Parser};
use html_cruncher::{crunch, CrunchError, CrunchOptions, SourceKind, SourceSet};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
  name = "html-cruncher",
  version,
  about = "Renames HTML ids and classes to short names across HTML, CSS and JS files"
)]
struct Cli {
  /// HTML files, separated by commas.
  #[arg(long, value_delimiter = ',')]
  html: Vec<PathBuf>,

  /// CSS files, separated by commas.
  #[arg(long, value_delimiter = ',')]
  css: Vec<PathBuf>,

  /// JS files, separated by commas.
  #[arg(long, value_delimiter = ',')]
  js: Vec<PathBuf>,

  /// Output directory; input paths are recreated beneath it.
  #[arg(long, default_value = "out")]
  outdir: PathBuf,

  /// Directory to scan recursively for .html, .css and .js files.
  #[arg(long)]
  scandir: Option<PathBuf>,

  /// Rename only tags that appear in more than one file.
  #[arg(
    long,
    action = ArgAction::Set,
    default_value_t = true,
    value_name = "true|false"
  )]
  rc: bool,

  /// Worker threads; defaults to one per CPU.
  #[arg(long)]
  threads: Option<usize>,

  /// Log more; repeat for more detail.
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,

  /// Only log errors.
  #[arg(short, long, conflicts_with = "verbose")]
  quiet: bool,
}

fn main() -> ExitCode {
  match try_main() {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn try_main() -> Result<ExitCode> {
  let args = Cli::parse();
  init_tracing(log_level(args.verbose, args.quiet));

  let mut sources = SourceSet::new();
  for (kind, files) in [
    (SourceKind::Html, args.html),
    (SourceKind::Css, args.css),
    (SourceKind::Js, args.js),
  ] {
    for file in files {
      sources.push(kind, file);
    }
  }
  if let Some(dir) = &args.scandir {
    if dir.is_dir() {
      sources.scan_dir(dir);
    } else {
      warn!(dir = %dir.display(), "scan directory does not exist; skipping");
    }
  }

  let options = CrunchOptions::new(args.outdir)
    .with_common_only(args.rc)
    .with_threads(args.threads);
  let report = match crunch(&options, &sources) {
    Ok(report) => report,
    Err(CrunchError::NoHtmlInput) => {
      eprintln!("error: no html files given");
      return Ok(ExitCode::FAILURE);
    }
    Err(err) => return Err(err.into()),
  };

  println!(
    "html-cruncher: total bytes in: {} out: {} saved: {} ({:.1}%)",
    report.bytes_in(),
    report.bytes_out(),
    report.saved(),
    report.ratio(),
  );
  Ok(ExitCode::SUCCESS)
}

fn log_level(verbose: u8, quiet: bool) -> Level {
  if quiet {
    return Level::ERROR;
  }
  match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

fn init_tracing(level: Level) {
  let _ = tracing_subscriber::fmt()
    .with_max_level(level)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
