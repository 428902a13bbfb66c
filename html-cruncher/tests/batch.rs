use html_cruncher::{
  crunch, output_path, CrunchOptions, FileError, FileOutcome, Found, SourceKind, SourceSet,
  TagKind,
};
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::tempdir;

struct Site {
  _dir: tempfile::TempDir,
  root: PathBuf,
  out: PathBuf,
}

impl Site {
  fn new() -> Site {
    let dir = tempdir().unwrap();
    let root = dir.path().join("site");
    let out = dir.path().join("out");
    fs::create_dir_all(&root).unwrap();
    Site {
      _dir: dir,
      root,
      out,
    }
  }

  fn write(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = self.root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
  }

  fn output(&self, path: &Path) -> String {
    fs::read_to_string(output_path(&self.out, path)).unwrap()
  }
}

const PAGE_A: &str = r#"<ul class="menu"><li class="menu"></li><li class="menu solo"></li></ul><div class="menu"></div>"#;
const PAGE_B: &str = r#"<nav class="menu"><img class="logo" id="brand"></nav>"#;
const STYLE: &str = ".menu { color: #brand } .logo, #brand { width: 1px }\n";
const SCRIPT: &str = r#"document.getElementById('brand'); $(".menu").addClass("gone");"#;

fn site_sources(site: &Site) -> SourceSet {
  let mut sources = SourceSet::new();
  sources.push(SourceKind::Html, site.write("a.html", PAGE_A));
  sources.push(SourceKind::Html, site.write("nested/b.html", PAGE_B));
  sources.push(SourceKind::Css, site.write("style.css", STYLE));
  sources.push(SourceKind::Js, site.write("app.js", SCRIPT));
  sources
}

#[test]
fn renames_common_tags_across_formats() {
  let site = Site::new();
  let sources = site_sources(&site);
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  // menu: 4 x 4 in a.html, 4 in b.html, 4 in CSS, 4 in JS. brand: 5 in HTML,
  // 5 in CSS, 5 in JS.
  // logo: 4 in HTML, 4 in CSS. solo is only ever in a.html.
  let renamed: Vec<_> = report
    .table
    .records()
    .iter()
    .map(|r| (r.kind, r.name.as_str(), r.weight, r.new_name.as_deref().unwrap()))
    .collect();
  assert_eq!(
    renamed,
    vec![
      (TagKind::Class, "menu", 28, "a"),
      (TagKind::Id, "brand", 15, "b"),
      (TagKind::Class, "logo", 8, "c"),
    ]
  );

  assert_eq!(
    site.output(&sources.html[0]),
    r#"<ul class="a"><li class="a"></li><li class="a solo"></li></ul><div class="a"></div>"#
  );
  assert_eq!(
    site.output(&sources.html[1]),
    r#"<nav class="a"><img class="c" id="b"></nav>"#
  );
  assert_eq!(site.output(&sources.css[0]), ".a { color: #brand } .c, #b { width: 1px }\n");
  assert_eq!(
    site.output(&sources.js[0]),
    r#"document.getElementById('b'); $(".a").addClass("gone");"#
  );

  assert!(report
    .files
    .iter()
    .all(|f| matches!(f.outcome, FileOutcome::Rewritten { .. })));
  assert!(report.bytes_out() < report.bytes_in());
  assert_eq!(report.saved(), (report.bytes_in() - report.bytes_out()) as i64);
}

#[test]
fn rename_everything_includes_single_file_tags() {
  let site = Site::new();
  let sources = site_sources(&site);
  let report = crunch(
    &CrunchOptions::new(&site.out).with_common_only(false),
    &sources,
  )
  .unwrap();
  assert_eq!(report.table.lookup(TagKind::Class, "solo"), Some("d"));
  assert_eq!(report.table.lookup(TagKind::Class, "gone"), None);
  assert!(site.output(&sources.html[0]).contains(r#"class="a d""#));
}

#[test]
fn unchanged_when_nothing_is_common() {
  let site = Site::new();
  let mut sources = SourceSet::new();
  let page = "<!doctype html>\n<P  CLASS = 'x  y' id=z>\n<!-- keep -->\n";
  sources.push(SourceKind::Html, site.write("only.html", page));
  sources.push(SourceKind::Css, site.write("only.css", "/* none */ .other{}"));
  let report = crunch(&CrunchOptions::new(&site.out).with_threads(Some(1)), &sources).unwrap();
  assert!(report.table.is_empty());
  assert_eq!(site.output(&sources.html[0]), page);
  assert_eq!(site.output(&sources.css[0]), "/* none */ .other{}");
  assert_eq!(report.bytes_in(), report.bytes_out());
}

#[test]
fn file_failures_are_isolated() {
  let site = Site::new();
  let mut sources = SourceSet::new();
  sources.push(SourceKind::Html, site.write("a.html", r#"<b class="hot">"#));
  sources.push(SourceKind::Html, site.root.join("missing.html"));
  sources.push(SourceKind::Css, site.write("broken.css", ".hot { content: \"x }"));
  sources.push(SourceKind::Js, site.write("ok.js", r#"hasClass("hot")"#));
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  // The broken stylesheet still counted `.hot` before failing.
  assert_eq!(report.table.lookup(TagKind::Class, "hot"), Some("a"));

  let outcomes: Vec<_> = report.files.iter().map(|f| &f.outcome).collect();
  assert!(matches!(outcomes[0], FileOutcome::Rewritten { .. }));
  assert!(matches!(outcomes[1], FileOutcome::Skipped(FileError::Unreadable(_))));
  assert!(matches!(
    outcomes[2],
    FileOutcome::CopiedUnchanged {
      error: FileError::Lex(_),
      ..
    }
  ));
  assert!(matches!(outcomes[3], FileOutcome::Rewritten { .. }));

  assert!(!output_path(&site.out, &sources.html[1]).exists());
  assert_eq!(site.output(&sources.css[0]), ".hot { content: \"x }");
  assert_eq!(site.output(&sources.js[0]), r#"hasClass("a")"#);
}

#[test]
fn rewritten_files_only_mention_new_names() {
  let site = Site::new();
  let sources = site_sources(&site);
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  for (kind, path) in sources.iter() {
    let output = site.output(path);
    let output = output.as_bytes();
    let mut seen = Vec::new();
    kind
      .scan(output, &mut |f: Found| seen.push((f.kind, f.name(output).into_owned())))
      .unwrap();
    for (tag_kind, name) in seen {
      // Anything still spelled like a renamed tag must be a new name.
      let renamed_from = report
        .table
        .records()
        .iter()
        .any(|r| r.kind == tag_kind && r.name == name);
      assert!(!renamed_from, "{} still contains {tag_kind} {name}", path.display());
    }
  }
}

#[test]
fn latin1_pages_are_renamed_byte_for_byte() {
  let site = Site::new();
  let mut sources = SourceSet::new();
  let a = site.write("a.html", b"<p class=\"menu\">caf\xe9</p>");
  let b = site.write("b.html", r#"<p class="menu">cafe</p>"#);
  sources.push(SourceKind::Html, a.clone());
  sources.push(SourceKind::Html, b);
  sources.push(SourceKind::Js, site.write("app.js", b"alert('\xe9'); addClass(\"menu\")"));
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  assert_eq!(report.table.lookup(TagKind::Class, "menu"), Some("a"));
  assert!(matches!(report.files[0].outcome, FileOutcome::Rewritten { .. }));
  assert_eq!(
    fs::read(output_path(&site.out, &a)).unwrap(),
    b"<p class=\"a\">caf\xe9</p>"
  );
  assert_eq!(
    fs::read(output_path(&site.out, &sources.js[0])).unwrap(),
    b"alert('\xe9'); addClass(\"a\")"
  );
}

#[test]
fn escaped_css_selectors_match_markup() {
  let site = Site::new();
  let mut sources = SourceSet::new();
  sources.push(SourceKind::Html, site.write("a.html", r#"<p class="md:flex">"#));
  sources.push(SourceKind::Html, site.write("b.html", r#"<i class="md:flex">"#));
  sources.push(SourceKind::Css, site.write("s.css", r".md\:flex:hover { x: y }"));
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  // The selector counts by its decoded name, like the markup.
  assert_eq!(report.table.records()[0].weight, 21);
  assert_eq!(site.output(&sources.css[0]), ".a:hover { x: y }");
  assert_eq!(site.output(&sources.html[1]), r#"<i class="a">"#);
}

#[test]
fn inputs_sharing_an_output_path_are_written_once() {
  let site = Site::new();
  let mut sources = SourceSet::new();
  sources.push(SourceKind::Html, site.write("sub/a.html", r#"<p class="x">"#));
  sources.push(SourceKind::Html, site.write("a.html", r#"<b class="x">"#));
  // Reads site/a.html but maps to the same output as `sub/a.html`.
  sources.push(SourceKind::Html, site.root.join("sub/../a.html"));
  let report = crunch(&CrunchOptions::new(&site.out), &sources).unwrap();

  assert!(matches!(report.files[0].outcome, FileOutcome::Rewritten { .. }));
  assert!(matches!(report.files[1].outcome, FileOutcome::Rewritten { .. }));
  match &report.files[2].outcome {
    FileOutcome::Skipped(FileError::OutputClash(dest)) => {
      assert_eq!(dest, &output_path(&site.out, &sources.html[0]))
    }
    other => panic!("unexpected outcome {other:?}"),
  }
  assert_eq!(site.output(&sources.html[0]), r#"<p class="a">"#);
}
