//! Shrinks a site by renaming its HTML ids and classes to short names, and
//! rewriting the CSS selectors and JS DOM calls that refer to them.
//!
//! # Examples
//!
//! ```
//! use html_cruncher::{SourceKind, TagKind, TagRegistry, Occurrence};
//! use std::path::Path;
//!
//! let registry = TagRegistry::new();
//! SourceKind::Html.collect(&registry, Path::new("a.html"), br#"<p class="intro">"#).unwrap();
//! SourceKind::Css.collect(&registry, Path::new("a.css"), b".intro { margin: 0 }").unwrap();
//! // Referenced but never declared in markup, so never renamed.
//! registry.add(TagKind::Class, "ghost", Path::new("a.css"), Occurrence::Referential);
//!
//! let mut registry = registry;
//! registry.filter_uncommon();
//! let table = registry.assign_names();
//! let css = SourceKind::Css.rewrite(&table, b".intro, .ghost { margin: 0 }").unwrap();
//! assert_eq!(css, b".a, .ghost { margin: 0 }");
//! ```

pub use batch::crunch;
pub use batch::output_path;
pub use batch::CrunchOptions;
pub use batch::CrunchReport;
pub use batch::FileOutcome;
pub use batch::FileReport;
pub use batch::Phase;
pub use err::CrunchError;
pub use err::FileError;
pub use err::LexError;
pub use err::LexErrorType;
pub use err::Loc;
pub use input::SourceSet;
pub use name::short_name;
pub use name::ShortNames;
pub use registry::RenameTable;
pub use registry::TagRegistry;
pub use source::Found;
pub use source::SourceKind;
pub use tag::Occurrence;
pub use tag::TagKind;
pub use tag::TagRecord;

mod batch;
mod err;
mod input;
mod name;
mod registry;
pub mod source;
mod tag;
