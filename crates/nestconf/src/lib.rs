//! # nestconf - nested section configuration
//!
//! Parses configuration files made of nested, named sections and validates them against a
//! schema built in code.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `nestconf` works internally.
//!
//! ### Language
//!
//! In nestconf terms...
//! - a file gets parsed as the (unnamed) root `section`
//! - ...which is a list of `statements`
//! - ...where there are three kinds:
//!   - `assignment`: a "key = value" pair, where the value may be a comma separated list
//!   - `section`:
//!     - 1 `name`
//!     - followed by 0 or more comma separated `arguments`
//!     - and more statements enclosed in `{` and `}`
//!   - `include`: splices the statements of other files into the current section
//!
//! This is a valid file:
//! ```text
//! # comments start with a hash
//!
//! name = 'frontend'
//! debug = yes
//! cache_size = 64Mi
//! paths = '/bin', '/usr/bin'
//!
//! server 'www', 'static' {
//!     listen = '0.0.0.0:80'
//!     mode = fast
//! }
//!
//! include 'conf.d/*.conf'
//! ```
//!
//! ### Parsing
//!
//! see [Document::parse]
//!
//! The [lexer] turns text into positioned tokens, the [parser] builds a [RawSection] tree out
//! of them. Values keep their lexical type ([Literal]): bare words are strings, numbers may have
//! a unit suffix (`64Mi`), `yes`/`no`/`on`/`off`/`true`/`false` are booleans.
//!
//! Includes are expanded while parsing by an [include::IncludeResolver], patterns are relative to
//! the directory of the including file. Every token, and therefore every raw node, knows the file
//! it came from ([Position]).
//!
//! ### Validation
//!
//! see [Document::validate] and [schema]
//!
//! A [Schema] is a tree of [schema::Section]s whose keys map to [schema::Container]s. Validation
//! walks the raw tree and the schema tree together:
//!
//! - section arguments, repeat counts and argument uniqueness are checked
//! - leaf literals are converted by a [Type] into typed [Value]s
//! - keys that are not declared are rejected, or kept as-is when the section allows unknown keys
//!
//! The result is a [ValidatedSection] that can be queried or exported as plain data.
//!
//! **Example**
//!
//! ```
//! use nestconf::schema::{ListField, Section, ValueField};
//! use nestconf::{Document, Schema, Type, Value};
//!
//! let schema = Schema::new(
//!     Section::new()
//!         .key("debug", ValueField::new(Type::Boolean))
//!         .key("paths", ListField::new(Type::String)),
//! )
//! .unwrap();
//!
//! let config = Document::from_text("debug = yes\npaths = '/bin', '/usr/bin'", "example")
//!     .validate(&schema)
//!     .unwrap();
//!
//! assert_eq!(config.get("debug"), Some(&Value::Boolean(true)));
//! assert_eq!(
//!     config.get("paths"),
//!     Some(&Value::List(vec!["/bin".into(), "/usr/bin".into()]))
//! );
//! ```
//!
//! ### Output
//!
//! [ValidatedSection::to_mapping] (or [RawSection::to_mapping] without a schema) returns plain
//! data which in turn gets serialized via [serde]. [render::to_string] writes a validated tree
//! back out in the configuration language.
//!
pub mod error;
pub mod include;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod position;
pub mod raw;
pub mod render;
pub mod schema;
pub mod types;
pub mod validated;
pub mod value;

pub use error::{Error, ParseError, SchemaError, ValidationError};
pub use literal::Literal;
pub use parser::ParseOptions;
pub use position::Position;
pub use raw::RawSection;
pub use schema::Schema;
pub use types::Type;
pub use validated::ValidatedSection;
pub use value::Value;

use error::ParseIssue;
use include::{GlobResolver, IncludeResolver};
use parser::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A configuration text together with everything needed to parse it
pub struct Document {
    text: String,
    source: Arc<str>,
    base_dir: PathBuf,
    options: ParseOptions,
    resolver: Box<dyn IncludeResolver>,
}

impl Document {
    /// In-memory text, `name` shows up in positions
    ///
    /// Includes are resolved relative to the process working directory unless a base directory
    /// is set with [Document::with_base_dir].
    pub fn from_text(text: impl Into<String>, name: &str) -> Self {
        Self {
            text: text.into(),
            source: name.into(),
            base_dir: PathBuf::from("."),
            options: ParseOptions::default(),
            resolver: Box::new(GlobResolver),
        }
    }

    /// Reads a file, includes are resolved relative to its directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading file");

        let text = std::fs::read_to_string(path).map_err(|source| {
            ParseError::new(
                ParseIssue::Io {
                    path: path.to_path_buf(),
                    source,
                },
                None::<Position>,
            )
        })?;

        Ok(Self::from_text(text, &path.display().to_string())
            .with_base_dir(path.parent().unwrap_or(Path::new(""))))
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: impl IncludeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse into the raw tree, expanding includes
    pub fn parse(&self) -> Result<RawSection, ParseError> {
        Parser::new(
            &self.text,
            self.source.clone(),
            &self.options,
            self.resolver.as_ref(),
            &self.base_dir,
        )
        .parse_document()
    }

    /// Parse and validate against `schema`
    pub fn validate(&self, schema: &Schema) -> Result<ValidatedSection, Error> {
        let raw = self.parse()?;
        Ok(schema.validate(&raw)?)
    }
}
