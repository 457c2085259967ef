//! error types surfaced by parsing and validation
//!
//! - [ParseError]: lexical and syntactic problems, include failures. Always tied to a
//!   [Position] unless the input ended unexpectedly without one.
//! - [ValidationError]: the parse tree does not fit the schema. Carries the dotted path
//!   of the offending node and the position of the raw node (never the schema).
//! - [SchemaError]: the schema itself is inconsistent. Raised when a [crate::schema::Schema]
//!   is built, before any input is looked at.
use crate::literal::NumberError;
use crate::position::Position;
use crate::types::TypeError;
use std::fmt;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub struct ParseError {
    pub issue: ParseIssue,
    pub position: Option<Position>,
}

impl ParseError {
    pub fn new(issue: ParseIssue, position: impl Into<Option<Position>>) -> Self {
        Self {
            issue,
            position: position.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{position}: {}", self.issue),
            None => self.issue.fmt(f),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParseIssue {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    #[error("illegal character {0:?}")]
    IllegalCharacter(char),
    #[error(transparent)]
    Number(#[from] NumberError),
    #[error("syntax error near {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },
    #[error("syntax error near {found}, newline missing?")]
    MissingSeparator { found: String },
    #[error("unexpected end of input, section {name:?} is not closed")]
    UnclosedSection { name: String },
    #[error("sections nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("includes nested deeper than {limit} levels (include cycle?)")]
    IncludeTooDeep { limit: usize },
    #[error("include pattern {pattern:?} matches no file")]
    IncludeNoMatch { pattern: String },
    #[error("invalid include pattern {pattern:?}: {message}")]
    IncludePattern { pattern: String, message: String },
    #[error("unable to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Dotted path from the document root, empty for the root itself
    pub path: String,
    pub position: Option<Position>,
    pub issue: Issue,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, position: Option<Position>, issue: Issue) -> Self {
        let error = Self {
            path: path.into(),
            position,
            issue,
        };
        tracing::trace!(%error, "validation failed");
        error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(position) = &self.position {
            write!(f, "{position}: ")?;
        }
        if !self.path.is_empty() {
            write!(f, "{}: ", self.path)?;
        }
        self.issue.fmt(f)
    }
}

/// What went wrong during validation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Issue {
    #[error("missing required key {0:?}")]
    MissingKey(String),
    #[error("unknown key {0:?}")]
    UnknownKey(String),
    #[error("unknown section {0:?}")]
    UnknownSection(String),
    #[error("{0:?} must be a section, found an assignment")]
    ExpectedSection(String),
    #[error("{0:?} must be an assignment, found a section")]
    ExpectedValue(String),
    #[error("section {key:?} must be defined {}, found {found}", bounds(.min, .max))]
    RepeatCount {
        key: String,
        found: usize,
        min: usize,
        max: Option<usize>,
    },
    #[error("section {key:?} must be unique, argument {arguments} is already used")]
    Duplicate { key: String, arguments: String },
    #[error("this section does not take any argument")]
    UnexpectedArgument,
    #[error("this section requires an argument")]
    MissingArgument,
    #[error("key is assigned {count} times")]
    AssignedTwice { count: usize },
    #[error("expected a single value, found a list of {found} items")]
    NotAScalar { found: usize },
    #[error("bad array size (should be {expected}, found {found} items)")]
    ArraySize { expected: usize, found: usize },
    #[error("item #{index}, {source}")]
    Item {
        index: usize,
        #[source]
        source: TypeError,
    },
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("no alternative matches: {}", .0.join("; "))]
    NoAlternative(Vec<String>),
}

struct Bounds(usize, Option<usize>);

fn bounds(min: &usize, max: &Option<usize>) -> Bounds {
    Bounds(*min, *max)
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds(min, Some(max)) if min == max => write!(f, "exactly {min} time(s)"),
            Bounds(min, Some(max)) => write!(f, "between {min} and {max} times"),
            Bounds(min, None) => write!(f, "at least {min} time(s)"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("key {key:?}, repeat minimum {min} is greater than maximum {max}")]
    RepeatBounds { key: String, min: usize, max: usize },
    #[error("the top-level section can not set {0}")]
    RootMetadata(&'static str),
    #[error("key {0:?}, a section can not be used as section argument")]
    SectionArgument(String),
    #[error("key {0:?}, a section can not be a choice alternative")]
    SectionAlternative(String),
    #[error("key {0:?}, a choice needs at least one alternative")]
    EmptyChoice(String),
    #[error("key {0:?} is declared more than once")]
    DuplicateKey(String),
    #[error("invalid regular expression {pattern:?}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Any error returned by [crate::Document::validate]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
