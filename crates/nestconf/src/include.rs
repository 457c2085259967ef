//! resolving `include` directives
//!
//! The parser only knows a pattern and the directory of the including file. Finding the
//! matching files and reading them is delegated to an [IncludeResolver]; [GlobResolver] is
//! the file system implementation used by default.
use crate::error::ParseIssue;
use std::path::{Path, PathBuf};

pub trait IncludeResolver {
    /// Files matching `pattern`, in the order they must be included
    fn resolve(&self, pattern: &str, relative_to: &Path) -> Result<Vec<PathBuf>, ParseIssue>;

    /// UTF-8 contents of a resolved file
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// What to do when an include pattern matches nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyIncludePolicy {
    /// the include is a no-op
    #[default]
    Ignore,
    /// fail with [ParseIssue::IncludeNoMatch]
    Error,
}

/// Expands patterns with [glob] relative to the including file's directory
///
/// Matches are sorted by path, directories are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobResolver;

impl IncludeResolver for GlobResolver {
    fn resolve(&self, pattern: &str, relative_to: &Path) -> Result<Vec<PathBuf>, ParseIssue> {
        let full_pattern = if Path::new(pattern).is_absolute() || relative_to.as_os_str().is_empty()
        {
            pattern.to_string()
        } else {
            let base = glob::Pattern::escape(&relative_to.to_string_lossy());
            format!("{base}/{pattern}")
        };
        tracing::debug!(pattern = %full_pattern, "resolving include");

        let paths = glob::glob(&full_pattern).map_err(|err| ParseIssue::IncludePattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;

        let mut files = vec![];
        for entry in paths {
            let path = entry.map_err(|err| ParseIssue::Io {
                path: err.path().to_path_buf(),
                source: std::io::Error::from(err),
            })?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}
