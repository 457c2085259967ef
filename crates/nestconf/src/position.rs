//! source positions attached to tokens, raw nodes and errors
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Where a piece of configuration came from
///
/// `source` is the path of the file that was read, or the name given to an in-memory
/// text. Positions inside included files carry the included file's path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, derive_new::new)]
pub struct Position {
    pub source: Arc<str>,
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
}

impl Position {
    /// Position of the very first character of `source`
    pub fn start_of(source: Arc<str>) -> Self {
        Self::new(source, 1, 1)
    }

    pub fn is_in(&self, path: &Path) -> bool {
        Path::new(&*self.source) == path
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}
