//! raw parse tree ([RawSection] and [Assignment])
//!
//! A raw tree is what the parser produces before any schema is applied:
//! - a section has a name, zero or more argument literals
//! - ...its assignments, in source order (a key may appear more than once)
//! - ...and its child sections, in source order
//!
//! The document itself is the unnamed, argument-less root section. Without a schema the raw tree
//! is the final result, [RawSection::to_mapping] turns it into plain data.
use crate::literal::Literal;
use crate::position::Position;
use crate::value::Value;
use indexmap::IndexMap;

/// Key under which section arguments are exported by `to_mapping`
pub const ARGS_KEY: &str = "__args__";

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Assignment {
    pub key: String,
    pub value: Literal,
    /// position of the key
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub name: String,
    pub args: Vec<Literal>,
    pub position: Position,
    pub assignments: Vec<Assignment>,
    pub children: Vec<RawSection>,
}

impl RawSection {
    pub fn new(name: impl Into<String>, args: Vec<Literal>, position: Position) -> Self {
        Self {
            name: name.into(),
            args,
            position,
            assignments: vec![],
            children: vec![],
        }
    }

    /// The implicit top-level section of a document
    pub fn root(position: Position) -> Self {
        Self::new("", vec![], position)
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Value of the last assignment to `key`
    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.assignments
            .iter()
            .rev()
            .find(|assignment| assignment.key == key)
            .map(|assignment| &assignment.value)
    }

    pub fn assignments_to<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Assignment> {
        self.assignments
            .iter()
            .filter(move |assignment| assignment.key == key)
    }

    pub fn subsections<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawSection> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Appends the statements of another (included) section
    pub fn splice(&mut self, other: RawSection) {
        self.assignments.extend(other.assignments);
        self.children.extend(other.children);
    }

    /// Plain mapping of this section
    ///
    /// - the last assignment to a key wins
    /// - subsections are exported as a list of mappings under their name
    /// - arguments (if any) are exported as a list under [ARGS_KEY]
    pub fn to_mapping(&self) -> IndexMap<String, Value> {
        let mut mapping = IndexMap::new();

        if !self.args.is_empty() {
            mapping.insert(
                ARGS_KEY.to_string(),
                Value::List(self.args.iter().map(Value::from).collect()),
            );
        }

        for assignment in &self.assignments {
            mapping.insert(assignment.key.clone(), Value::from(&assignment.value));
        }

        let mut sections: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for child in &self.children {
            sections
                .entry(child.name.as_str())
                .or_default()
                .push(Value::Map(child.to_mapping()));
        }
        for (name, list) in sections {
            mapping.insert(name.to_string(), Value::List(list));
        }

        mapping
    }
}

/// Utility macro to parse a [RawSection] from text
///
/// ```
/// # use nestconf::raw_section;
/// let raw = raw_section!("attribute = 42");
/// assert_eq!(raw.get("attribute"), Some(&nestconf::Literal::Integer(42)));
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use nestconf::raw_section;
/// raw_section!("not = valid = config");
/// ```
#[macro_export]
macro_rules! raw_section {
    { $expr:expr } => {
        $crate::Document::from_text($expr, "<inline>")
            .parse()
            .expect("document must parse")
    };
}
