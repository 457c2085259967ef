//! validated configuration tree
use crate::literal::Literal;
use crate::position::Position;
use crate::raw::{RawSection, ARGS_KEY};
use crate::value::Value;
use indexmap::IndexMap;

/// A validated key
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Entry {
    pub value: Value,
    /// the literal as written, `None` when the value is a default
    pub raw: Option<Literal>,
    /// position of the (first) assignment, `None` when the value is a default
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSection {
    pub name: String,
    pub args: Vec<Value>,
    /// the arguments as written, empty when they come from a default
    pub raw_args: Vec<Literal>,
    pub position: Position,
    pub values: IndexMap<String, Entry>,
    /// every declared section key is present, possibly with no instance
    pub subsections: IndexMap<String, Vec<ValidatedSection>>,
    /// undeclared assignments, kept when the section allows unknown keys
    pub unknown: IndexMap<String, Literal>,
    pub unknown_sections: IndexMap<String, Vec<RawSection>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no section {0:?}")]
    Missing(String),
    #[error("section {name:?} is defined {count} times")]
    Ambiguous { name: String, count: usize },
}

impl ValidatedSection {
    pub(crate) fn new(name: String, position: Position) -> Self {
        Self {
            name,
            args: vec![],
            raw_args: vec![],
            position,
            values: IndexMap::new(),
            subsections: IndexMap::new(),
            unknown: IndexMap::new(),
            unknown_sections: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).map(|entry| &entry.value)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Literal of an undeclared key
    pub fn get_unknown(&self, key: &str) -> Option<&Literal> {
        self.unknown.get(key)
    }

    /// All instances of a section, empty when there is none
    pub fn subsections(&self, name: &str) -> &[ValidatedSection] {
        self.subsections
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The only instance of a section
    pub fn subsection(&self, name: &str) -> Result<&ValidatedSection, LookupError> {
        match self.subsections(name) {
            [single] => Ok(single),
            [] => Err(LookupError::Missing(name.to_string())),
            many => Err(LookupError::Ambiguous {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Plain mapping of this section
    ///
    /// - arguments (if any) are exported as a list under [ARGS_KEY]
    /// - subsections are exported as a list of mappings under their name
    /// - unknown keys and sections are exported like declared ones
    pub fn to_mapping(&self) -> IndexMap<String, Value> {
        let mut mapping = IndexMap::new();

        if !self.args.is_empty() {
            mapping.insert(ARGS_KEY.to_string(), Value::List(self.args.clone()));
        }

        for (key, entry) in &self.values {
            mapping.insert(key.clone(), entry.value.clone());
        }
        for (key, literal) in &self.unknown {
            mapping.insert(key.clone(), Value::from(literal));
        }

        for (name, sections) in &self.subsections {
            let list = sections
                .iter()
                .map(|section| Value::Map(section.to_mapping()))
                .collect();
            mapping.insert(name.clone(), Value::List(list));
        }
        for (name, sections) in &self.unknown_sections {
            let list = sections
                .iter()
                .map(|section| Value::Map(section.to_mapping()))
                .collect();
            mapping.insert(name.clone(), Value::List(list));
        }

        mapping
    }
}
