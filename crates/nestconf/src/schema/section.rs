//! sections and the validation walk
use super::containers::Fallback;
use super::{join_path, Container};
use crate::error::{Issue, SchemaError, ValidationError};
use crate::literal::Literal;
use crate::raw::{Assignment, RawSection};
use crate::validated::{Entry, ValidatedSection};
use crate::value::Value;
use indexmap::IndexMap;

/// How many times a section may appear, `max: None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub min: usize,
    pub max: Option<usize>,
}

impl Repeat {
    pub const ONCE: Repeat = Repeat::new(1, Some(1));
    pub const MANY: Repeat = Repeat::new(1, None);
    pub const ANY: Repeat = Repeat::new(0, None);
    pub const OPTIONAL: Repeat = Repeat::new(0, Some(1));

    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::ONCE
    }
}

#[derive(Debug, Clone, Default)]
pub struct Section {
    keys: IndexMap<String, Container>,
    args: Option<Box<Container>>,
    unique: bool,
    repeat: Repeat,
    allow_unknown: bool,
    /// keys declared more than once, reported by [super::Schema::new]
    duplicates: Vec<String>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key
    pub fn key(mut self, name: impl Into<String>, container: impl Into<Container>) -> Self {
        let name = name.into();
        if self.keys.insert(name.clone(), container.into()).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Validate the section arguments with `container`
    pub fn args(mut self, container: impl Into<Container>) -> Self {
        self.args = Some(Box::new(container.into()));
        self
    }

    /// Sibling instances must have different arguments
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Keep undeclared keys and sections instead of failing
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Add the keys of `base` that are not declared here
    ///
    /// Metadata (args, repeat, ...) is not inherited.
    pub fn extend(mut self, base: &Section) -> Self {
        for (key, container) in &base.keys {
            if !self.keys.contains_key(key) {
                self.keys.insert(key.clone(), container.clone());
            }
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, &Container)> {
        self.keys.iter().map(|(key, container)| (key.as_str(), container))
    }

    pub fn get(&self, key: &str) -> Option<&Container> {
        self.keys.get(key)
    }

    pub fn args_container(&self) -> Option<&Container> {
        self.args.as_deref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn repeat_bounds(&self) -> Repeat {
        self.repeat
    }

    pub fn allows_unknown(&self) -> bool {
        self.allow_unknown
    }

    pub(crate) fn check_schema(&self, path: &str) -> Result<(), SchemaError> {
        if let Some(duplicate) = self.duplicates.first() {
            return Err(SchemaError::DuplicateKey(join_path(path, duplicate)));
        }
        if let Repeat {
            min,
            max: Some(max),
        } = self.repeat
        {
            if min > max {
                return Err(SchemaError::RepeatBounds {
                    key: path.to_string(),
                    min,
                    max,
                });
            }
        }
        if let Some(args) = self.args_container() {
            if matches!(args, Container::Section(_)) {
                return Err(SchemaError::SectionArgument(path.to_string()));
            }
            args.check_schema(path)?;
        }
        for (key, container) in &self.keys {
            container.check_schema(&join_path(path, key))?;
        }
        Ok(())
    }

    /// Validate one raw section, `path` is its dotted path from the root
    #[tracing::instrument(level = "trace", skip_all, fields(path = %path))]
    pub(crate) fn validate(
        &self,
        raw: &RawSection,
        path: &str,
    ) -> Result<ValidatedSection, ValidationError> {
        let mut validated = ValidatedSection::new(raw.name.clone(), raw.position.clone());
        validated.args = self.validate_args(raw, path)?;
        validated.raw_args = raw.args.clone();

        for (key, container) in &self.keys {
            let key_path = join_path(path, key);
            match container {
                Container::Section(schema) => {
                    if let Some(assignment) = raw.assignments_to(key).next() {
                        return Err(ValidationError::new(
                            key_path,
                            Some(assignment.position.clone()),
                            Issue::ExpectedSection(key.clone()),
                        ));
                    }
                    let sections = schema.validate_instances(raw, key, &key_path)?;
                    validated.subsections.insert(key.clone(), sections);
                }
                field => {
                    if let Some(child) = raw.subsections(key).next() {
                        return Err(ValidationError::new(
                            key_path,
                            Some(child.position.clone()),
                            Issue::ExpectedValue(key.clone()),
                        ));
                    }

                    let assignments: Vec<&Assignment> = raw.assignments_to(key).collect();
                    if !assignments.is_empty() {
                        let entry = field.check_assignments(&key_path, &assignments)?;
                        validated.values.insert(key.clone(), entry);
                        continue;
                    }

                    match field.fallback() {
                        Fallback::Default(value) => {
                            tracing::trace!(key = %key_path, "using default");
                            validated
                                .values
                                .insert(key.clone(), Entry::new(value.clone(), None, None));
                        }
                        Fallback::Optional => {}
                        Fallback::Required => {
                            return Err(ValidationError::new(
                                path,
                                Some(raw.position.clone()),
                                Issue::MissingKey(key.clone()),
                            ));
                        }
                    }
                }
            }
        }

        for assignment in &raw.assignments {
            if self.keys.contains_key(&assignment.key) {
                continue;
            }
            if !self.allow_unknown {
                return Err(ValidationError::new(
                    join_path(path, &assignment.key),
                    Some(assignment.position.clone()),
                    Issue::UnknownKey(assignment.key.clone()),
                ));
            }
            // last assignment wins, like in the raw mapping
            validated
                .unknown
                .insert(assignment.key.clone(), assignment.value.clone());
        }

        for child in &raw.children {
            if self.keys.contains_key(&child.name) {
                continue;
            }
            if !self.allow_unknown {
                return Err(ValidationError::new(
                    join_path(path, &child.name),
                    Some(child.position.clone()),
                    Issue::UnknownSection(child.name.clone()),
                ));
            }
            validated
                .unknown_sections
                .entry(child.name.clone())
                .or_default()
                .push(child.clone());
        }

        Ok(validated)
    }

    fn validate_args(&self, raw: &RawSection, path: &str) -> Result<Vec<Value>, ValidationError> {
        let fail = |issue| ValidationError::new(path, Some(raw.position.clone()), issue);

        let Some(container) = self.args_container() else {
            if raw.args.is_empty() {
                return Ok(vec![]);
            }
            return Err(fail(Issue::UnexpectedArgument));
        };

        let value = match raw.args.as_slice() {
            [] => match container.fallback() {
                Fallback::Default(value) => value.clone(),
                Fallback::Optional => return Ok(vec![]),
                Fallback::Required => return Err(fail(Issue::MissingArgument)),
            },
            [single] => container.check(single).map_err(fail)?,
            args => container
                .check(&Literal::List(args.to_vec()))
                .map_err(fail)?,
        };

        Ok(match value {
            Value::List(items) if container.is_sequence() => items,
            value => vec![value],
        })
    }

    /// Validate every raw child named `key` against this section
    fn validate_instances(
        &self,
        parent: &RawSection,
        key: &str,
        path: &str,
    ) -> Result<Vec<ValidatedSection>, ValidationError> {
        let instances: Vec<&RawSection> = parent.subsections(key).collect();

        if !self.repeat.contains(instances.len()) {
            // point at the first instance too many, or at the parent when some are missing
            let position = self
                .repeat
                .max
                .and_then(|max| instances.get(max))
                .map_or(&parent.position, |instance| &instance.position);
            return Err(ValidationError::new(
                path,
                Some(position.clone()),
                Issue::RepeatCount {
                    key: key.to_string(),
                    found: instances.len(),
                    min: self.repeat.min,
                    max: self.repeat.max,
                },
            ));
        }

        let mut validated: Vec<ValidatedSection> = Vec::with_capacity(instances.len());
        for instance in instances {
            let section = self.validate(instance, path)?;

            if self.unique && validated.iter().any(|other| other.args == section.args) {
                return Err(ValidationError::new(
                    path,
                    Some(section.position.clone()),
                    Issue::Duplicate {
                        key: key.to_string(),
                        arguments: describe_args(&section.args),
                    },
                ));
            }
            validated.push(section);
        }

        Ok(validated)
    }
}

fn describe_args(args: &[Value]) -> String {
    if args.is_empty() {
        return "(none)".to_string();
    }
    args.iter()
        .map(|value| match value.to_literal() {
            Some(literal) => literal.to_string(),
            None => format!("{value:?}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
