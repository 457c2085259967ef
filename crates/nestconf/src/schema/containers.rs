//! leaf containers: how the literals assigned to one key become a [Value]
use super::{Container, Section};
use crate::error::{Issue, SchemaError, ValidationError};
use crate::literal::Literal;
use crate::raw::Assignment;
use crate::types::Type;
use crate::validated::Entry;
use crate::value::Value;

/// Command line metadata, read by an external argument parser
///
/// Nothing in this crate reads process arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliMeta {
    /// flag names (`-d`, `--debug`), empty means "not exposed"
    pub names: Vec<String>,
    pub help: Option<String>,
    pub metavar: Option<String>,
    /// names of the negating flag for booleans (`--no-debug`)
    pub invert_names: Vec<String>,
    pub invert_help: Option<String>,
}

/// Settings shared by all value containers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    /// used as-is when the key is absent
    pub default: Option<Value>,
    /// absent keys are left out instead of failing
    pub optional: bool,
    pub cli: CliMeta,
}

/// What happens when a key is absent
pub(crate) enum Fallback<'a> {
    Default(&'a Value),
    Optional,
    Required,
}

impl FieldMeta {
    pub(crate) fn fallback(&self) -> Fallback<'_> {
        match (&self.default, self.optional) {
            (Some(default), _) => Fallback::Default(default),
            (None, true) => Fallback::Optional,
            (None, false) => Fallback::Required,
        }
    }
}

macro_rules! field_builders {
    ($($field:ty),*) => {$(
        impl $field {
            pub fn with_default(mut self, value: impl Into<Value>) -> Self {
                self.meta.default = Some(value.into());
                self
            }

            /// Replace all metadata at once
            pub fn with_meta(mut self, meta: FieldMeta) -> Self {
                self.meta = meta;
                self
            }

            pub fn optional(mut self) -> Self {
                self.meta.optional = true;
                self
            }

            /// Add a command line name (`-x` or `--long`)
            pub fn arg(mut self, name: impl Into<String>) -> Self {
                self.meta.cli.names.push(name.into());
                self
            }

            pub fn help(mut self, help: impl Into<String>) -> Self {
                self.meta.cli.help = Some(help.into());
                self
            }

            pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
                self.meta.cli.metavar = Some(metavar.into());
                self
            }

            /// Name and help of the flag turning a boolean off
            pub fn invert(mut self, name: impl Into<String>, help: impl Into<String>) -> Self {
                self.meta.cli.invert_names.push(name.into());
                self.meta.cli.invert_help = Some(help.into());
                self
            }

            pub fn meta(&self) -> &FieldMeta {
                &self.meta
            }
        }
    )*};
}

field_builders!(ValueField, ListField, ArrayField, TypedArrayField, ChoiceField);

/// A single scalar
#[derive(Debug, Clone)]
pub struct ValueField {
    pub ty: Type,
    meta: FieldMeta,
}

impl ValueField {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            meta: FieldMeta::default(),
        }
    }

    /// Whether a command line front-end should expose this key as a flag without value
    pub fn is_flag(&self) -> bool {
        self.ty.is_flag()
    }

    fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        let literal = match literal {
            Literal::List(items) => match items.as_slice() {
                [single] => single,
                _ => return Err(Issue::NotAScalar { found: items.len() }),
            },
            scalar => scalar,
        };
        Ok(self.ty.validate(literal)?)
    }
}

/// Any number of values of one type
///
/// A scalar is a one-element list. A key assigned more than once collects all occurrences.
#[derive(Debug, Clone)]
pub struct ListField {
    pub ty: Type,
    meta: FieldMeta,
}

impl ListField {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            meta: FieldMeta::default(),
        }
    }

    fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        validate_items(literal.items(), |_| &self.ty)
    }
}

/// Exactly `size` values of one type
#[derive(Debug, Clone)]
pub struct ArrayField {
    pub ty: Type,
    pub size: usize,
    meta: FieldMeta,
}

impl ArrayField {
    pub fn new(ty: Type, size: usize) -> Self {
        Self {
            ty,
            size,
            meta: FieldMeta::default(),
        }
    }

    fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        let items = literal.items();
        if items.len() != self.size {
            return Err(Issue::ArraySize {
                expected: self.size,
                found: items.len(),
            });
        }
        validate_items(items, |_| &self.ty)
    }
}

/// One value per slot, each with its own type
#[derive(Debug, Clone)]
pub struct TypedArrayField {
    pub types: Vec<Type>,
    meta: FieldMeta,
}

impl TypedArrayField {
    pub fn new(types: Vec<Type>) -> Self {
        Self {
            types,
            meta: FieldMeta::default(),
        }
    }

    fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        let items = literal.items();
        if items.len() != self.types.len() {
            return Err(Issue::ArraySize {
                expected: self.types.len(),
                found: items.len(),
            });
        }
        validate_items(items, |index| &self.types[index])
    }
}

/// The first alternative that accepts the value wins
#[derive(Debug, Clone, Default)]
pub struct ChoiceField {
    pub alternatives: Vec<Container>,
    meta: FieldMeta,
}

impl ChoiceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or(mut self, alternative: impl Into<Container>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        let mut failures = vec![];
        for alternative in &self.alternatives {
            match alternative.check(literal) {
                Ok(value) => return Ok(value),
                Err(issue) => failures.push(issue.to_string()),
            }
        }
        Err(Issue::NoAlternative(failures))
    }
}

fn validate_items<'t>(
    items: &[Literal],
    type_of: impl Fn(usize) -> &'t Type,
) -> Result<Value, Issue> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            type_of(index).validate(item).map_err(|source| Issue::Item {
                index: index + 1,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

impl Container {
    /// Metadata of value containers, `None` for sections
    pub fn meta(&self) -> Option<&FieldMeta> {
        match self {
            Container::Section(_) => None,
            Container::Value(field) => Some(field.meta()),
            Container::List(field) => Some(field.meta()),
            Container::Array(field) => Some(field.meta()),
            Container::TypedArray(field) => Some(field.meta()),
            Container::Choice(field) => Some(field.meta()),
        }
    }

    /// Containers producing a [Value::List]
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            Container::List(_) | Container::Array(_) | Container::TypedArray(_)
        )
    }

    pub(crate) fn fallback(&self) -> Fallback<'_> {
        self.meta()
            .map(FieldMeta::fallback)
            .unwrap_or(Fallback::Required)
    }

    /// Validate one literal (a single assignment or the arguments of a section)
    pub(crate) fn check(&self, literal: &Literal) -> Result<Value, Issue> {
        match self {
            Container::Section(_) => Err(Issue::ExpectedSection(literal.to_string())),
            Container::Value(field) => field.check(literal),
            Container::List(field) => field.check(literal),
            Container::Array(field) => field.check(literal),
            Container::TypedArray(field) => field.check(literal),
            Container::Choice(field) => field.check(literal),
        }
    }

    /// Validate every assignment made to one key
    pub(crate) fn check_assignments(
        &self,
        path: &str,
        assignments: &[&Assignment],
    ) -> Result<Entry, ValidationError> {
        let fail = |issue, assignment: &Assignment| {
            ValidationError::new(path, Some(assignment.position.clone()), issue)
        };

        match (self, assignments) {
            (_, []) => Err(ValidationError::new(
                path,
                None,
                Issue::MissingKey(path.to_string()),
            )),
            (Container::List(field), [first, ..]) => {
                let mut values = vec![];
                let mut literals = vec![];
                for &assignment in assignments {
                    match field
                        .check(&assignment.value)
                        .map_err(|issue| fail(issue, assignment))?
                    {
                        Value::List(items) => values.extend(items),
                        value => values.push(value),
                    }
                    literals.extend(assignment.value.items().iter().cloned());
                }

                let raw = match assignments {
                    [single] => single.value.clone(),
                    _ => Literal::List(literals),
                };
                Ok(Entry::new(
                    Value::List(values),
                    Some(raw),
                    Some(first.position.clone()),
                ))
            }
            (_, [single]) => {
                let value = self
                    .check(&single.value)
                    .map_err(|issue| fail(issue, *single))?;
                Ok(Entry::new(
                    value,
                    Some(single.value.clone()),
                    Some(single.position.clone()),
                ))
            }
            (_, [_, second, ..]) => Err(fail(
                Issue::AssignedTwice {
                    count: assignments.len(),
                },
                *second,
            )),
        }
    }

    /// Checks applied when the schema is built
    pub(crate) fn check_schema(&self, key: &str) -> Result<(), SchemaError> {
        match self {
            Container::Section(section) => section.check_schema(key),
            Container::Choice(choice) => {
                if choice.alternatives.is_empty() {
                    return Err(SchemaError::EmptyChoice(key.to_string()));
                }
                for alternative in &choice.alternatives {
                    if matches!(alternative, Container::Section(_)) {
                        return Err(SchemaError::SectionAlternative(key.to_string()));
                    }
                    alternative.check_schema(key)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl From<Section> for Container {
    fn from(value: Section) -> Self {
        Container::Section(value)
    }
}

impl From<ValueField> for Container {
    fn from(value: ValueField) -> Self {
        Container::Value(value)
    }
}

impl From<ListField> for Container {
    fn from(value: ListField) -> Self {
        Container::List(value)
    }
}

impl From<ArrayField> for Container {
    fn from(value: ArrayField) -> Self {
        Container::Array(value)
    }
}

impl From<TypedArrayField> for Container {
    fn from(value: TypedArrayField) -> Self {
        Container::TypedArray(value)
    }
}

impl From<ChoiceField> for Container {
    fn from(value: ChoiceField) -> Self {
        Container::Choice(value)
    }
}

/// A bare type is a single value
impl From<Type> for Container {
    fn from(value: Type) -> Self {
        Container::Value(ValueField::new(value))
    }
}
