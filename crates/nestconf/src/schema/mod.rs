//! declarative schemas
//!
//! A schema is a tree of [Section]s. Each section maps keys to [Container]s, a container is
//! either a nested section or one of the value containers deciding how the literals assigned to
//! a key are turned into a [crate::Value]:
//!
//! | container | accepts |
//! |-----------|---------|
//! | [ValueField] | one scalar (a one-element list is unwrapped) |
//! | [ListField] | any number of values, repeated keys are concatenated |
//! | [ArrayField] | a fixed number of values of one type |
//! | [TypedArrayField] | one value per slot, each slot with its own type |
//! | [ChoiceField] | whatever the first matching alternative accepts |
//!
//! Schemas are built with builder methods and checked once by [Schema::new]. A checked schema
//! is immutable and can be shared between threads.
mod containers;
mod section;

pub use containers::{
    ArrayField, ChoiceField, CliMeta, FieldMeta, ListField, TypedArrayField, ValueField,
};
pub use section::{Repeat, Section};

use crate::error::{SchemaError, ValidationError};
use crate::raw::RawSection;
use crate::validated::ValidatedSection;

#[derive(Debug, Clone)]
pub enum Container {
    Section(Section),
    Value(ValueField),
    List(ListField),
    Array(ArrayField),
    TypedArray(TypedArrayField),
    Choice(ChoiceField),
}

/// A checked schema, ready to validate documents
#[derive(Debug, Clone)]
pub struct Schema {
    root: Section,
}

impl Schema {
    /// Check `root` and every nested container
    ///
    /// The top-level section can not take arguments, be unique or repeat, since there is
    /// exactly one document.
    pub fn new(root: Section) -> Result<Self, SchemaError> {
        if root.args_container().is_some() {
            return Err(SchemaError::RootMetadata("args"));
        }
        if root.is_unique() {
            return Err(SchemaError::RootMetadata("unique"));
        }
        if root.repeat_bounds() != Repeat::ONCE {
            return Err(SchemaError::RootMetadata("repeat"));
        }
        root.check_schema("")?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    pub fn validate(&self, raw: &RawSection) -> Result<ValidatedSection, ValidationError> {
        self.root.validate(raw, "")
    }

    /// Value containers reachable without ambiguity, with their dotted key
    ///
    /// Sections that can appear more than once (or take arguments) are skipped, an override
    /// from the command line could not tell which instance it is meant for.
    pub fn cli_values(&self) -> Vec<(String, &Container)> {
        let mut values = vec![];
        collect_cli_values(&self.root, "", &mut values);
        values
    }
}

fn collect_cli_values<'s>(section: &'s Section, path: &str, out: &mut Vec<(String, &'s Container)>) {
    for (key, container) in section.keys() {
        let key_path = join_path(path, key);
        match container {
            Container::Section(child) => {
                if child.repeat_bounds().max == Some(1) && child.args_container().is_none() {
                    collect_cli_values(child, &key_path, out);
                }
            }
            container => out.push((key_path, container)),
        }
    }
}

pub(crate) fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    #[test]
    fn root_metadata_is_rejected() {
        let err = Schema::new(Section::new().args(Type::String)).unwrap_err();
        assert_eq!(err, SchemaError::RootMetadata("args"));

        let err = Schema::new(Section::new().unique()).unwrap_err();
        assert_eq!(err, SchemaError::RootMetadata("unique"));

        let err = Schema::new(Section::new().repeat(Repeat::MANY)).unwrap_err();
        assert_eq!(err, SchemaError::RootMetadata("repeat"));

        assert!(Schema::new(Section::new().allow_unknown()).is_ok());
    }

    #[test]
    fn nested_containers_are_checked() {
        let err = Schema::new(Section::new().key(
            "server",
            Section::new().repeat(Repeat::new(2, Some(1))),
        ))
        .unwrap_err();
        assert!(matches!(err, SchemaError::RepeatBounds { min: 2, max: 1, .. }));

        let err = Schema::new(Section::new().key(
            "server",
            Section::new().args(Section::new()),
        ))
        .unwrap_err();
        assert_eq!(err, SchemaError::SectionArgument("server".to_string()));

        let err = Schema::new(Section::new().key(
            "value",
            ChoiceField::new().or(Type::String).or(Section::new()),
        ))
        .unwrap_err();
        assert_eq!(err, SchemaError::SectionAlternative("value".to_string()));

        let err = Schema::new(Section::new().key("value", ChoiceField::new())).unwrap_err();
        assert_eq!(err, SchemaError::EmptyChoice("value".to_string()));

        let err = Schema::new(
            Section::new()
                .key("outer", Section::new().key("a", Type::String).key("a", Type::Boolean)),
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey("outer.a".to_string()));
    }

    #[test]
    fn cli_values_skip_repeated_sections() {
        let schema = Schema::new(
            Section::new()
                .key("debug", ValueField::new(Type::Boolean).arg("--debug"))
                .key("log", Section::new().key("level", Type::String))
                .key(
                    "server",
                    Section::new()
                        .args(Type::String)
                        .repeat(Repeat::ANY)
                        .key("port", Type::integer()),
                ),
        )
        .unwrap();

        let keys: Vec<_> = schema
            .cli_values()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["debug", "log.level"]);
    }

    #[test]
    fn schemas_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
