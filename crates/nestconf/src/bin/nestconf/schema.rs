//! schema files: a [Schema] described in the configuration language itself
//!
//! ```text
//! key name { type = string }
//! key port { type = integer; min = 1; max = 65535; default = 8080; arg = '--port' }
//! key paths { type = path; container = list; optional = yes }
//! key mode { type = choice; choices = fast, safe; default = fast }
//!
//! section server {
//!     args = string
//!     min = 0
//!     max = unbounded
//!     unique = yes
//!
//!     key listen { type = socket-address }
//! }
//! ```
//!
//! The attributes of every block are validated with a schema of their own.
use anyhow::{bail, Context};
use nestconf::raw::RawSection;
use nestconf::schema::{
    ArrayField, ChoiceField, CliMeta, Container, FieldMeta, ListField, Repeat, Section, ValueField,
};
use nestconf::{Document, Schema, Type, ValidatedSection, Value};
use std::path::Path;

const TYPE_NAMES: &[&str] = &[
    "string",
    "integer",
    "float",
    "boolean",
    "ip-address",
    "ip-network",
    "url",
    "socket-address",
    "path",
    "regex",
    "regex-pattern",
    "choice",
];

pub fn load(path: &Path) -> anyhow::Result<Schema> {
    let raw = Document::from_file(path)?.parse()?;
    from_raw(&raw)
}

pub fn from_raw(raw: &RawSection) -> anyhow::Result<Schema> {
    if let Some(assignment) = raw.assignments.first() {
        bail!(
            "{}: only key and section blocks are allowed at the top level",
            assignment.position
        );
    }
    Ok(Schema::new(blocks(Section::new(), raw)?)?)
}

fn blocks(mut section: Section, raw: &RawSection) -> anyhow::Result<Section> {
    for child in &raw.children {
        let name = match child.args.as_slice() {
            [name] => name.as_str(),
            _ => None,
        }
        .with_context(|| format!("{}: {} blocks take exactly one name", child.position, child.name))?;

        section = match child.name.as_str() {
            "key" => section.key(name, key(child)?),
            "section" => section.key(name, self::section(child)?),
            other => bail!("{}: unknown schema block {other:?}", child.position),
        };
    }
    Ok(section)
}

/// Validates the assignments of a block, `default` is left to the caller
fn attributes(raw: &RawSection, schema: &Schema) -> anyhow::Result<ValidatedSection> {
    let mut attributes = RawSection::root(raw.position.clone());
    attributes.assignments = raw
        .assignments
        .iter()
        .filter(|assignment| assignment.key != "default")
        .cloned()
        .collect();
    Ok(schema.validate(&attributes)?)
}

fn section_attributes() -> anyhow::Result<Schema> {
    let count = || Type::integer_range(Some(0), None);
    Ok(Schema::new(
        Section::new()
            .key("args", ValueField::new(Type::String).optional())
            .key("min", ValueField::new(count()).with_default(1_i64))
            .key(
                "max",
                ChoiceField::new()
                    .or(count())
                    .or(Type::regex("unbounded")?)
                    .with_default(1_i64),
            )
            .key("unique", ValueField::new(Type::Boolean).with_default(false))
            .key("allow_unknown", ValueField::new(Type::Boolean).with_default(false)),
    )?)
}

fn key_attributes() -> anyhow::Result<Schema> {
    let text = || ValueField::new(Type::String).optional();
    Ok(Schema::new(
        Section::new()
            .key("type", Type::one_of(TYPE_NAMES.iter().map(|name| (*name, *name))))
            .key(
                "container",
                ValueField::new(Type::one_of([
                    ("value", "value"),
                    ("list", "list"),
                    ("array", "array"),
                ]))
                .with_default("value"),
            )
            .key("size", ValueField::new(Type::integer_range(Some(1), None)).optional())
            .key("min", ValueField::new(Type::float()).optional())
            .key("max", ValueField::new(Type::float()).optional())
            .key("pattern", text())
            .key("choices", ListField::new(Type::String).optional())
            .key("optional", ValueField::new(Type::Boolean).with_default(false))
            .key("help", text())
            .key("metavar", text())
            .key("arg", ListField::new(Type::String).optional())
            .key("invert", text())
            .key("invert_help", text()),
    )?)
}

fn section(raw: &RawSection) -> anyhow::Result<Section> {
    let attributes = attributes(raw, &section_attributes()?)?;
    let mut section = Section::new();

    if let Some(name) = attributes.get("args").and_then(Value::as_str) {
        let ty = simple_type(name)
            .with_context(|| format!("{}: {name:?} can not be used for arguments", raw.position))?;
        section = section.args(ty);
    }

    let min = attributes.get("min").and_then(Value::as_i64).unwrap_or(1);
    let max = match attributes.get("max") {
        Some(Value::Integer(max)) => Some(usize::try_from(*max)?),
        _ => None,
    };
    section = section.repeat(Repeat::new(usize::try_from(min)?, max));

    if attributes.get("unique").and_then(Value::as_bool) == Some(true) {
        section = section.unique();
    }
    if attributes.get("allow_unknown").and_then(Value::as_bool) == Some(true) {
        section = section.allow_unknown();
    }

    blocks(section, raw)
}

fn key(raw: &RawSection) -> anyhow::Result<Container> {
    let attributes = attributes(raw, &key_attributes()?)?;
    let ty = key_type(&attributes).with_context(|| format!("{}: bad key type", raw.position))?;

    let text = |key: &str| -> Option<String> {
        attributes.get(key).and_then(Value::as_str).map(str::to_string)
    };
    let texts = |key: &str| -> Vec<String> {
        attributes
            .get(key)
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    };

    let mut meta = FieldMeta {
        default: None,
        optional: attributes.get("optional").and_then(Value::as_bool) == Some(true),
        cli: CliMeta {
            names: texts("arg"),
            help: text("help"),
            metavar: text("metavar"),
            invert_names: text("invert").into_iter().collect(),
            invert_help: text("invert_help"),
        },
    };

    let container = attributes
        .get("container")
        .and_then(Value::as_str)
        .unwrap_or("value");
    let size = attributes.get("size").and_then(Value::as_i64);
    let build = |meta: FieldMeta| -> anyhow::Result<Container> {
        Ok(match (container, size) {
            ("list", _) => ListField::new(ty.clone()).with_meta(meta).into(),
            ("array", Some(size)) => ArrayField::new(ty.clone(), usize::try_from(size)?)
                .with_meta(meta)
                .into(),
            ("array", None) => bail!("{}: arrays need a size", raw.position),
            _ => ValueField::new(ty.clone()).with_meta(meta).into(),
        })
    };

    // a default is checked like an assignment to the key it belongs to
    if let Some(default) = raw
        .assignments
        .iter()
        .rev()
        .find(|assignment| assignment.key == "default")
    {
        let schema = Schema::new(Section::new().key("default", build(meta.clone())?))?;
        let mut document = RawSection::root(raw.position.clone());
        document.assignments.push(default.clone());
        let validated = schema.validate(&document)?;
        meta.default = validated.get("default").cloned();
    }

    build(meta)
}

fn key_type(attributes: &ValidatedSection) -> anyhow::Result<Type> {
    let name = attributes
        .get("type")
        .and_then(Value::as_str)
        .context("missing type")?;
    let bound = |key: &str| attributes.get(key).and_then(Value::as_f64);

    Ok(match name {
        "integer" => Type::integer_range(
            bound("min").map(|min| min as i64),
            bound("max").map(|max| max as i64),
        ),
        "float" => Type::float_range(bound("min"), bound("max")),
        "regex" => {
            let pattern = attributes
                .get("pattern")
                .and_then(Value::as_str)
                .context("regex keys need a pattern")?;
            Type::regex(pattern)?
        }
        "choice" => {
            let choices = attributes
                .get("choices")
                .and_then(Value::as_list)
                .context("choice keys need choices")?;
            Type::one_of(
                choices
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|choice| (choice, choice)),
            )
        }
        other => simple_type(other).with_context(|| format!("unknown type {other:?}"))?,
    })
}

/// Types without parameters
fn simple_type(name: &str) -> Option<Type> {
    Some(match name {
        "string" => Type::String,
        "integer" => Type::integer(),
        "float" => Type::float(),
        "boolean" => Type::Boolean,
        "ip-address" => Type::ip_address(),
        "ip-network" => Type::ip_network(),
        "url" => Type::Url,
        "socket-address" => Type::socket_address(),
        "path" => Type::path(),
        "regex-pattern" => Type::regex_pattern(),
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use nestconf::raw_section;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
        key name { type = string }
        key port { type = integer; min = 1; max = 65535; default = 8080; arg = '--port' }
        key mode { type = choice; choices = fast, safe; default = safe }
        key tags { type = string; container = list; optional = yes }

        section server {
            args = string
            min = 0
            max = unbounded
            unique = yes

            key listen { type = socket-address }
        }
    "#;

    fn validate(text: &str) -> anyhow::Result<ValidatedSection> {
        let schema = from_raw(&raw_section!(SCHEMA))?;
        Ok(Document::from_text(text, "test.conf").validate(&schema)?)
    }

    #[test]
    fn builds_a_working_schema() {
        let config = validate("name = demo\nserver 'a' { listen = '127.0.0.1:80' }").unwrap();

        assert_eq!(config.get("port"), Some(&Value::Integer(8080)));
        assert_eq!(config.get("mode"), Some(&Value::from("safe")));
        assert_eq!(config.get("tags"), None);
        assert_eq!(config.subsections("server").len(), 1);

        let err = validate("name = demo\nport = 0").unwrap_err();
        assert!(err.to_string().contains("lower than the minimum"), "{err}");

        let err = validate(
            "name = demo\nserver 'a' { listen = 'localhost:80' }\nserver 'a' { listen = 'localhost:81' }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unique"), "{err}");
    }

    #[test]
    fn cli_metadata() {
        let schema = from_raw(&raw_section!(SCHEMA)).unwrap();
        let port = schema.root().get("port").and_then(Container::meta).unwrap();
        assert_eq!(port.cli.names, vec!["--port"]);
        assert_eq!(port.default, Some(Value::Integer(8080)));
    }

    #[test]
    fn bad_schemas() {
        let cases = [
            "name = 1",
            "key { type = string }",
            "key a { type = nonsense }",
            "key a { type = integer; default = abc }",
            "key a { type = regex }",
            "key a { type = string; container = array }",
            "section s { args = choice }",
            "table t {}",
        ];
        for case in cases {
            assert!(from_raw(&raw_section!(case)).is_err(), "{case}");
        }
    }
}
