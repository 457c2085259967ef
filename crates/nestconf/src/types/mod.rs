//! scalar types used by schema containers
//!
//! A [Type] turns one raw [Literal] into a typed [Value] or fails with a [TypeError].
//! Types are plain data (plus compiled regexes) and are never mutated after construction.
mod net;

#[cfg(feature = "eval")]
mod eval;

pub use net::{Host, IpNetwork, IpVersion, SocketAddress};

use crate::error::SchemaError;
use crate::literal::{lookup_boolean, parse_number, Literal, NumberError};
use crate::value::Value;
use indexmap::IndexMap;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Type {
    /// string literal as-is
    String,
    /// string that must fully match a pattern
    Regex(Pattern),
    /// like [Type::Regex], yields a map of the named capture groups
    NamedRegex(Pattern),
    /// the string is itself a regular expression
    RegexPattern { case_insensitive: bool },
    /// integral number, optionally bounded (inclusive)
    Integer { min: Option<i64>, max: Option<i64> },
    /// any number, optionally bounded (inclusive)
    Float { min: Option<f64>, max: Option<f64> },
    Boolean,
    IpAddress { version: Option<IpVersion> },
    IpNetwork { version: Option<IpVersion> },
    Url,
    IpSocketAddress {
        default_host: Option<Host>,
        default_port: Option<u16>,
    },
    Path { must_exist: bool },
    /// one word out of a fixed set, each mapped to a value
    OneOf(IndexMap<String, Value>),
    /// a string evaluated as an expression without any variables or functions in scope
    #[cfg(feature = "eval")]
    Eval,
}

/// A compiled pattern for [Type::Regex] and [Type::NamedRegex]
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: regex::Regex,
    message: Option<String>,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, SchemaError> {
        let anchored =
            regex::Regex::new(&format!("^(?:{source})$")).map_err(|err| SchemaError::Regex {
                pattern: source.to_string(),
                source: err,
            })?;

        Ok(Self {
            source: source.to_string(),
            anchored,
            message: None,
        })
    }

    /// Error message used instead of the default one when a value does not match
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn no_match(&self, value: &str) -> TypeError {
        TypeError::NoMatch {
            value: value.to_string(),
            message: self
                .message
                .clone()
                .unwrap_or_else(|| format!("value doesn't match /{}/", self.source)),
        }
    }
}

impl Type {
    pub fn integer() -> Self {
        Type::Integer {
            min: None,
            max: None,
        }
    }

    pub fn integer_range(min: Option<i64>, max: Option<i64>) -> Self {
        Type::Integer { min, max }
    }

    pub fn float() -> Self {
        Type::Float {
            min: None,
            max: None,
        }
    }

    pub fn float_range(min: Option<f64>, max: Option<f64>) -> Self {
        Type::Float { min, max }
    }

    pub fn regex(pattern: &str) -> Result<Self, SchemaError> {
        Pattern::new(pattern).map(Type::Regex)
    }

    pub fn named_regex(pattern: &str) -> Result<Self, SchemaError> {
        Pattern::new(pattern).map(Type::NamedRegex)
    }

    pub fn regex_pattern() -> Self {
        Type::RegexPattern {
            case_insensitive: false,
        }
    }

    pub fn ip_address() -> Self {
        Type::IpAddress { version: None }
    }

    pub fn ip_network() -> Self {
        Type::IpNetwork { version: None }
    }

    pub fn socket_address() -> Self {
        Type::IpSocketAddress {
            default_host: None,
            default_port: None,
        }
    }

    pub fn path() -> Self {
        Type::Path { must_exist: false }
    }

    pub fn one_of<K: Into<String>, V: Into<Value>>(choices: impl IntoIterator<Item = (K, V)>) -> Self {
        Type::OneOf(
            choices
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Whether a command line front-end should expose this type as a flag without value
    pub fn is_flag(&self) -> bool {
        matches!(self, Type::Boolean)
    }

    /// What this type accepts, for error messages
    pub fn expected(&self) -> &'static str {
        match self {
            Type::String | Type::Regex(_) | Type::NamedRegex(_) => "a string",
            Type::RegexPattern { .. } => "a regular expression",
            Type::Integer { .. } => "an integer",
            Type::Float { .. } => "a number",
            Type::Boolean => "a boolean",
            Type::IpAddress { .. } => "an ip address",
            Type::IpNetwork { .. } => "an ip network",
            Type::Url => "an url",
            Type::IpSocketAddress { .. } => "a socket address",
            Type::Path { .. } => "a path",
            Type::OneOf(_) => "a choice",
            #[cfg(feature = "eval")]
            Type::Eval => "an expression",
        }
    }

    pub fn validate(&self, raw: &Literal) -> Result<Value, TypeError> {
        match self {
            Type::String => self.string(raw).map(Value::from),
            Type::Regex(pattern) => {
                let value = self.string(raw)?;
                if !pattern.anchored.is_match(value) {
                    return Err(pattern.no_match(value));
                }
                Ok(Value::from(value))
            }
            Type::NamedRegex(pattern) => {
                let value = self.string(raw)?;
                let captures = pattern
                    .anchored
                    .captures(value)
                    .ok_or_else(|| pattern.no_match(value))?;
                let groups = pattern
                    .anchored
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        captures
                            .name(name)
                            .map(|group| (name.to_string(), Value::from(group.as_str())))
                    })
                    .collect();
                Ok(Value::Map(groups))
            }
            Type::RegexPattern { case_insensitive } => {
                let value = self.string(raw)?;
                regex::RegexBuilder::new(value)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map(Value::Regex)
                    .map_err(|err| TypeError::BadPattern(err.to_string()))
            }
            Type::Integer { min, max } => {
                let value = match number(raw)? {
                    Literal::Integer(value) => value,
                    Literal::Float(value)
                        if value.fract() == 0.0
                            && value >= i64::MIN as f64
                            && value < i64::MAX as f64 =>
                    {
                        value as i64
                    }
                    other => return Err(TypeError::NotAnInteger(other.to_string())),
                };
                check_bounds(value, *min, *max)?;
                Ok(Value::Integer(value))
            }
            Type::Float { min, max } => {
                let value = match number(raw)? {
                    Literal::Integer(value) => value as f64,
                    Literal::Float(value) => value,
                    other => return Err(TypeError::NotAnInteger(other.to_string())),
                };
                check_bounds(value, *min, *max)?;
                Ok(Value::Float(value))
            }
            Type::Boolean => {
                let value = match raw {
                    Literal::Boolean { value, .. } => Some(*value),
                    Literal::Integer(1) => Some(true),
                    Literal::Integer(0) => Some(false),
                    Literal::String(word) => match word.as_str() {
                        "1" => Some(true),
                        "0" => Some(false),
                        word => lookup_boolean(word),
                    },
                    _ => None,
                };
                value
                    .map(Value::Boolean)
                    .ok_or_else(|| TypeError::NotABoolean(raw.to_string()))
            }
            Type::IpAddress { version } => {
                let value = self.string(raw)?;
                let addr: IpAddr = value.parse().map_err(|err| TypeError::Address {
                    value: value.to_string(),
                    reason: format!("{err}"),
                })?;
                check_version(value, IpVersion::of(&addr), *version)?;
                Ok(Value::Ip(addr))
            }
            Type::IpNetwork { version } => {
                let value = self.string(raw)?;
                let network: IpNetwork = value.parse().map_err(|reason| TypeError::Network {
                    value: value.to_string(),
                    reason,
                })?;
                check_version(value, network.version(), *version)?;
                Ok(Value::Network(network))
            }
            Type::Url => {
                let value = self.string(raw)?;
                url::Url::parse(value)
                    .map(Value::Url)
                    .map_err(|err| TypeError::Url {
                        value: value.to_string(),
                        reason: err.to_string(),
                    })
            }
            Type::IpSocketAddress {
                default_host,
                default_port,
            } => {
                let value = self.string(raw)?;
                SocketAddress::parse(value, default_host.as_ref(), *default_port)
                    .map(Value::Socket)
                    .map_err(|reason| TypeError::SocketAddress {
                        value: value.to_string(),
                        reason,
                    })
            }
            Type::Path { must_exist } => {
                let path = PathBuf::from(self.string(raw)?);
                if *must_exist && !path.exists() {
                    return Err(TypeError::MissingPath(path.display().to_string()));
                }
                Ok(Value::Path(path))
            }
            Type::OneOf(choices) => {
                // bare words are looked up as written, `on` is not `yes`
                let key = match raw {
                    Literal::List(_) => return Err(self.mismatch(raw)),
                    other => other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                };
                choices.get(&key).cloned().ok_or_else(|| TypeError::BadChoice {
                    value: raw.to_string(),
                    choices: choices
                        .keys()
                        .map(|choice| format!("{choice:?}"))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
            #[cfg(feature = "eval")]
            Type::Eval => eval::evaluate(self.string(raw)?),
        }
    }

    fn string<'r>(&self, raw: &'r Literal) -> Result<&'r str, TypeError> {
        raw.as_str().ok_or_else(|| self.mismatch(raw))
    }

    fn mismatch(&self, raw: &Literal) -> TypeError {
        TypeError::Mismatch {
            expected: self.expected(),
            found: format!("{} {raw}", raw.type_name()),
        }
    }
}

/// Numbers as they are, numeric strings (with units) parsed
fn number(raw: &Literal) -> Result<Literal, TypeError> {
    match raw {
        Literal::Integer(_) | Literal::Float(_) => Ok(raw.clone()),
        Literal::String(text) => Ok(parse_number(text.trim())?),
        other => Err(TypeError::Mismatch {
            expected: "a number",
            found: format!("{} {other}", other.type_name()),
        }),
    }
}

fn check_bounds<T>(value: T, min: Option<T>, max: Option<T>) -> Result<(), TypeError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = min.filter(|min| value < *min) {
        return Err(TypeError::BelowMinimum {
            value: value.to_string(),
            min: min.to_string(),
        });
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(TypeError::AboveMaximum {
            value: value.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

fn check_version(
    value: &str,
    found: IpVersion,
    expected: Option<IpVersion>,
) -> Result<(), TypeError> {
    match expected {
        Some(expected) if expected != found => Err(TypeError::Address {
            value: value.to_string(),
            reason: format!("not an {expected} address"),
        }),
        _ => Ok(()),
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },
    #[error(transparent)]
    Number(#[from] NumberError),
    #[error("{0} is not an integer value")]
    NotAnInteger(String),
    #[error("{value} is lower than the minimum ({min})")]
    BelowMinimum { value: String, min: String },
    #[error("{value} is greater than the maximum ({max})")]
    AboveMaximum { value: String, max: String },
    #[error("{0} is not a boolean value")]
    NotABoolean(String),
    #[error("{value:?}: {message}")]
    NoMatch { value: String, message: String },
    #[error("bad format for regular expression: {0}")]
    BadPattern(String),
    #[error("{value:?} is not a valid ip address: {reason}")]
    Address { value: String, reason: String },
    #[error("{value:?} is not a valid ip network: {reason}")]
    Network { value: String, reason: String },
    #[error("{value:?} is not a valid url: {reason}")]
    Url { value: String, reason: String },
    #[error("{value:?} is not a valid socket address: {reason}")]
    SocketAddress { value: String, reason: String },
    #[error("path {0:?} does not exist")]
    MissingPath(String),
    #[error("bad choice {value} (must be one of {choices})")]
    BadChoice { value: String, choices: String },
    #[error("bad expression: {0}")]
    Eval(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ok(ty: &Type, raw: impl Into<Literal>) -> Value {
        ty.validate(&raw.into()).expect("must validate")
    }

    fn err(ty: &Type, raw: impl Into<Literal>) -> TypeError {
        ty.validate(&raw.into()).expect_err("must fail")
    }

    #[test]
    fn strings() {
        assert_eq!(ok(&Type::String, "hello"), Value::from("hello"));
        assert_eq!(ok(&Type::String, Literal::word("off")), Value::from("off"));
        assert!(matches!(
            err(&Type::String, 42_i64),
            TypeError::Mismatch { expected: "a string", .. }
        ));
    }

    #[test]
    fn regexes() {
        let ty = Type::regex("[a-z]+").unwrap();
        assert_eq!(ok(&ty, "abc"), Value::from("abc"));
        // the whole value has to match
        assert!(matches!(err(&ty, "abc1"), TypeError::NoMatch { .. }));

        let ty = Type::NamedRegex(
            Pattern::new(r"(?P<user>\w+)@(?P<host>[\w.]+)")
                .unwrap()
                .with_message("not an email"),
        );
        let Value::Map(groups) = ok(&ty, "root@example.org") else {
            panic!("named regex must yield a map");
        };
        assert_eq!(groups.get("user"), Some(&Value::from("root")));
        assert_eq!(groups.get("host"), Some(&Value::from("example.org")));
        assert_eq!(err(&ty, "nope").to_string(), "\"nope\": not an email");

        assert!(matches!(Type::regex("(unclosed"), Err(SchemaError::Regex { .. })));
    }

    #[test]
    fn regex_patterns() {
        let ty = Type::RegexPattern {
            case_insensitive: true,
        };
        let Value::Regex(regex) = ok(&ty, r"/[a-z]+\.css") else {
            panic!("must yield a regex");
        };
        assert!(regex.is_match("/MAIN.css"));
        assert!(matches!(err(&ty, "[z-a]"), TypeError::BadPattern(_)));
    }

    #[test]
    fn integers() {
        let ty = Type::integer();
        assert_eq!(ok(&ty, 42_i64), Value::Integer(42));
        assert_eq!(ok(&ty, Literal::Float(42.0)), Value::Integer(42));
        assert_eq!(ok(&ty, "42k"), Value::Integer(42_000));
        assert!(matches!(err(&ty, Literal::Float(4.2)), TypeError::NotAnInteger(_)));
        assert_eq!(err(&ty, "abc").to_string(), "\"abc\" is not a number");
        assert!(matches!(err(&ty, true), TypeError::Mismatch { .. }));

        let ty = Type::integer_range(Some(1), Some(10));
        assert_eq!(ok(&ty, 10_i64), Value::Integer(10));
        assert_eq!(
            err(&ty, 0_i64).to_string(),
            "0 is lower than the minimum (1)"
        );
        assert_eq!(
            err(&ty, 11_i64).to_string(),
            "11 is greater than the maximum (10)"
        );
    }

    #[test]
    fn floats() {
        let ty = Type::float_range(Some(0.0), Some(1.0));
        assert_eq!(ok(&ty, 1_i64), Value::Float(1.0));
        assert_eq!(ok(&ty, Literal::Float(0.5)), Value::Float(0.5));
        assert!(matches!(err(&ty, Literal::Float(1.5)), TypeError::AboveMaximum { .. }));
        assert_eq!(ok(&Type::float(), "1.5k"), Value::Float(1500.0));
    }

    #[test]
    fn booleans() {
        let ty = Type::Boolean;
        assert_eq!(ok(&ty, true), Value::Boolean(true));
        assert_eq!(ok(&ty, 0_i64), Value::Boolean(false));
        assert_eq!(ok(&ty, "On"), Value::Boolean(true));
        assert_eq!(ok(&ty, "1"), Value::Boolean(true));
        assert!(matches!(err(&ty, 2_i64), TypeError::NotABoolean(_)));
        assert!(matches!(err(&ty, "maybe"), TypeError::NotABoolean(_)));
        assert!(ty.is_flag());
    }

    #[test]
    fn addresses() {
        let ty = Type::ip_address();
        assert_eq!(ok(&ty, "::1"), Value::Ip("::1".parse().unwrap()));
        assert!(matches!(err(&ty, "300.0.0.1"), TypeError::Address { .. }));

        let ty = Type::IpAddress {
            version: Some(IpVersion::V4),
        };
        assert_eq!(
            err(&ty, "::1").to_string(),
            "\"::1\" is not a valid ip address: not an IPv4 address"
        );

        let ty = Type::ip_network();
        assert_eq!(
            ok(&ty, "10.0.0.0/8"),
            Value::Network("10.0.0.0/8".parse().unwrap())
        );
        assert!(matches!(err(&ty, "10.0.0.0/40"), TypeError::Network { .. }));
    }

    #[test]
    fn urls_and_sockets() {
        let Value::Url(url) = ok(&Type::Url, "http://proxy:3128/path") else {
            panic!("must yield an url");
        };
        assert_eq!(url.port(), Some(3128));
        assert!(matches!(err(&Type::Url, "not a url"), TypeError::Url { .. }));

        let ty = Type::IpSocketAddress {
            default_host: Some(Host::Ip("127.0.0.1".parse().unwrap())),
            default_port: None,
        };
        let Value::Socket(address) = ok(&ty, ":80") else {
            panic!("must yield a socket address");
        };
        assert_eq!(address.to_string(), "127.0.0.1:80");
        assert!(matches!(err(&ty, "host:99999"), TypeError::SocketAddress { .. }));
    }

    #[test]
    fn paths() {
        assert_eq!(ok(&Type::path(), "/does/not/matter"), Value::Path("/does/not/matter".into()));

        let dir = tempfile::tempdir().unwrap();
        let ty = Type::Path { must_exist: true };
        assert!(matches!(ok(&ty, dir.path().to_str().unwrap()), Value::Path(_)));
        assert!(matches!(
            err(&ty, dir.path().join("missing").to_str().unwrap()),
            TypeError::MissingPath(_)
        ));
    }

    #[test]
    fn one_of() {
        let ty = Type::one_of([("fast", 1_i64), ("slow", 2_i64)]);
        assert_eq!(ok(&ty, "slow"), Value::Integer(2));
        assert_eq!(
            err(&ty, "medium").to_string(),
            "bad choice 'medium' (must be one of \"fast\", \"slow\")"
        );
    }

    #[test]
    fn one_of_boolean_words() {
        let ty = Type::one_of([("on", 1_i64), ("off", 0_i64), ("auto", -1_i64)]);
        assert_eq!(ok(&ty, Literal::word("on")), Value::Integer(1));
        assert_eq!(ok(&ty, Literal::word("off")), Value::Integer(0));
        assert_eq!(ok(&ty, Literal::word("auto")), Value::Integer(-1));

        let ty = Type::one_of([("yes", 1_i64)]);
        assert!(matches!(
            err(&ty, Literal::word("on")),
            TypeError::BadChoice { .. }
        ));
    }
}
