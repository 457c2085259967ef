//! raw (untyped) values as they appear in configuration text
//!
//! The parser produces these from token sequences. They keep their lexical type
//! (string, integer, float, boolean, list) until a schema says what they should be.
//!
//! Numbers accept a unit suffix directly after the digits, `42k` is `42000` and
//! `1Ki` is `1024`. See [UNITS].
use serde::{ser::SerializeSeq, Serializer};
use std::fmt;

/// Magnitude suffixes for numeric literals
///
/// The first letter is matched case-insensitively (`k` and `K` are the same unit),
/// the binary `i` is matched exactly.
pub const UNITS: &[(&str, u64)] = &[
    ("k", 1_000),
    ("M", 1_000_000),
    ("G", 1_000_000_000),
    ("T", 1_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("E", 1_000_000_000_000_000_000),
    ("Ki", 1 << 10),
    ("Mi", 1 << 20),
    ("Gi", 1 << 30),
    ("Ti", 1 << 40),
    ("Pi", 1 << 50),
    ("Ei", 1 << 60),
];

/// Bare words read as booleans (case-insensitive)
pub const BOOLEAN_WORDS: &[(&str, bool)] = &[
    ("yes", true),
    ("true", true),
    ("on", true),
    ("no", false),
    ("false", false),
    ("off", false),
];

/// Untyped value from the parse tree
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    /// a word of [BOOLEAN_WORDS], `word` keeps its spelling
    Boolean { value: bool, word: String },
    List(Vec<Literal>),
}

impl Literal {
    /// Human readable name of the lexical type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Boolean { .. } => "boolean",
            Literal::List(_) => "list",
        }
    }

    /// Text of strings and bare boolean words, as written
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            Literal::Boolean { word, .. } => Some(word),
            _ => None,
        }
    }

    /// A bare word: boolean when it is in [BOOLEAN_WORDS], a string otherwise
    pub fn word(word: &str) -> Literal {
        match lookup_boolean(word) {
            Some(value) => Literal::Boolean {
                value,
                word: word.to_string(),
            },
            None => Literal::String(word.to_string()),
        }
    }

    /// View a literal as a sequence: lists yield their items, scalars yield themselves
    pub fn items(&self) -> &[Literal] {
        match self {
            Literal::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }
}

pub fn lookup_unit(suffix: &str) -> Option<u64> {
    let mut chars = suffix.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    UNITS
        .iter()
        .find(|(name, _)| {
            let (name_first, name_rest) = name.split_at(1);
            name_first.eq_ignore_ascii_case(&first.to_string()) && name_rest == rest
        })
        .map(|(_, multiplier)| *multiplier)
}

pub fn lookup_boolean(word: &str) -> Option<bool> {
    BOOLEAN_WORDS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(word))
        .map(|(_, value)| *value)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NumberError {
    #[error("{0:?} is not a number")]
    Malformed(String),
    #[error("unknown unit suffix {unit:?} in {text:?}")]
    UnknownUnit { text: String, unit: String },
    #[error("{0:?} is out of range")]
    Overflow(String),
}

/// Parse numeric text (`-12`, `1.5`, `42k`, `4Gi`) into an integer or float literal
pub fn parse_number(text: &str) -> Result<Literal, NumberError> {
    let malformed = || NumberError::Malformed(text.to_string());

    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let int_len = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if int_len == 0 {
        return Err(malformed());
    }

    let mut number_len = int_len;
    let mut is_float = false;
    if let Some(fraction) = unsigned[int_len..].strip_prefix('.') {
        let fraction_len = fraction
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(fraction.len());
        if fraction_len == 0 {
            return Err(malformed());
        }
        number_len += 1 + fraction_len;
        is_float = true;
    }

    let sign_len = text.len() - unsigned.len();
    let (number, unit) = text.split_at(sign_len + number_len);

    let multiplier = match unit {
        "" => 1,
        unit => lookup_unit(unit).ok_or_else(|| {
            if unit.chars().all(|c| c.is_ascii_alphabetic()) {
                NumberError::UnknownUnit {
                    text: text.to_string(),
                    unit: unit.to_string(),
                }
            } else {
                malformed()
            }
        })?,
    };

    if is_float {
        let value: f64 = number.parse().map_err(|_| malformed())?;
        let value = value * multiplier as f64;
        if !value.is_finite() {
            return Err(NumberError::Overflow(text.to_string()));
        }
        return Ok(Literal::Float(value));
    }

    let value: i64 = number
        .parse()
        .map_err(|_| NumberError::Overflow(text.to_string()))?;
    i64::try_from(multiplier)
        .ok()
        .and_then(|multiplier| value.checked_mul(multiplier))
        .map(Literal::Integer)
        .ok_or_else(|| NumberError::Overflow(text.to_string()))
}

/// Quote a string so that the lexer reads it back unchanged
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\0' => quoted.push_str("\\0"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Format a float so that the lexer reads it back as a float
pub fn format_float(value: f64) -> String {
    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}

/// Renders the literal in configuration syntax
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => f.write_str(&quote(value)),
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::Float(value) => f.write_str(&format_float(*value)),
            Literal::Boolean { word, .. } => f.write_str(word),
            Literal::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::word(if value { "yes" } else { "no" })
    }
}

impl serde::ser::Serialize for Literal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Literal::String(value) => serializer.serialize_str(value),
            Literal::Integer(value) => serializer.serialize_i64(*value),
            Literal::Float(value) => serializer.serialize_f64(*value),
            Literal::Boolean { value, .. } => serializer.serialize_bool(*value),
            Literal::List(items) => {
                let mut ser = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    ser.serialize_element(item)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_numbers() {
        assert_eq!(parse_number("42"), Ok(Literal::Integer(42)));
        assert_eq!(parse_number("+42"), Ok(Literal::Integer(42)));
        assert_eq!(parse_number("-42"), Ok(Literal::Integer(-42)));
        assert_eq!(parse_number("42.5"), Ok(Literal::Float(42.5)));
        assert_eq!(parse_number("-0.25"), Ok(Literal::Float(-0.25)));
    }

    #[test]
    fn unit_suffix_multiplies_base() {
        for (unit, multiplier) in UNITS {
            let multiplier = *multiplier as i64;
            assert_eq!(
                parse_number(&format!("3{unit}")),
                Ok(Literal::Integer(3 * multiplier)),
                "unit {unit}"
            );
        }
        assert_eq!(parse_number("42k"), Ok(Literal::Integer(42_000)));
        assert_eq!(parse_number("42K"), Ok(Literal::Integer(42_000)));
        assert_eq!(parse_number("2m"), Ok(Literal::Integer(2_000_000)));
        assert_eq!(parse_number("1.5k"), Ok(Literal::Float(1500.0)));
        assert_eq!(parse_number("-4Ki"), Ok(Literal::Integer(-4096)));
    }

    #[test]
    fn number_errors() {
        assert_eq!(
            parse_number("abc"),
            Err(NumberError::Malformed("abc".to_string()))
        );
        assert_eq!(parse_number("1."), Err(NumberError::Malformed("1.".to_string())));
        assert!(matches!(
            parse_number("12kb"),
            Err(NumberError::UnknownUnit { unit, .. }) if unit == "kb"
        ));
        assert!(matches!(parse_number("10E"), Err(NumberError::Overflow(_))));
        assert!(matches!(
            parse_number("99999999999999999999"),
            Err(NumberError::Overflow(_))
        ));
    }

    #[test]
    fn boolean_vocabulary() {
        assert_eq!(lookup_boolean("YES"), Some(true));
        assert_eq!(lookup_boolean("Off"), Some(false));
        assert_eq!(lookup_boolean("1"), None);
        assert_eq!(lookup_boolean("maybe"), None);
    }

    #[test]
    fn boolean_words_keep_their_spelling() {
        let on = Literal::word("On");
        assert!(matches!(on, Literal::Boolean { value: true, .. }));
        assert_eq!(on.as_str(), Some("On"));
        assert_eq!(on.to_string(), "On");
        assert_eq!(Literal::word("auto"), Literal::from("auto"));
    }

    #[test]
    fn display_is_config_syntax() {
        assert_eq!(Literal::from("it's\n").to_string(), r"'it\'s\n'");
        assert_eq!(Literal::Float(3.0).to_string(), "3.0");
        assert_eq!(
            Literal::List(vec![Literal::Integer(1), Literal::from(false)]).to_string(),
            "1, no"
        );
        assert_eq!(Literal::List(vec![Literal::Integer(1)]).to_string(), "1,");
    }
}
