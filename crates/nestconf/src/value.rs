//! value representation
//!
//! The validated output model contains the following data types
//! - boolean (true/false)
//! - integer (signed, i64)
//! - float (f64)
//! - string (utf-8)
//! - path, regex, ip address, ip network, url and socket address as produced by their [crate::Type]
//! - list (of values)
//! - map (order-preserving "dictionary", where the key is of type string)
//!
//! Additionally:
//! - there is no `null`/`None` value.
//! - serialization flattens the rich types to strings, so json/yaml output only ever has the
//!   plain data types.
use crate::literal::Literal;
use crate::types::{IpNetwork, SocketAddress};
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};
use std::net::IpAddr;
use std::path::PathBuf;

/// All possible value types
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Path(PathBuf),
    Regex(regex::Regex),
    Ip(IpAddr),
    Network(IpNetwork),
    Url(url::Url),
    Socket(SocketAddress),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Floats, and integers as floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Literal that validates back to this value, `None` for maps (they have no literal syntax)
    pub fn to_literal(&self) -> Option<Literal> {
        Some(match self {
            Value::Boolean(value) => Literal::from(*value),
            Value::Integer(value) => Literal::Integer(*value),
            Value::Float(value) => Literal::Float(*value),
            Value::String(value) => Literal::String(value.clone()),
            Value::Path(path) => Literal::String(path.display().to_string()),
            Value::Regex(regex) => Literal::String(regex.as_str().to_string()),
            Value::Ip(addr) => Literal::String(addr.to_string()),
            Value::Network(network) => Literal::String(network.to_string()),
            Value::Url(url) => Literal::String(url.to_string()),
            Value::Socket(address) => Literal::String(address.to_string()),
            Value::List(items) => {
                Literal::List(items.iter().map(Value::to_literal).collect::<Option<_>>()?)
            }
            Value::Map(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Ip(a), Value::Ip(b)) => a == b,
            (Value::Network(a), Value::Network(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::Socket(a), Value::Socket(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&Literal> for Value {
    fn from(value: &Literal) -> Self {
        match value {
            Literal::String(value) => Value::String(value.clone()),
            Literal::Integer(value) => Value::Integer(*value),
            Literal::Float(value) => Value::Float(*value),
            Literal::Boolean { value, .. } => Value::Boolean(*value),
            Literal::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        Value::from(&value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(feature = "eval")]
impl TryFrom<hcl::Value> for Value {
    type Error = String;

    fn try_from(value: hcl::Value) -> Result<Self, Self::Error> {
        match value {
            hcl::Value::Bool(b) => Ok(b.into()),
            hcl::Value::Number(n) => match n.as_i64() {
                Some(int) => Ok(Value::Integer(int)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("number {n} is out of range")),
            },
            hcl::Value::String(s) => Ok(s.into()),
            hcl::Value::Array(a) => a
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            hcl::Value::Object(o) => o
                .into_iter()
                .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Value::Map),
            hcl::Value::Null => Err("expression evaluates to null".to_string()),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Path(value) => serializer.serialize_str(&value.to_string_lossy()),
            Value::Regex(value) => serializer.serialize_str(value.as_str()),
            Value::Ip(value) => serializer.collect_str(value),
            Value::Network(value) => serializer.collect_str(value),
            Value::Url(value) => serializer.serialize_str(value.as_str()),
            Value::Socket(value) => serializer.collect_str(value),
            Value::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Map(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}
