// Runtime value system for attesta
// Subjects, matcher arguments, and hook state all travel as `Value`s.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use chrono::DateTime;
use itertools::Itertools;

use crate::error::TestResult;
use crate::mock::MockFn;

/// A dynamic value as seen by matchers and the deep-equality evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A textual instant; only meaningful when it parses as RFC 3339.
    Timestamp(String),
    Vector(Vec<Value>),
    Map(HashMap<String, Value>),
    Function(Function),
    Mock(MockFn),
}

impl Value {
    /// Truthiness of a value: `Nil`, `false`, `0`, `0.0`, `NaN` and the
    /// empty string are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Mock(_) => "mock",
        }
    }

    /// Epoch milliseconds of a `Timestamp`, `None` when the text does not
    /// parse as RFC 3339 or the value is not a timestamp at all.
    pub fn instant(&self) -> Option<i64> {
        match self {
            Value::Timestamp(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.timestamp_millis()),
            _ => None,
        }
    }

    /// Whether the value can be invoked (functions and mocks).
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Mock(_))
    }

    /// Name used to identify a callable subject in failure messages.
    pub fn callable_name(&self) -> Option<&str> {
        match self {
            Value::Function(func) => Some(&func.name),
            Value::Mock(mock) => Some(mock.name()),
            _ => None,
        }
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Vector(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    pub fn timestamp(text: impl Into<String>) -> Value {
        Value::Timestamp(text.into())
    }

    /// JSON rendering used by failure messages. Callables and unparseable
    /// content degrade to their display form rather than erroring.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(t) => serde_json::Value::String(t.clone()),
            Value::Vector(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Function(_) | Value::Mock(_) => serde_json::Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Timestamp(t) => write!(f, "#timestamp(\"{}\")", t),
            Value::Vector(items) => {
                write!(f, "[{}]", items.iter().map(|item| item.to_string()).join(" "))
            }
            Value::Map(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| format!("{} {}", k, v))
                    .sorted()
                    .join(", ");
                write!(f, "{{{}}}", entries)
            }
            Value::Function(func) => write!(f, "#<function {}>", func.name),
            Value::Mock(mock) => write!(f, "#<mock {}>", mock.name()),
        }
    }
}

/// A named callable value. Compared by pointer identity, never by body.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub func: Rc<dyn Fn(Vec<Value>) -> TestResult<Value>>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(Vec<Value>) -> TestResult<Value> + 'static,
    ) -> Function {
        Function {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn call(&self, args: Vec<Value>) -> TestResult<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Vector(items)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<MockFn> for Value {
    fn from(mock: MockFn) -> Self {
        Value::Mock(mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_value_content() {
        assert!(Value::from(1).is_truthy());
        assert!(Value::from("hello").is_truthy());
        assert!(Value::vector(vec![Value::from(1)]).is_truthy());
        assert!(Value::map([("hello", Value::from("World"))]).is_truthy());

        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(f64::NAN).is_truthy());
    }

    #[test]
    fn instants_parse_rfc3339_only() {
        let valid = Value::timestamp("2000-02-01T00:00:00Z");
        let invalid = Value::timestamp("not a date");
        assert_eq!(valid.instant(), Some(949_363_200_000));
        assert_eq!(invalid.instant(), None);
        assert_eq!(Value::from(3).instant(), None);
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Function::new("noop", |_| Ok(Value::Nil));
        let g = Function::new("noop", |_| Ok(Value::Nil));
        assert_eq!(Value::Function(f.clone()), Value::Function(f.clone()));
        assert_ne!(Value::Function(f), Value::Function(g));
    }

    #[test]
    fn display_renders_collections() {
        let v = Value::vector(vec![Value::from(1), Value::from(2)]);
        assert_eq!(v.to_string(), "[1 2]");
        let m = Value::map([("hello", Value::from("World"))]);
        assert_eq!(m.to_string(), "{hello \"World\"}");
    }
}
