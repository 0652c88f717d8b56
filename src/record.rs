use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::parser::fields::FIELDS;

/// A single normalized field value. Conversion failure is always `Null`,
/// never a passed-through raw string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Date(NaiveDate),
    Text(String),
    List(Vec<String>),
    Url(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::Date(_) => "date",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Url(_) => "url",
            Value::Null => "null",
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Date(d) => serializer.serialize_str(&d.to_string()),
            Value::Text(s) | Value::Url(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

/// One extracted offering: the fixed field set in schema order.
/// Immutable once produced by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn from_values(values: Vec<Value>) -> Record {
        debug_assert_eq!(values.len(), FIELDS.len());
        Record { values }
    }

    pub fn all_null() -> Record {
        Record {
            values: vec![Value::Null; FIELDS.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = FIELDS.iter().position(|f| f.name == name)?;
        self.values.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        FIELDS.iter().map(|f| f.name).zip(self.values.iter())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Text(s) | Value::Url(s) => Some(s),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn date_iso(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Date(d) => Some(d.to_string()),
            _ => None,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of one extraction run. `degraded` is the soft-failure channel
/// for documents with no usable tree; per-field absence stays per-field null.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: Record,
    pub degraded: bool,
}

// ── Tests ──
