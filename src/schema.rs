use thiserror::Error;

use crate::parser::fields::{FieldKind, FIELDS};
use crate::record::{Record, Value};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("field `{field}` expected {expected}, got {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("record has {found} fields, schema defines {expected}")]
    Arity { expected: usize, found: usize },
}

/// Check every non-null value against its field's declared kind. The
/// extractor only ever emits correctly typed values or null, so a failure
/// here means the record was built some other way.
pub fn validate(record: &Record) -> Result<(), SchemaError> {
    if record.len() != FIELDS.len() {
        return Err(SchemaError::Arity {
            expected: FIELDS.len(),
            found: record.len(),
        });
    }
    for (spec, value) in FIELDS.iter().zip(record.values()) {
        if value.is_null() || kind_matches(spec.kind, value) {
            continue;
        }
        return Err(SchemaError::TypeMismatch {
            field: spec.name,
            expected: spec.kind.name(),
            found: value.kind_name(),
        });
    }
    Ok(())
}

fn kind_matches(kind: FieldKind, value: &Value) -> bool {
    matches!(
        (kind, value),
        (FieldKind::Float, Value::Float(_))
            | (FieldKind::Int, Value::Int(_))
            | (FieldKind::Date, Value::Date(_))
            | (FieldKind::Text, Value::Text(_))
            | (FieldKind::TextList, Value::List(_))
            | (FieldKind::Url, Value::Url(_))
    )
}

// ── Tests ──
