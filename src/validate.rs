use crate::{
    error::{EnvError, FieldError},
    field::{FieldKind, FieldRule},
    record::TypedRecord,
    schema::Schema,
    value::{RawMapping, Value},
};

/// Cast every schema field from `mapping` into a [`TypedRecord`]
///
/// Stops at the first field that fails, in schema order. Keys in `mapping` that
/// the schema does not declare are ignored.
pub fn validate(mapping: &RawMapping, schema: &Schema) -> Result<TypedRecord, EnvError> {
    let mut record = TypedRecord::new();
    for (name, rule) in schema {
        let value = validate_field(mapping.get(name), rule).map_err(|reason| EnvError::Schema {
            field: name.to_string(),
            reason,
        })?;
        record.push(name, value);
    }
    Ok(record)
}

/// Validate a single raw value against its rule
///
/// An absent or empty string value is replaced by the rule's default first.
pub fn validate_field(raw: Option<&Value>, rule: &FieldRule) -> Result<Option<Value>, FieldError> {
    let value = match raw {
        None => rule.default.clone(),
        Some(Value::String(s)) if s.is_empty() => rule.default.clone(),
        Some(v) => Some(v.clone()),
    };

    match &rule.kind {
        FieldKind::Enum(allowed) => one_of(value.as_ref(), allowed).map(Some),
        FieldKind::Number => number(value.as_ref()).map(Some),
        FieldKind::Boolean => boolean(value.as_ref()).map(Some),
        FieldKind::String => string(value.as_ref()).map(Some),
        FieldKind::OptionalString => value.as_ref().map(|v| string(Some(v))).transpose(),
        FieldKind::OptionalNumber => value.as_ref().map(|v| number(Some(v))).transpose(),
        FieldKind::OptionalEnum(allowed) => {
            value.as_ref().map(|v| one_of(Some(v), allowed)).transpose()
        }
    }
}

fn one_of(value: Option<&Value>, allowed: &[String]) -> Result<Value, FieldError> {
    match value {
        Some(v) => {
            let text = v.to_string();
            if allowed.iter().any(|a| *a == text) {
                Ok(Value::String(text))
            } else {
                Err(FieldError::MustBeOneOf(allowed.to_vec()))
            }
        }
        None => Err(FieldError::MustBeOneOf(allowed.to_vec())),
    }
}

fn number(value: Option<&Value>) -> Result<Value, FieldError> {
    match value {
        Some(Value::Number(n)) if n.is_finite() => Ok(Value::Number(*n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or(FieldError::MustBeNumber),
        _ => Err(FieldError::MustBeNumber),
    }
}

fn boolean(value: Option<&Value>) -> Result<Value, FieldError> {
    match value {
        Some(Value::Bool(b)) => Ok(Value::Bool(*b)),
        Some(Value::String(s)) => Ok(Value::Bool(s.eq_ignore_ascii_case("true") || s == "1")),
        Some(Value::Number(n)) if *n == 1.0 => Ok(Value::Bool(true)),
        _ => Err(FieldError::MustBeBoolean),
    }
}

fn string(value: Option<&Value>) -> Result<Value, FieldError> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(FieldError::MustNotBeEmpty)
            } else {
                Ok(Value::String(trimmed.to_string()))
            }
        }
        _ => Err(FieldError::MustBeString),
    }
}
