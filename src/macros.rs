// Helpers called by code generated from `define_env!`.
// The macro itself lives in the typenv-macros crate.

use crate::{
    error::{EnvError, FieldError},
    record::TypedRecord,
    value::Value,
};
use std::str::FromStr;

fn field_error(key: &str, reason: FieldError) -> EnvError {
    EnvError::Schema {
        field: key.to_string(),
        reason,
    }
}

#[doc(hidden)]
pub fn take_string(record: &TypedRecord, key: &str) -> Result<String, EnvError> {
    take_optional_string(record, key)?.ok_or_else(|| field_error(key, FieldError::MustBeString))
}

#[doc(hidden)]
pub fn take_optional_string(record: &TypedRecord, key: &str) -> Result<Option<String>, EnvError> {
    match record.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(field_error(key, FieldError::MustBeString)),
    }
}

#[doc(hidden)]
pub fn take_bool(record: &TypedRecord, key: &str) -> Result<bool, EnvError> {
    record
        .bool(key)
        .ok_or_else(|| field_error(key, FieldError::MustBeBoolean))
}

/// Numbers are stored as `f64`; narrower types go through their text form so
/// `3000` fits a `u16` but `2.5` or `-1` do not.
#[doc(hidden)]
pub fn take_number<T: FromStr>(record: &TypedRecord, key: &str) -> Result<T, EnvError> {
    take_optional_number(record, key)?.ok_or_else(|| field_error(key, FieldError::MustBeNumber))
}

#[doc(hidden)]
pub fn take_optional_number<T: FromStr>(
    record: &TypedRecord,
    key: &str,
) -> Result<Option<T>, EnvError> {
    match record.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .to_string()
            .parse()
            .map(Some)
            .map_err(|_| field_error(key, FieldError::MustBeNumber)),
        Some(_) => Err(field_error(key, FieldError::MustBeNumber)),
    }
}
