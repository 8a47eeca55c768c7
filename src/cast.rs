use crate::value::{RawMapping, Value};

/// Replace every `"true"` / `"false"` string (any casing) with a native boolean
///
/// All other values are left untouched, so calling this twice is a no-op.
pub fn cast_booleans(mapping: &mut RawMapping) {
    for value in mapping.values_mut() {
        let cast = match value {
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        };
        if let Some(b) = cast {
            *value = Value::Bool(b);
        }
    }
}
