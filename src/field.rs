use crate::{error::FieldError, value::Value};
use std::{fmt, str::FromStr};

/// The type a schema field is cast to
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// Exactly one of the listed values
    Enum(Vec<String>),
    OptionalString,
    OptionalNumber,
    OptionalEnum(Vec<String>),
}

impl FieldKind {
    /// Optional kinds are never reported as missing
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            Self::OptionalString | Self::OptionalNumber | Self::OptionalEnum(_)
        )
    }

    /// Allowed values for enum kinds
    pub fn allowed_values(&self) -> Option<&[String]> {
        match self {
            Self::Enum(values) | Self::OptionalEnum(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Enum(values) => write!(f, "one of {}", values.join("|")),
            Self::OptionalString => write!(f, "optional string"),
            Self::OptionalNumber => write!(f, "optional number"),
            Self::OptionalEnum(values) => write!(f, "optional one of {}", values.join("|")),
        }
    }
}

/// Decode a serialized rule: a kind name, or a JSON list of allowed values
impl FromStr for FieldKind {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "optionalString" => Ok(Self::OptionalString),
            "optionalNumber" => Ok(Self::OptionalNumber),
            other => parse_literal_list(other)
                .map(Self::Enum)
                .ok_or_else(|| FieldError::InvalidSchemaRule(s.to_string())),
        }
    }
}

/// Decode a JSON list of allowed values. Non-string elements keep their JSON text.
fn parse_literal_list(s: &str) -> Option<Vec<String>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(s).ok()?;
    if values.is_empty() {
        return None;
    }
    Some(values.into_iter().map(literal_text).collect())
}

pub(crate) fn literal_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// How one schema field is loaded
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldRule {
    pub kind: FieldKind,
    /// Used when the key is absent or empty; a field with a default is never missing
    pub default: Option<Value>,
    /// Human-readable description, used for documentation output
    pub description: Option<String>,
}

impl FieldRule {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether an absent key must be reported missing
    pub fn is_required(&self) -> bool {
        !self.kind.is_optional() && self.default.is_none()
    }
}

fn rule<D: Into<Value>>(kind: FieldKind, default: Option<D>) -> FieldRule {
    FieldRule {
        kind,
        default: default.map(Into::into),
        description: None,
    }
}

fn literals<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

/// Fields that must be present unless a default is given
///
/// ```rust
/// use typenv::field;
///
/// let port = field::required::number(3000.0);
/// let domain = field::required::string(None);
/// let mode = field::required::one_of(["dev", "prod"], "dev");
/// assert!(!port.is_required());
/// assert!(domain.is_required());
/// assert!(!mode.is_required());
/// ```
pub mod required {
    use super::{literals, rule, FieldKind, FieldRule};

    pub fn string<'a>(default: impl Into<Option<&'a str>>) -> FieldRule {
        rule(FieldKind::String, default.into())
    }

    pub fn number(default: impl Into<Option<f64>>) -> FieldRule {
        rule(FieldKind::Number, default.into())
    }

    pub fn boolean(default: impl Into<Option<bool>>) -> FieldRule {
        rule(FieldKind::Boolean, default.into())
    }

    pub fn one_of<'a, I, S>(values: I, default: impl Into<Option<&'a str>>) -> FieldRule
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        rule(FieldKind::Enum(literals(values)), default.into())
    }
}

/// Fields that may be absent
pub mod optional {
    use super::{literals, rule, FieldKind, FieldRule};

    pub fn string<'a>(default: impl Into<Option<&'a str>>) -> FieldRule {
        rule(FieldKind::OptionalString, default.into())
    }

    pub fn number(default: impl Into<Option<f64>>) -> FieldRule {
        rule(FieldKind::OptionalNumber, default.into())
    }

    pub fn one_of<'a, I, S>(values: I, default: impl Into<Option<&'a str>>) -> FieldRule
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        rule(FieldKind::OptionalEnum(literals(values)), default.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_without_default() {
        let field = required::string(None);

        assert_eq!(field.kind, FieldKind::String);
        assert_eq!(field.default, None);
        assert!(field.is_required());
    }

    #[test]
    fn test_default_is_never_required() {
        let field = required::number(3000.0);

        assert_eq!(field.default, Some(Value::Number(3000.0)));
        assert!(!field.is_required());
    }

    #[test]
    fn test_optional_kinds() {
        assert!(!optional::string(None).is_required());
        assert!(!optional::number(None).is_required());
        assert!(optional::one_of(["a"], None).kind.is_optional());
        assert!(!required::boolean(None).kind.is_optional());
    }

    #[test]
    fn test_one_of_keeps_order() {
        let field = required::one_of(["prod", "dev", "test"], "dev");

        assert_eq!(
            field.kind.allowed_values(),
            Some(&["prod".to_string(), "dev".to_string(), "test".to_string()][..])
        );
        assert_eq!(field.default, Some(Value::from("dev")));
    }

    #[test]
    fn test_with_description() {
        let field = FieldRule::new(FieldKind::Boolean)
            .with_default(false)
            .with_description("Connect to the upstream API");

        assert_eq!(field.description.as_deref(), Some("Connect to the upstream API"));
        assert_eq!(field.default, Some(Value::Bool(false)));
    }

    #[test]
    fn test_parse_kind_names() {
        assert_eq!("string".parse::<FieldKind>(), Ok(FieldKind::String));
        assert_eq!("number".parse::<FieldKind>(), Ok(FieldKind::Number));
        assert_eq!("boolean".parse::<FieldKind>(), Ok(FieldKind::Boolean));
        assert_eq!("optionalString".parse::<FieldKind>(), Ok(FieldKind::OptionalString));
        assert_eq!("optionalNumber".parse::<FieldKind>(), Ok(FieldKind::OptionalNumber));
    }

    #[test]
    fn test_parse_serialized_enum() {
        assert_eq!(
            r#"["a", "b"]"#.parse::<FieldKind>(),
            Ok(FieldKind::Enum(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            "[1, 2]".parse::<FieldKind>(),
            Ok(FieldKind::Enum(vec!["1".to_string(), "2".to_string()]))
        );
    }

    #[test]
    fn test_parse_enum_with_quoted_commas_and_escapes() {
        assert_eq!(
            r#"["a,b", "c"]"#.parse::<FieldKind>(),
            Ok(FieldKind::Enum(vec!["a,b".to_string(), "c".to_string()]))
        );
        assert_eq!(
            r#"["x\"y"]"#.parse::<FieldKind>(),
            Ok(FieldKind::Enum(vec!["x\"y".to_string()]))
        );
    }

    #[test]
    fn test_parse_invalid_rule() {
        for rule in ["strnig", "[]", "[\"a\",]", "a,b", "", "[dev, prod]", "[\"a\" \"b\"]"] {
            assert_eq!(
                rule.parse::<FieldKind>(),
                Err(FieldError::InvalidSchemaRule(rule.to_string())),
                "rule {:?} should be rejected",
                rule
            );
        }
    }

    #[test]
    fn test_display_kind() {
        assert_eq!(FieldKind::Enum(vec!["a".into(), "b".into()]).to_string(), "one of a|b");
        assert_eq!(FieldKind::OptionalNumber.to_string(), "optional number");
    }
}
