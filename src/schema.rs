use crate::field::FieldRule;
use std::{fs, path::Path};

/// Ordered set of field rules, keyed by env variable name
///
/// # Example
/// ```rust
/// use typenv::{field, Schema};
///
/// let schema = Schema::new()
///     .field("APP_DOMAIN", field::required::string(None))
///     .field("APP_PORT", field::required::number(3000.0))
///     .field("API_KEY", field::optional::string(None));
///
/// assert_eq!(schema.required_keys(), vec!["APP_DOMAIN"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.insert(name, rule);
        self
    }

    /// Add a field. Re-declaring a name replaces its rule but keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, rule: FieldRule) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = rule,
            None => self.fields.push((name, rule)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields that must be present: non-optional kinds without a default
    pub fn required_keys(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, rule)| rule.is_required())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Render a markdown summary table of every field
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Environment Variables Summary\n\n");
        md.push_str("| Variable | Required | Kind | Description | Default |\n");
        md.push_str("|----------|----------|------|-------------|---------|\n");
        for (name, rule) in &self.fields {
            let required_str = if rule.is_required() { "Yes" } else { "No" };
            let description = rule.description.as_deref().unwrap_or("-");
            let default_display = rule
                .default
                .as_ref()
                .map(|d| d.to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                name, required_str, rule.kind, description, default_display
            ));
        }

        md
    }

    /// Write the markdown summary to a file
    ///
    /// # Example
    /// ```no_run
    /// use typenv::{field, Schema};
    ///
    /// let schema = Schema::new().field("PORT", field::required::number(8080.0));
    /// schema.write_docs("CONFIG.md").unwrap();
    /// ```
    pub fn write_docs(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.to_markdown())
    }
}

impl<N: Into<String>> FromIterator<(N, FieldRule)> for Schema {
    fn from_iter<I: IntoIterator<Item = (N, FieldRule)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, rule) in iter {
            schema.insert(name, rule);
        }
        schema
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a str, &'a FieldRule);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a FieldRule)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::Schema;
    use crate::{
        error::{EnvError, FieldError},
        field::{literal_text, FieldKind, FieldRule},
        value::Value,
    };
    use serde::Deserialize;
    use serde_json::Value as Json;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KindDef {
        Name(String),
        Values(Vec<Json>),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RuleDef {
        Kind(KindDef),
        Full {
            kind: KindDef,
            #[serde(default)]
            optional: bool,
            #[serde(default)]
            default: Option<Value>,
            #[serde(default)]
            description: Option<String>,
        },
    }

    fn decode_kind(def: KindDef) -> Result<FieldKind, FieldError> {
        match def {
            KindDef::Name(name) => name.parse(),
            KindDef::Values(values) if values.is_empty() => {
                Err(FieldError::InvalidSchemaRule("[]".to_string()))
            }
            KindDef::Values(values) => Ok(FieldKind::Enum(
                values.into_iter().map(literal_text).collect(),
            )),
        }
    }

    fn into_optional(kind: FieldKind) -> Result<FieldKind, FieldError> {
        match kind {
            FieldKind::String | FieldKind::OptionalString => Ok(FieldKind::OptionalString),
            FieldKind::Number | FieldKind::OptionalNumber => Ok(FieldKind::OptionalNumber),
            FieldKind::Enum(v) | FieldKind::OptionalEnum(v) => Ok(FieldKind::OptionalEnum(v)),
            FieldKind::Boolean => Err(FieldError::InvalidSchemaRule(
                "optional boolean".to_string(),
            )),
        }
    }

    fn decode_rule(raw: Json) -> Result<FieldRule, FieldError> {
        let text = raw.to_string();
        let def: RuleDef =
            serde_json::from_value(raw).map_err(|_| FieldError::InvalidSchemaRule(text))?;
        match def {
            RuleDef::Kind(kind) => Ok(FieldRule::new(decode_kind(kind)?)),
            RuleDef::Full {
                kind,
                optional,
                default,
                description,
            } => {
                let mut kind = decode_kind(kind)?;
                if optional {
                    kind = into_optional(kind)?;
                }
                Ok(FieldRule {
                    kind,
                    default,
                    description,
                })
            }
        }
    }

    impl Schema {
        /// Read a schema from a JSON object, keeping key order
        ///
        /// Each value is a kind name (`"number"`), a list of allowed values, or an
        /// object `{"kind": .., "optional": .., "default": .., "description": ..}`.
        pub fn from_json(input: &str) -> Result<Schema, EnvError> {
            let object: serde_json::Map<String, Json> = serde_json::from_str(input)?;
            let mut schema = Schema::new();
            for (name, raw) in object {
                let rule = decode_rule(raw).map_err(|reason| EnvError::Schema {
                    field: name.clone(),
                    reason,
                })?;
                schema.insert(name, rule);
            }
            Ok(schema)
        }
    }
}
