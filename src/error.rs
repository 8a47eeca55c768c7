use colored::Colorize;
use std::{fmt, path::Path, path::PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or validating an env source
#[derive(Debug, Error)]
pub enum EnvError {
    /// The env file path does not exist and the source was not optional
    #[error("Env file: {} does not exist!", show_path(.path))]
    SourceNotFound { path: PathBuf },

    /// A directory was given, but it holds no `.env` file
    #[error("Env file: {} (resolved from directory {}) does not exist!", show_path(.path), .dir.display())]
    DirectorySourceNotFound { dir: PathBuf, path: PathBuf },

    /// No path was given and neither an optional file nor the process env was allowed
    #[error("No env file given; set `file_is_optional` or `use_process_env` to allow an absent source")]
    NoSource,

    /// The env file exists but could not be parsed
    #[error("Failed to parse env file: {0}")]
    Parse(#[from] dotenvy::Error),

    /// One or more required keys are absent
    #[error("{}", show_missing(.keys))]
    MissingRequiredKeys { keys: Vec<String> },

    /// A required-key predicate returned something that cannot name a key
    #[error("Required predicate #{index} returned an invalid result: {reason}")]
    InvalidPredicateResult { index: usize, reason: String },

    /// A schema field failed validation
    #[error("{}: {reason}", .field.magenta().bold())]
    Schema { field: String, reason: FieldError },

    /// A serialized schema is not a JSON object
    #[cfg(feature = "serde")]
    #[error("Invalid schema document: {0}")]
    SchemaJson(#[from] serde_json::Error),
}

impl EnvError {
    /// Missing keys carried by [`EnvError::MissingRequiredKeys`], empty otherwise
    pub fn missing_keys(&self) -> &[String] {
        match self {
            EnvError::MissingRequiredKeys { keys } => keys,
            _ => &[],
        }
    }
}

/// Why a single schema field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    MustBeString,
    MustBeNumber,
    MustBeBoolean,
    MustBeOneOf(Vec<String>),
    MustNotBeEmpty,
    /// A serialized field rule that decodes to neither a known kind nor a list
    InvalidSchemaRule(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::MustBeString => write!(f, "must be a string"),
            FieldError::MustBeNumber => write!(f, "must be a number"),
            FieldError::MustBeBoolean => write!(f, "must be a boolean"),
            FieldError::MustBeOneOf(values) => {
                let list = values
                    .iter()
                    .map(|v| format!("'{}'", v).cyan().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "must be one of [{}]", list)
            }
            FieldError::MustNotBeEmpty => write!(f, "must not be empty"),
            FieldError::InvalidSchemaRule(rule) => {
                write!(f, "invalid schema rule {}", format!("'{}'", rule).red())
            }
        }
    }
}

impl std::error::Error for FieldError {}

fn show_path(path: &Path) -> String {
    format!("{{{}}}", path.display()).red().to_string()
}

fn show_missing(keys: &[String]) -> String {
    let list = keys
        .iter()
        .map(|k| k.magenta().bold().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} required ENV variable(s) not found: {}",
        keys.len().to_string().yellow().bold(),
        list
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_not_found_message() {
        colored::control::set_override(false);

        let error = EnvError::SourceNotFound {
            path: PathBuf::from("/srv/app/.env"),
        };

        assert_eq!(error.to_string(), "Env file: {/srv/app/.env} does not exist!");
    }

    #[test]
    fn test_directory_source_message_is_distinct() {
        colored::control::set_override(false);

        let error = EnvError::DirectorySourceNotFound {
            dir: PathBuf::from("/srv/app"),
            path: PathBuf::from("/srv/app/.env"),
        };

        let output = error.to_string();
        assert!(output.contains("{/srv/app/.env}"));
        assert!(output.contains("resolved from directory /srv/app"));
    }

    #[test]
    fn test_missing_keys_message_lists_all() {
        colored::control::set_override(false);

        let error = EnvError::MissingRequiredKeys {
            keys: vec!["API_KEY".to_string(), "SOME_OTHER_KEY".to_string()],
        };

        assert_eq!(
            error.to_string(),
            "2 required ENV variable(s) not found: API_KEY, SOME_OTHER_KEY"
        );
        assert_eq!(error.missing_keys(), ["API_KEY", "SOME_OTHER_KEY"]);
    }

    #[test]
    fn test_schema_error_one_of() {
        colored::control::set_override(false);

        let error = EnvError::Schema {
            field: "MODE".to_string(),
            reason: FieldError::MustBeOneOf(vec!["a".to_string(), "b".to_string()]),
        };

        assert_eq!(error.to_string(), "MODE: must be one of ['a', 'b']");
        assert!(error.missing_keys().is_empty());
    }

    #[test]
    fn test_invalid_schema_rule_display() {
        colored::control::set_override(false);

        let reason = FieldError::InvalidSchemaRule("strnig".to_string());
        assert_eq!(reason.to_string(), "invalid schema rule 'strnig'");
    }

    #[test]
    fn test_debug_format() {
        let error = EnvError::InvalidPredicateResult {
            index: 2,
            reason: "empty key name".to_string(),
        };

        let debug_output = format!("{:?}", error);
        assert!(debug_output.contains("InvalidPredicateResult"));
        assert!(debug_output.contains("empty key name"));
    }
}
