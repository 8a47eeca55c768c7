use crate::{
    error::EnvError,
    value::{RawMapping, Value},
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up when a directory is given as the source
pub const DEFAULT_FILE_NAME: &str = ".env";

/// Resolve a source path to the env file that should be parsed
///
/// A directory resolves to `<dir>/.env`. Returns `Ok(None)` when nothing exists
/// and `optional` is set, otherwise a not-found error.
pub fn resolve_source(path: &Path, optional: bool) -> Result<Option<PathBuf>, EnvError> {
    if !path.exists() {
        debug!(path = %path.display(), optional, "env source does not exist");
        return if optional {
            Ok(None)
        } else {
            Err(EnvError::SourceNotFound {
                path: path.to_path_buf(),
            })
        };
    }

    if path.is_dir() {
        let file = path.join(DEFAULT_FILE_NAME);
        if !file.is_file() {
            debug!(path = %file.display(), optional, "no env file in source directory");
            return if optional {
                Ok(None)
            } else {
                Err(EnvError::DirectorySourceNotFound {
                    dir: path.to_path_buf(),
                    path: file,
                })
            };
        }
        return Ok(Some(file));
    }

    Ok(Some(path.to_path_buf()))
}

/// Parse an env file, expanding `${VAR}` references, into a flat mapping
///
/// Duplicate keys collapse to the last occurrence.
pub fn parse_file(path: &Path) -> Result<RawMapping, EnvError> {
    let mut mapping = RawMapping::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        mapping.insert(key, Value::String(value));
    }
    debug!(path = %path.display(), keys = mapping.len(), "parsed env file");
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.env");

        let result = resolve_source(&path, false);
        assert!(matches!(result, Err(EnvError::SourceNotFound { .. })));
    }

    #[test]
    fn test_missing_file_optional() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.env");

        assert!(resolve_source(&path, true).unwrap().is_none());
    }

    #[test]
    fn test_directory_resolves_to_dotenv() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1\n").unwrap();

        let resolved = resolve_source(dir.path(), false).unwrap();
        assert_eq!(resolved, Some(dir.path().join(".env")));
    }

    #[test]
    fn test_directory_without_dotenv() {
        let dir = TempDir::new().unwrap();

        let result = resolve_source(dir.path(), false);
        match result {
            Err(EnvError::DirectorySourceNotFound { dir: d, path }) => {
                assert_eq!(d, dir.path());
                assert_eq!(path, dir.path().join(".env"));
            }
            other => panic!("Expected DirectorySourceNotFound, got {:?}", other),
        }
        assert!(resolve_source(dir.path(), true).unwrap().is_none());
    }

    #[test]
    fn test_parse_expands_references() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.env");
        fs::write(
            &path,
            "# comment\nTYPENV_SRC_HOST=example.org\nTYPENV_SRC_URL=https://${TYPENV_SRC_HOST}/api\n",
        )
        .unwrap();

        let mapping = parse_file(&path).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping["TYPENV_SRC_URL"],
            Value::String("https://example.org/api".to_string())
        );
    }

    #[test]
    fn test_parse_last_duplicate_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.env");
        fs::write(&path, "KEY=first\nKEY=second\n").unwrap();

        let mapping = parse_file(&path).unwrap();
        assert_eq!(mapping["KEY"], Value::String("second".to_string()));
    }

    #[test]
    fn test_parse_error_propagates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.env");
        fs::write(&path, "GOOD=1\nthis line is not valid\n").unwrap();

        assert!(matches!(parse_file(&path), Err(EnvError::Parse(_))));
    }
}
