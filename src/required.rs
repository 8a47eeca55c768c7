use crate::{error::EnvError, value::RawMapping};
use std::fmt;
use tracing::trace;

/// What a required-key predicate asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateResult {
    /// No additional requirement
    None,
    One(String),
    Many(Vec<String>),
}

impl From<&str> for PredicateResult {
    fn from(key: &str) -> Self {
        Self::One(key.to_string())
    }
}

impl From<String> for PredicateResult {
    fn from(key: String) -> Self {
        Self::One(key)
    }
}

impl From<Option<&str>> for PredicateResult {
    fn from(key: Option<&str>) -> Self {
        key.map_or(Self::None, Self::from)
    }
}

impl From<Vec<String>> for PredicateResult {
    fn from(keys: Vec<String>) -> Self {
        Self::Many(keys)
    }
}

impl From<Vec<&str>> for PredicateResult {
    fn from(keys: Vec<&str>) -> Self {
        Self::Many(keys.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PredicateResult {
    fn from(keys: [&str; N]) -> Self {
        Self::Many(keys.iter().map(|k| k.to_string()).collect())
    }
}

type Predicate = Box<dyn Fn(&RawMapping) -> PredicateResult + Send + Sync>;

/// A key that must be present, or a rule computing further keys from the loaded values
pub enum RequiredEntry {
    Literal(String),
    Predicate(Predicate),
}

impl RequiredEntry {
    pub fn literal(key: impl Into<String>) -> Self {
        Self::Literal(key.into())
    }

    /// Require keys conditionally, e.g. `API_KEY` only when `CONNECT_TO_API` is true
    pub fn when<F, R>(predicate: F) -> Self
    where
        F: Fn(&RawMapping) -> R + Send + Sync + 'static,
        R: Into<PredicateResult>,
    {
        Self::Predicate(Box::new(move |mapping| predicate(mapping).into()))
    }
}

impl fmt::Debug for RequiredEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(key) => f.debug_tuple("Literal").field(key).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for RequiredEntry {
    fn from(key: &str) -> Self {
        Self::literal(key)
    }
}

impl From<String> for RequiredEntry {
    fn from(key: String) -> Self {
        Self::Literal(key)
    }
}

/// Compute the keys from `entries` that are absent in `mapping`
///
/// Every predicate runs once, in order, against the unmodified mapping. The keys
/// they return are appended after the declared literals, then the whole list is
/// checked. Order is kept and duplicates are not collapsed.
pub fn resolve<'a, I>(mapping: &RawMapping, entries: I) -> Result<Vec<String>, EnvError>
where
    I: IntoIterator<Item = &'a RequiredEntry>,
{
    let mut keys: Vec<&str> = Vec::new();
    let mut discovered: Vec<String> = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            RequiredEntry::Literal(key) => keys.push(key),
            RequiredEntry::Predicate(predicate) => {
                let result = predicate(mapping);
                trace!(index, ?result, "evaluated required predicate");
                match result {
                    PredicateResult::None => {}
                    PredicateResult::One(key) => {
                        check_key(index, &key)?;
                        discovered.push(key);
                    }
                    PredicateResult::Many(found) => {
                        for key in &found {
                            check_key(index, key)?;
                        }
                        discovered.extend(found);
                    }
                }
            }
        }
    }

    keys.extend(discovered.iter().map(String::as_str));

    Ok(keys
        .into_iter()
        .filter(|key| !mapping.contains_key(*key))
        .map(str::to_string)
        .collect())
}

fn check_key(index: usize, key: &str) -> Result<(), EnvError> {
    if key.trim().is_empty() {
        return Err(EnvError::InvalidPredicateResult {
            index,
            reason: format!("empty key name {:?}", key),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cast::cast_booleans, value::raw_mapping, value::Value};

    fn sample() -> RawMapping {
        let mut mapping = raw_mapping([
            ("APP_DOMAIN", "localhost"),
            ("APP_PORT", "3000"),
            ("CONNECT_TO_API", "true"),
        ]);
        cast_booleans(&mut mapping);
        mapping
    }

    #[test]
    fn test_all_present() {
        let entries = vec![RequiredEntry::from("APP_DOMAIN"), "APP_PORT".into()];
        assert!(resolve(&sample(), &entries).unwrap().is_empty());
    }

    #[test]
    fn test_literals_in_declaration_order_with_duplicates() {
        let entries = vec![
            RequiredEntry::from("ZETA"),
            "ALPHA".into(),
            "APP_PORT".into(),
            "ZETA".into(),
        ];

        let missing = resolve(&sample(), &entries).unwrap();
        assert_eq!(missing, vec!["ZETA", "ALPHA", "ZETA"]);
    }

    #[test]
    fn test_predicate_returning_none_adds_nothing() {
        let entries = vec![RequiredEntry::when(|_: &RawMapping| PredicateResult::None)];
        assert!(resolve(&sample(), &entries).unwrap().is_empty());
    }

    #[test]
    fn test_conditional_requirement() {
        let entries = vec![RequiredEntry::when(|env: &RawMapping| {
            if env.get("CONNECT_TO_API") == Some(&Value::Bool(true)) {
                PredicateResult::from(["API_KEY", "SOME_OTHER_KEY"])
            } else {
                PredicateResult::None
            }
        })];

        let missing = resolve(&sample(), &entries).unwrap();
        assert_eq!(missing, vec!["API_KEY", "SOME_OTHER_KEY"]);

        let mut offline = sample();
        offline.insert("CONNECT_TO_API".to_string(), Value::Bool(false));
        assert!(resolve(&offline, &entries).unwrap().is_empty());
    }

    #[test]
    fn test_predicate_keys_only_missing_if_absent() {
        let entries = vec![RequiredEntry::when(|_: &RawMapping| vec!["APP_DOMAIN", "API_KEY"])];

        let missing = resolve(&sample(), &entries).unwrap();
        assert_eq!(missing, vec!["API_KEY"]);
    }

    #[test]
    fn test_discovered_keys_follow_literals() {
        let entries = vec![
            RequiredEntry::when(|_: &RawMapping| "FROM_PREDICATE"),
            RequiredEntry::from("LITERAL"),
        ];

        let missing = resolve(&sample(), &entries).unwrap();
        assert_eq!(missing, vec!["LITERAL", "FROM_PREDICATE"]);
    }

    #[test]
    fn test_predicates_see_unmodified_mapping() {
        let entries = vec![
            RequiredEntry::when(|_: &RawMapping| "FIRST"),
            RequiredEntry::when(|env: &RawMapping| {
                assert!(!env.contains_key("FIRST"));
                Some("SECOND")
            }),
        ];

        let missing = resolve(&sample(), &entries).unwrap();
        assert_eq!(missing, vec!["FIRST", "SECOND"]);
    }

    #[test]
    fn test_empty_key_from_predicate_is_invalid() {
        let entries = vec![
            RequiredEntry::from("APP_DOMAIN"),
            RequiredEntry::when(|_: &RawMapping| vec!["OK", " "]),
        ];

        match resolve(&sample(), &entries) {
            Err(EnvError::InvalidPredicateResult { index, .. }) => assert_eq!(index, 1),
            other => panic!("Expected InvalidPredicateResult, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_closure() {
        let entry = RequiredEntry::when(|_: &RawMapping| PredicateResult::None);
        assert_eq!(format!("{:?}", entry), "Predicate(..)");
        assert_eq!(
            format!("{:?}", RequiredEntry::from("KEY")),
            "Literal(\"KEY\")"
        );
    }
}
