use serial_test::serial;
use std::{env, path::Path};
use typenv::{
    field, load_typed, EnvError, FieldError, Loader, MemoryEnv, RawMapping, Schema,
    TypedOptions, Value,
};

const LOCAL_ENV: &str = "./tests/local.env";

fn local() -> Option<&'static Path> {
    Some(Path::new(LOCAL_ENV))
}

fn app_schema() -> Schema {
    Schema::new()
        .field("APP_DOMAIN", field::required::string(None))
        .field("APP_FOLDER", field::required::string(None))
        .field("APP_PORT", field::required::number(None))
        .field("APP_URL", field::required::string(None))
        .field("CONNECT_TO_API", field::required::boolean(None))
}

#[test]
fn test_load_typed() {
    let env = load_typed(local(), &app_schema(), &TypedOptions::new()).unwrap();

    let values: Vec<(&str, Option<&Value>)> = env.iter().collect();
    assert_eq!(
        values,
        vec![
            ("APP_DOMAIN", Some(&Value::from("localhost"))),
            ("APP_FOLDER", Some(&Value::from("/blog"))),
            ("APP_PORT", Some(&Value::Number(3000.0))),
            ("APP_URL", Some(&Value::from(":"))),
            ("CONNECT_TO_API", Some(&Value::Bool(true))),
        ]
    );
}

#[test]
fn test_missing_required_schema_key() {
    let schema = Schema::new().field("API_KEY", field::required::string(None));
    let options = TypedOptions::new().end_process(false);

    match load_typed(local(), &schema, &options) {
        Err(EnvError::MissingRequiredKeys { keys }) => assert_eq!(keys, vec!["API_KEY"]),
        other => panic!("Expected MissingRequiredKeys, got {:?}", other),
    }
}

#[test]
fn test_required_with_conditions() {
    let schema = Schema::new().field("CONNECT_TO_API", field::required::boolean(None));
    let options = TypedOptions::new()
        .require_when(|env: &RawMapping| {
            if env.get("CONNECT_TO_API") == Some(&Value::Bool(true)) {
                vec!["API_KEY", "SOME_OTHER_KEY"]
            } else {
                vec![]
            }
        })
        .end_process(false);

    let err = load_typed(local(), &schema, &options).unwrap_err();
    assert_eq!(err.missing_keys(), ["API_KEY", "SOME_OTHER_KEY"]);
}

#[test]
fn test_defaults_fill_absent_keys() {
    let schema = app_schema()
        .field("API_KEY", field::required::string("hello"))
        .field("RETRIES", field::required::number(3.0))
        .field("MODE", field::required::one_of(["dev", "prod"], "dev"))
        .field("TIMEOUT", field::optional::number(None));
    let options = TypedOptions::new().end_process(false);

    let env = load_typed(local(), &schema, &options).unwrap();
    assert_eq!(env.str("API_KEY"), Some("hello"));
    assert_eq!(env.number("RETRIES"), Some(3.0));
    assert_eq!(env.str("MODE"), Some("dev"));
    assert!(env.contains("TIMEOUT"));
    assert_eq!(env.get("TIMEOUT"), None);
}

#[test]
fn test_invalid_field_fails_fast() {
    let schema = Schema::new()
        .field("APP_DOMAIN", field::required::number(None))
        .field("APP_FOLDER", field::required::one_of(["/docs"], None));

    match load_typed(local(), &schema, &TypedOptions::new()) {
        Err(EnvError::Schema { field, reason }) => {
            assert_eq!(field, "APP_DOMAIN");
            assert_eq!(reason, FieldError::MustBeNumber);
        }
        other => panic!("Expected schema error, got {:?}", other),
    }
}

#[test]
fn test_enum_rejects_unknown_value() {
    let schema = Schema::new().field("APP_DOMAIN", field::required::one_of(["a", "b"], None));

    match load_typed(local(), &schema, &TypedOptions::new()) {
        Err(EnvError::Schema { reason, .. }) => assert_eq!(
            reason,
            FieldError::MustBeOneOf(vec!["a".to_string(), "b".to_string()])
        ),
        other => panic!("Expected MustBeOneOf, got {:?}", other),
    }
}

#[test]
fn test_absent_file_with_schema_reads_process_env_store() {
    let mut loader = Loader::with_store(MemoryEnv::new().with_var("APP_DOMAIN", "localhost"));
    let schema = Schema::new().field("APP_DOMAIN", field::required::string(None));
    let options = TypedOptions::new().use_process_env(true);

    let env = loader.load_typed(None, &schema, &options).unwrap();
    assert_eq!(env.str("APP_DOMAIN"), Some("localhost"));
}

#[test]
#[serial]
fn test_expose_sets_process_env() {
    env::remove_var("CONNECT_TO_TO");
    let schema = app_schema().field("CONNECT_TO_TO", field::optional::string("d"));
    let options = TypedOptions::new().expose(true);

    let loaded = load_typed(local(), &schema, &options).unwrap();

    assert!(loaded.iter().all(|(key, _)| env::var(key).is_ok()));
    assert_eq!(env::var("APP_PORT").as_deref(), Ok("3000"));
    assert_eq!(env::var("CONNECT_TO_API").as_deref(), Ok("true"));
    assert_eq!(env::var("CONNECT_TO_TO").as_deref(), Ok("d"));

    for (key, _) in loaded.iter() {
        env::remove_var(key);
    }
}
