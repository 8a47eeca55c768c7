use crate::{
    cast::cast_booleans,
    environment::{EnvStore, ProcessEnv},
    error::EnvError,
    record::TypedRecord,
    report::report_missing,
    required::{self, PredicateResult, RequiredEntry},
    schema::Schema,
    source::{parse_file, resolve_source},
    validate::validate,
    value::{RawMapping, Value},
};
use std::path::Path;
use tracing::{debug, info};

/// Options for [`load_raw`]
///
/// # Example
/// ```rust
/// use typenv::{RawOptions, RawMapping, Value};
///
/// let options = RawOptions::new()
///     .require("APP_DOMAIN")
///     .require_when(|env: &RawMapping| {
///         if env.get("CONNECT_TO_API") == Some(&Value::Bool(true)) {
///             vec!["API_KEY"]
///         } else {
///             vec![]
///         }
///     })
///     .end_process(false);
/// assert_eq!(options.required.len(), 2);
/// ```
#[derive(Debug)]
pub struct RawOptions {
    /// Turn `"true"` / `"false"` strings into booleans (default `true`)
    pub cast_boolean: bool,
    pub required: Vec<RequiredEntry>,
    /// Exit the process on missing keys instead of returning an error (default `true`)
    pub end_process: bool,
    /// Read the host environment when no file is loaded
    pub use_process_env: bool,
    /// Restrict the host environment to these keys
    pub process_env_keys: Option<Vec<String>>,
    /// A missing env file is not an error
    pub file_is_optional: bool,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            cast_boolean: true,
            required: Vec::new(),
            end_process: true,
            use_process_env: false,
            process_env_keys: None,
            file_is_optional: false,
        }
    }
}

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast_boolean(mut self, cast: bool) -> Self {
        self.cast_boolean = cast;
        self
    }

    pub fn require(mut self, entry: impl Into<RequiredEntry>) -> Self {
        self.required.push(entry.into());
        self
    }

    pub fn require_when<F, R>(mut self, predicate: F) -> Self
    where
        F: Fn(&RawMapping) -> R + Send + Sync + 'static,
        R: Into<PredicateResult>,
    {
        self.required.push(RequiredEntry::when(predicate));
        self
    }

    pub fn end_process(mut self, end: bool) -> Self {
        self.end_process = end;
        self
    }

    pub fn use_process_env(mut self, enabled: bool) -> Self {
        self.use_process_env = enabled;
        self
    }

    pub fn process_env_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.process_env_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn file_is_optional(mut self, optional: bool) -> Self {
        self.file_is_optional = optional;
        self
    }
}

/// Options for [`load_typed`]
#[derive(Debug)]
pub struct TypedOptions {
    /// Extra requirements on top of the schema's required fields
    pub required: Vec<RequiredEntry>,
    pub end_process: bool,
    /// Write validated values back into the host environment
    pub expose: bool,
    pub file_is_optional: bool,
    pub use_process_env: bool,
}

impl Default for TypedOptions {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            end_process: true,
            expose: false,
            file_is_optional: false,
            use_process_env: false,
        }
    }
}

impl TypedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, entry: impl Into<RequiredEntry>) -> Self {
        self.required.push(entry.into());
        self
    }

    pub fn require_when<F, R>(mut self, predicate: F) -> Self
    where
        F: Fn(&RawMapping) -> R + Send + Sync + 'static,
        R: Into<PredicateResult>,
    {
        self.required.push(RequiredEntry::when(predicate));
        self
    }

    pub fn end_process(mut self, end: bool) -> Self {
        self.end_process = end;
        self
    }

    pub fn expose(mut self, expose: bool) -> Self {
        self.expose = expose;
        self
    }

    pub fn file_is_optional(mut self, optional: bool) -> Self {
        self.file_is_optional = optional;
        self
    }

    pub fn use_process_env(mut self, enabled: bool) -> Self {
        self.use_process_env = enabled;
        self
    }
}

/// Loads env sources against an injected host environment
///
/// ```rust
/// use typenv::{field, Loader, MemoryEnv, Schema, TypedOptions};
///
/// let mut loader = Loader::with_store(MemoryEnv::new().with_var("APP_PORT", "8080"));
/// let schema = Schema::new().field("APP_PORT", field::required::number(None));
/// let options = TypedOptions::new().use_process_env(true).end_process(false);
///
/// let record = loader.load_typed(None, &schema, &options).unwrap();
/// assert_eq!(record.number("APP_PORT"), Some(8080.0));
/// ```
#[derive(Debug, Default)]
pub struct Loader<S = ProcessEnv> {
    store: S,
}

impl Loader<ProcessEnv> {
    pub fn new() -> Self {
        Self { store: ProcessEnv }
    }
}

impl<S: EnvStore> Loader<S> {
    /// Loader reading and exposing through `store`.
    ///
    /// `${VAR}` references inside an env file are still expanded against the
    /// real process environment, not against `store`.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Load a flat mapping, cast booleans and check required keys
    pub fn load_raw(&self, path: Option<&Path>, options: &RawOptions) -> Result<RawMapping, EnvError> {
        let mut mapping = self.read_source(
            path,
            options.file_is_optional,
            options.use_process_env,
            options.process_env_keys.as_deref(),
        )?;

        if options.cast_boolean {
            cast_booleans(&mut mapping);
        }

        let missing = required::resolve(&mapping, &options.required)?;
        report_missing(missing, options.end_process)?;

        Ok(mapping)
    }

    /// Load, check required keys, then validate every schema field
    ///
    /// Required keys are checked first and all missing keys are reported
    /// together; schema validation then stops at the first invalid field.
    pub fn load_typed(
        &mut self,
        path: Option<&Path>,
        schema: &Schema,
        options: &TypedOptions,
    ) -> Result<TypedRecord, EnvError> {
        let mut env_keys: Vec<String> = schema.names().map(str::to_string).collect();
        env_keys.extend(options.required.iter().filter_map(|entry| match entry {
            RequiredEntry::Literal(key) => Some(key.clone()),
            RequiredEntry::Predicate(_) => None,
        }));

        let raw = self.read_source(
            path,
            options.file_is_optional,
            options.use_process_env,
            Some(env_keys.as_slice()),
        )?;

        // Predicates see booleans; validation works on the uncast strings
        let mut view = raw.clone();
        cast_booleans(&mut view);

        let schema_required: Vec<RequiredEntry> = schema
            .required_keys()
            .into_iter()
            .map(RequiredEntry::Literal)
            .collect();
        let missing = required::resolve(&view, schema_required.iter().chain(&options.required))?;
        report_missing(missing, options.end_process)?;

        let record = validate(&raw, schema)?;
        debug!(fields = record.len(), "validated env schema");

        if options.expose {
            self.expose(&record);
        }

        Ok(record)
    }

    /// Copy every present field of `record` into the host environment
    pub fn expose(&mut self, record: &TypedRecord) {
        let mut count = 0;
        for (name, value) in record.iter() {
            if let Some(value) = value {
                self.store.set(name, &value.to_string());
                count += 1;
            }
        }
        info!(count, "exposed env values");
    }

    fn read_source(
        &self,
        path: Option<&Path>,
        file_is_optional: bool,
        use_process_env: bool,
        env_keys: Option<&[String]>,
    ) -> Result<RawMapping, EnvError> {
        let file = match path {
            Some(path) => resolve_source(path, file_is_optional)?,
            None if file_is_optional || use_process_env => None,
            None => return Err(EnvError::NoSource),
        };

        if let Some(file) = file {
            return parse_file(&file);
        }

        if !use_process_env {
            debug!("no env source, using empty mapping");
            return Ok(RawMapping::new());
        }

        let vars = match env_keys {
            Some(keys) => self.store.get_subset(keys),
            None => self.store.get_all(),
        };
        debug!(keys = vars.len(), "read host environment");
        Ok(vars
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect())
    }
}

/// [`Loader::load_raw`] against the process environment
pub fn load_raw(path: Option<&Path>, options: &RawOptions) -> Result<RawMapping, EnvError> {
    Loader::new().load_raw(path, options)
}

/// [`Loader::load_typed`] against the process environment
pub fn load_typed(
    path: Option<&Path>,
    schema: &Schema,
    options: &TypedOptions,
) -> Result<TypedRecord, EnvError> {
    Loader::new().load_typed(path, schema, options)
}
