pub mod cast;
pub mod environment;
pub mod error;
pub mod field;
pub mod loader;
pub mod macros;
pub mod record;
pub mod report;
pub mod required;
pub mod schema;
pub mod source;
pub mod validate;
pub mod value;

// Re-export main types
pub use cast::cast_booleans;
pub use environment::{EnvStore, MemoryEnv, ProcessEnv};
pub use error::{EnvError, FieldError};
pub use field::{FieldKind, FieldRule};
pub use loader::{load_raw, load_typed, Loader, RawOptions, TypedOptions};
pub use record::TypedRecord;
pub use required::{PredicateResult, RequiredEntry};
pub use schema::Schema;
pub use value::{RawMapping, Value};

// Re-export macro
pub use typenv_macros::define_env;

use std::path::Path;

/// A struct that can be loaded from a validated env schema
///
/// Usually implemented through [`define_env!`].
pub trait FromEnv: Sized {
    /// Schema describing every field of the struct
    fn schema() -> Schema;

    /// Build the struct from a record produced by [`Self::schema`]
    fn from_record(record: &TypedRecord) -> Result<Self, EnvError>;

    /// Load against the process environment
    fn load(path: Option<&Path>, options: &TypedOptions) -> Result<Self, EnvError> {
        Self::load_with(&mut Loader::new(), path, options)
    }

    /// Load through a specific loader
    fn load_with<S: EnvStore>(
        loader: &mut Loader<S>,
        path: Option<&Path>,
        options: &TypedOptions,
    ) -> Result<Self, EnvError> {
        let record = loader.load_typed(path, &Self::schema(), options)?;
        Self::from_record(&record)
    }

    /// Load, printing the error and exiting the process on failure
    fn load_or_exit(path: Option<&Path>, options: &TypedOptions) -> Self {
        match Self::load(path, options) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(report::EXIT_CODE);
            }
        }
    }
}
