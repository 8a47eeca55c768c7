use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;
use typenv::{load_raw, load_typed, RawOptions, Schema, TypedOptions};

#[derive(Debug, Parser)]
#[command(name = "typenv-cli", version, about = "Load and validate .env files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an env source and print it as JSON
    Check {
        /// Env file, or a directory holding a .env file
        path: Option<PathBuf>,

        /// JSON schema to validate against
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Keys that must be present (repeatable)
        #[arg(long = "require", value_name = "KEY")]
        required: Vec<String>,

        /// Keep "true"/"false" as strings (without --schema only)
        #[arg(long)]
        no_cast_boolean: bool,

        /// Read the process environment when no file is loaded
        #[arg(long)]
        process_env: bool,

        /// Do not fail when the env file is missing
        #[arg(long)]
        optional: bool,
    },
    /// Write markdown documentation for a JSON schema
    Docs {
        #[arg(long)]
        schema: PathBuf,

        #[arg(long, default_value = "CONFIG.md")]
        out: PathBuf,
    },
}

fn read_schema(path: &Path) -> Result<Schema> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    Ok(Schema::from_json(&input)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Check {
            path,
            schema,
            required,
            no_cast_boolean,
            process_env,
            optional,
        } => {
            let output = match schema {
                Some(schema_path) => {
                    let schema = read_schema(&schema_path)?;
                    let options = required.into_iter().fold(
                        TypedOptions::new()
                            .use_process_env(process_env)
                            .file_is_optional(optional),
                        |options, key| options.require(key),
                    );
                    let record = load_typed(path.as_deref(), &schema, &options)?;
                    serde_json::to_string_pretty(&record)?
                }
                None => {
                    let options = required.into_iter().fold(
                        RawOptions::new()
                            .cast_boolean(!no_cast_boolean)
                            .use_process_env(process_env)
                            .file_is_optional(optional),
                        |options, key| options.require(key),
                    );
                    let mapping = load_raw(path.as_deref(), &options)?;
                    serde_json::to_string_pretty(&mapping)?
                }
            };
            println!("{}", output);
        }
        Command::Docs { schema, out } => {
            read_schema(&schema)?
                .write_docs(&out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Documentation written to {}", out.display());
        }
    }

    Ok(())
}
