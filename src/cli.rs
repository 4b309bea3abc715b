//! Minimal CLI: load manifests → compile → print schema
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::compiler::{Compiler, Mode};
use crate::manifest;
use crate::types::TypeRegistry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile declarative type manifests into JSON Schema / OpenAPI fragments
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile one type reference and print its schema
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more manifest files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// type reference to compile, e.g. `Account`, `Account?` or `[Account]`
    #[arg(long, short)]
    root: String,

    /// encode nullability as OpenAPI 3.0 `nullable` flags
    #[arg(long)]
    open_api: bool,

    /// OpenAPI 3.1 output (type-array unions again); implies --open-api
    #[arg(long)]
    open_api_31: bool,

    /// hoist named types under components.schemas and point at them
    #[arg(long = "ref")]
    ref_schema: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => target.run(),
        }
    }
}

impl SchemaOut {
    fn run(&self) -> Result<()> {
        let registry = self.input_settings.load_registry()?;

        let mode = self.mode();
        let mut compiler = Compiler::new(mode, &registry);
        let fragment = compiler
            .compile(self.root.as_str())
            .with_context(|| format!("failed to compile `{}`", self.root))?;

        // with extraction on, the pointers need their targets alongside
        let document = if mode.contains(Mode::REF_SCHEMA) {
            json!({
                "schema": fragment,
                "components": { "schemas": compiler.schemas() },
            })
        } else {
            fragment
        };

        let rendered = serde_json::to_string_pretty(&document)?;
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                std::fs::write(out, &rendered)
                    .with_context(|| format!("failed to write {}", out.display()))?;
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }

    fn mode(&self) -> Mode {
        let mut mode = if self.open_api || self.open_api_31 {
            Mode::OPEN_API
        } else {
            Mode::JSON_SCHEMA
        };
        if self.open_api_31 {
            mode = mode | Mode::OPEN_API_31;
        }
        if self.ref_schema {
            mode = mode | Mode::REF_SCHEMA;
        }
        mode
    }
}

impl InputSettings {
    fn load_registry(&self) -> Result<TypeRegistry> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;

        let mut registry = TypeRegistry::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read manifest {}", source_path.display()))?;
            let parsed = manifest::from_str(&source)
                .with_context(|| format!("failed to parse manifest {}", source_path.display()))?;
            parsed.register_into(&mut registry)?;
        }

        if registry.is_empty() {
            anyhow::bail!("no type definitions found in the given manifests");
        }
        Ok(registry)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
