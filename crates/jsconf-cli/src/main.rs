//! jsconf CLI tool
//!
//! Examples:
//!   jsconf complete nuxt.config.js --offset 42
//!   jsconf complete nuxt.config.js --caret --module nuxt@2.8.1
//!   jsconf tree nuxt.config.ts
//!   jsconf schema nuxt-config
//!   jsconf check-schema vite.schema.json
//!   jsconf lsp

mod render;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jsconf_complete::CompletionEngine;
use jsconf_schema::{
    ConfigSchema, ProjectDependencies, RegistryError, SchemaRegistry, VersionContext,
    VersionResolver,
};
use jsconf_tree::Document;
use tracing::debug;

// ============================================================================
// Exit codes
// ============================================================================

const EXIT_SUCCESS: i32 = 0;
const EXIT_SYNTAX_ERROR: i32 = 1;
const EXIT_IO_ERROR: i32 = 3;

/// Marker `--caret` looks for in the input file.
const CARET: &str = "<caret>";

// ============================================================================
// CLI argument structures
// ============================================================================

/// Schema-driven key completion for JavaScript/TypeScript configuration files
#[derive(Parser, Debug)]
#[command(name = "jsconf", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the keys that can be written at a position
    Complete(CompleteArgs),

    /// Show the parsed tree and parse errors
    Tree {
        /// Input file
        file: PathBuf,
    },

    /// List schema kinds, or outline one
    Schema {
        /// Kind to outline
        kind: Option<String>,

        /// Extra schema file to register
        #[arg(long = "schema", value_name = "FILE")]
        schemas: Vec<PathBuf>,
    },

    /// Validate a schema file
    CheckSchema {
        /// Schema file
        file: PathBuf,
    },

    /// Start language server (stdio)
    Lsp,
}

fn main() {
    let args = Args::parse();

    if !matches!(args.command, Command::Lsp) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(io::stderr)
            .init();
    }

    let result = match args.command {
        Command::Complete(args) => run_complete(args),
        Command::Tree { file } => run_tree(&file),
        Command::Schema { kind, schemas } => run_schema(kind.as_deref(), &schemas),
        Command::CheckSchema { file } => run_check_schema(&file),
        Command::Lsp => run_lsp(),
    };

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            match &e {
                CliError::Reported => {}
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(e.exit_code());
        }
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Usage(String),
    /// A diagnostic was already written to stderr.
    Reported,
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) => EXIT_IO_ERROR,
            CliError::Usage(_) => EXIT_SYNTAX_ERROR,
            CliError::Reported => EXIT_SYNTAX_ERROR,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Usage(e) => write!(f, "{e}"),
            CliError::Reported => write!(f, "errors reported"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Io { path, error } => CliError::Io(io::Error::new(
                error.kind(),
                format!("{}: {error}", path.display()),
            )),
            other => CliError::Usage(other.to_string()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(io::Error::new(e.kind(), format!("{}: {e}", path.display()))))
}

fn registry_with(schemas: &[PathBuf]) -> Result<SchemaRegistry, CliError> {
    let mut registry = SchemaRegistry::with_bundled()?;
    for path in schemas {
        registry.load_file(path)?;
    }
    Ok(registry)
}

// ============================================================================
// Subcommand implementations
// ============================================================================

#[derive(clap::Args, Debug)]
struct CompleteArgs {
    /// Configuration file
    file: PathBuf,

    /// Byte offset of the cursor
    #[arg(long, conflicts_with = "caret", required_unless_present = "caret")]
    offset: Option<u32>,

    /// Take the cursor from a `<caret>` marker in the file
    #[arg(long)]
    caret: bool,

    /// Configuration kind; guessed from the file name by default
    #[arg(long)]
    kind: Option<String>,

    /// Active module as `name@version`, instead of reading package.json
    #[arg(long = "module", value_name = "NAME@VERSION")]
    modules: Vec<String>,

    /// package.json to read modules from; the nearest one by default
    #[arg(long)]
    package_json: Option<PathBuf>,

    /// Extra schema file to register
    #[arg(long = "schema", value_name = "FILE")]
    schemas: Vec<PathBuf>,

    /// Print candidates as JSON
    #[arg(long)]
    json: bool,
}

fn run_complete(args: CompleteArgs) -> Result<(), CliError> {
    let registry = registry_with(&args.schemas)?;
    let kind = match args.kind {
        Some(kind) => kind,
        None => registry
            .kind_for_path(&args.file)
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::Usage(format!(
                    "no schema matches {}, pass --kind",
                    args.file.display()
                ))
            })?,
    };

    let mut source = read_file(&args.file)?;
    let offset = match args.offset {
        Some(offset) => offset,
        None if !args.caret => {
            return Err(CliError::Usage("pass --offset or --caret".to_string()));
        }
        None => {
            let at = source.find(CARET).ok_or_else(|| {
                CliError::Usage(format!("no {CARET} marker in {}", args.file.display()))
            })?;
            source.replace_range(at..at + CARET.len(), "");
            at as u32
        }
    };
    if offset as usize > source.len() || !source.is_char_boundary(offset as usize) {
        return Err(CliError::Usage(format!(
            "offset {offset} is not a position in {}",
            args.file.display()
        )));
    }

    let context = version_context(&args.file, &args.modules, args.package_json.as_deref())?;
    debug!(?context, kind, offset, "completing");

    let completions = CompletionEngine::new(&registry)
        .complete_source(&kind, &source, offset, &context)
        .map_err(|e| CliError::Usage(e.to_string()))?;

    if args.json {
        let candidates: Vec<_> = completions
            .candidates
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "display": c.display,
                    "detail": c.detail,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(candidates));
    } else {
        for display in completions.displays() {
            println!("{display}");
        }
    }
    Ok(())
}

/// Modules from `--module`, else from the given or nearest `package.json`.
fn version_context(
    file: &Path,
    modules: &[String],
    package_json: Option<&Path>,
) -> Result<VersionContext, CliError> {
    let resolver = VersionResolver::default();

    if !modules.is_empty() {
        let mut dependencies = ProjectDependencies::new();
        for spec in modules {
            dependencies.add_spec(spec);
        }
        return Ok(resolver.resolve(&dependencies));
    }

    let manifest = match package_json {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let dir = std::path::absolute(file)?
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            jsconf_lsp::find_package_json(&dir)
        }
    };
    let Some(manifest) = manifest else {
        debug!("no package.json found");
        return Ok(VersionContext::new());
    };

    let source = read_file(&manifest)?;
    let dependencies = ProjectDependencies::from_package_json(&source)
        .map_err(|e| CliError::Usage(format!("{}: {e}", manifest.display())))?;
    Ok(resolver.resolve(&dependencies))
}

fn run_tree(file: &Path) -> Result<(), CliError> {
    let source = read_file(file)?;
    let document = Document::parse(&source);

    print!("{}", render::document_tree(&document));

    if document.is_clean() {
        return Ok(());
    }
    let filename = file.display().to_string();
    for error in &document.errors {
        error.write_report(&filename, &source, io::stderr());
    }
    Err(CliError::Reported)
}

fn run_schema(kind: Option<&str>, schemas: &[PathBuf]) -> Result<(), CliError> {
    let registry = registry_with(schemas)?;
    match kind {
        None => {
            for schema in registry.schemas() {
                println!("{}\t{}", schema.kind, schema.files.join(" "));
            }
        }
        Some(kind) => {
            let schema = registry
                .get(kind)
                .ok_or_else(|| CliError::Usage(format!("unknown schema kind `{kind}`")))?;
            print!("{}", render::schema_outline(schema));
        }
    }
    Ok(())
}

fn run_check_schema(file: &Path) -> Result<(), CliError> {
    let source = read_file(file)?;
    match ConfigSchema::from_json(&source) {
        Ok(schema) => {
            let count = schema.root.properties().map_or(0, |p| p.len());
            println!("{}: ok, kind `{}`, {count} root properties", file.display(), schema.kind);
            Ok(())
        }
        Err(e) => {
            e.write_report(&file.display().to_string(), &source, io::stderr());
            Err(CliError::Reported)
        }
    }
}

fn run_lsp() -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new().map_err(CliError::Io)?;
    rt.block_on(async {
        jsconf_lsp::run()
            .await
            .map_err(|e: eyre::Report| CliError::Io(io::Error::other(e.to_string())))
    })
}
