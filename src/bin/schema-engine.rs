//! Schema Engine CLI
//!
//! Command-line interface for expanding, fingerprinting, annotating, and
//! generating code from JSON Schema documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_engine::{
    expand, generate_module, get_attr, lint, load_schema, schema_data_id, schema_id, set_attr,
    validate_instance, DefinitionTable, ExtensionKey, FileStatus, ValidateError,
};

#[derive(Parser)]
#[command(name = "schema-engine")]
#[command(about = "Expand, fingerprint, and generate code from JSON Schema documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand local $refs and compositions into a dereferenced tree
    Expand {
        /// Schema file to expand
        schema: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Emit a JSON envelope with the expanded schema and cycle pointers
        #[arg(long)]
        json: bool,
    },

    /// Print content-derived identifiers for a schema
    Id {
        /// Schema file to fingerprint
        schema: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Generate a Zod TypeScript module from a schema's named definitions
    Generate {
        /// Schema file to generate from
        schema: PathBuf,

        /// Also emit a declaration for the document root under this name
        #[arg(long)]
        root: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Read or write vendor extension attributes
    Attr {
        #[command(subcommand)]
        action: AttrCommands,
    },

    /// Validate an instance document against a schema
    Validate {
        /// Instance file to validate
        instance: PathBuf,

        /// Schema file to validate against
        #[arg(long)]
        schema: PathBuf,

        /// Expand the schema before validating
        #[arg(long)]
        expand: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files (syntax, refs, compositions, extension keys)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Subcommand)]
enum AttrCommands {
    /// Read an attribute value
    Get {
        /// Schema file to read from
        schema: PathBuf,

        /// Property-name pattern (equality or substring match, ignored for
        /// system-prompt)
        #[arg(long, default_value = "")]
        property: String,

        /// Attribute key: field-prompt, reasoning-prompt, system-prompt, or
        /// description
        #[arg(long)]
        key: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Write an attribute value, emitting the updated document
    Set {
        /// Schema file to rewrite
        schema: PathBuf,

        /// Property-name pattern (equality or substring match, ignored for
        /// system-prompt)
        #[arg(long, default_value = "")]
        property: String,

        /// Attribute key: field-prompt, reasoning-prompt, system-prompt, or
        /// description
        #[arg(long)]
        key: String,

        /// The value to write
        #[arg(long)]
        value: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Expand {
            schema,
            pretty,
            output,
            json,
        } => run_expand(&schema, pretty, output, json),

        Commands::Id { schema, json } => run_id(&schema, json),

        Commands::Generate {
            schema,
            root,
            output,
        } => run_generate(&schema, root.as_deref(), output),

        Commands::Attr { action } => match action {
            AttrCommands::Get {
                schema,
                property,
                key,
                json,
            } => run_attr_get(&schema, &property, &key, json),
            AttrCommands::Set {
                schema,
                property,
                key,
                value,
                output,
                pretty,
            } => run_attr_set(&schema, &property, &key, &value, output, pretty),
        },

        Commands::Validate {
            instance,
            schema,
            expand,
            json,
        } => run_validate(&instance, &schema, expand, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_expand(
    schema_path: &Path,
    pretty: bool,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let expansion = expand(&schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let document = if json {
        serde_json::json!({
            "schema": expansion.schema,
            "cycles": expansion.cycles,
        })
    } else {
        if !expansion.cycles.is_empty() {
            eprintln!(
                "warning: {} cyclic reference(s) left unexpanded: {}",
                expansion.cycles.len(),
                expansion.cycles.join(", ")
            );
        }
        expansion.schema
    };

    let rendered = serialize(&document, pretty)?;
    write_output(&rendered, output)
}

fn run_id(schema_path: &Path, json: bool) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let id = schema_id(&schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let data_id = schema_data_id(&schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if json {
        println!(
            "{}",
            serde_json::json!({"schema_id": id, "schema_data_id": data_id})
        );
    } else {
        println!("schema_id       {}", id);
        println!("schema_data_id  {}", data_id);
    }
    Ok(())
}

fn run_generate(
    schema_path: &Path,
    root: Option<&str>,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let table = DefinitionTable::from_document(&schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for skip in table.skipped() {
        eprintln!(
            "warning: duplicate named schema \"{}\" at {} (first occurrence wins)",
            skip.name, skip.pointer
        );
    }

    let module = generate_module(&table, root).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match output {
        Some(path) => std::fs::write(&path, &module).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            print!("{}", module);
            Ok(())
        }
    }
}

fn run_attr_get(schema_path: &Path, property: &str, key: &str, json: bool) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let key = parse_key(key)?;

    let value = get_attr(&schema, property, key).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if json {
        println!("{}", serde_json::json!({"value": value}));
    } else if let Some(value) = value {
        println!("{}", value);
    }
    Ok(())
}

fn run_attr_set(
    schema_path: &Path,
    property: &str,
    key: &str,
    value: &str,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let key = parse_key(key)?;

    let updated = set_attr(&schema, property, key, value).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let rendered = serialize(&updated, pretty)?;
    write_output(&rendered, output)
}

fn parse_key(key: &str) -> Result<ExtensionKey, u8> {
    ExtensionKey::parse(key).ok_or_else(|| {
        eprintln!(
            "Error: unknown attribute key \"{}\": expected field-prompt, reasoning-prompt, system-prompt, or description",
            key
        );
        2u8
    })
}

fn run_validate(
    instance_path: &Path,
    schema_path: &Path,
    expand_first: bool,
    json: bool,
) -> Result<(), u8> {
    let mut schema = load_schema(schema_path).map_err(|e| {
        report_error(json, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;
    let instance = load_schema(instance_path).map_err(|e| {
        report_error(json, &format!("loading instance: {}", e));
        e.exit_code() as u8
    })?;

    if expand_first {
        let expansion = expand(&schema).map_err(|e| {
            report_error(json, &e.to_string());
            e.exit_code() as u8
        })?;
        if !json && !expansion.cycles.is_empty() {
            eprintln!(
                "warning: {} cyclic reference(s) left unexpanded: {}",
                expansion.cycles.len(),
                expansion.cycles.join(", ")
            );
        }
        schema = expansion.schema;
    }

    match validate_instance(&schema, &instance) {
        Ok(()) => {
            if json {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { faults }) => {
            if json {
                let output = serde_json::json!({
                    "valid": false,
                    "faults": faults
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for fault in faults {
                    eprintln!("  {}", fault);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!(
            "{}",
            serde_json::json!({"valid": false, "error": msg})
        );
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn serialize(document: &serde_json::Value, pretty: bool) -> Result<String, u8> {
    let rendered = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    rendered.map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn write_output(rendered: &str, output: Option<PathBuf>) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(&path, rendered).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            println!("{}", rendered);
            Ok(())
        }
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    use schema_engine::Severity;

    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                return Err(2);
            }
        }
    } else {
        // Text output
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let color = match diag.severity {
                    Severity::Error => "\x1b[31m",
                    Severity::Warning => "\x1b[33m",
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color,
                        match diag.severity {
                            Severity::Error => "error",
                            Severity::Warning => "warning",
                        },
                        diag.code,
                        diag.path,
                        diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
