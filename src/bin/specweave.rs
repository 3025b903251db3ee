//! specweave CLI
//!
//! Command-line interface for bundling, parsing, linting and validating
//! multi-file OpenAPI specifications.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use specweave::{
    bundle_file, lint_path, mapper_for, parse_file, render, validate_payload, FileStatus,
    ProjectConfig, Severity, SpecError, ValidateError,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "specweave")]
#[command(about = "Resolve, bundle and lint multi-file OpenAPI specifications")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Project configuration file (default: ./specweave.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle a multi-file specification into one document
    Bundle {
        /// Root document (default: from config, else openapi.yaml)
        spec: Option<PathBuf>,

        /// Include package to layer beneath the project (repeatable)
        #[arg(long = "include", short = 'i')]
        includes: Vec<String>,

        /// Output format: yaml (default) or json
        #[arg(long, default_value = "yaml")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Parse a specification and print its operations and typed schemas
    Parse {
        /// Root document (default: from config, else openapi.yaml)
        spec: Option<PathBuf>,

        /// Include package to layer beneath the project (repeatable)
        #[arg(long = "include", short = 'i')]
        includes: Vec<String>,

        /// Type backend used to render field types: rust or postgres
        #[arg(long, default_value = "rust")]
        types: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Lint project files for errors (syntax, broken refs, missing markers)
    Lint {
        /// Root document (default: from config, else openapi.yaml)
        spec: Option<PathBuf>,

        /// Include package to layer beneath the project (repeatable)
        #[arg(long = "include", short = 'i')]
        includes: Vec<String>,

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

    /// Validate a JSON payload against a schema of the bundled specification
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Component schema name (e.g. User)
        #[arg(long)]
        schema: String,

        /// Root document (default: from config, else openapi.yaml)
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Include package to layer beneath the project (repeatable)
        #[arg(long = "include", short = 'i')]
        includes: Vec<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project = match Project::load(cli.config.as_deref()) {
        Ok(project) => project,
        Err(code) => return ExitCode::from(code),
    };

    let result = match cli.command {
        Commands::Bundle {
            spec,
            includes,
            format,
            output,
        } => run_bundle(&project, spec, &includes, &format, output),

        Commands::Parse {
            spec,
            includes,
            types,
            pretty,
            output,
        } => run_parse(&project, spec, &includes, &types, pretty, output),

        Commands::Lint {
            spec,
            includes,
            format,
            strict,
            quiet,
        } => run_lint(&project, spec, &includes, &format, strict, quiet),

        Commands::Validate {
            payload,
            schema,
            spec,
            includes,
            json,
        } => run_validate(&project, &payload, &schema, spec, &includes, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` wins over `-v` flags.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        },
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Configuration and the directory its relative paths start from.
struct Project {
    config: ProjectConfig,
    base: PathBuf,
}

impl Project {
    fn load(flag: Option<&Path>) -> Result<Self, u8> {
        let (config, base) = match flag {
            Some(path) => {
                let config = ProjectConfig::load(path).map_err(|e| report(&e))?;
                let base = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."))
                    .to_path_buf();
                (config, base)
            }
            None => (
                ProjectConfig::discover(Path::new(".")).map_err(|e| report(&e))?,
                PathBuf::from("."),
            ),
        };
        debug!(base = %base.display(), "loaded project configuration");
        Ok(Self { config, base })
    }

    /// Flag as given, else the configured or default document under `base`.
    fn spec_path(&self, flag: Option<PathBuf>) -> PathBuf {
        match flag {
            Some(path) => path,
            None => self.base.join(self.config.spec_path(None)),
        }
    }

    fn output_path(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.config.output.as_ref().map(|p| self.base.join(p)))
    }
}

fn report(e: &SpecError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn run_bundle(
    project: &Project,
    spec: Option<PathBuf>,
    includes: &[String],
    format: &str,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let spec = project.spec_path(spec);
    let includes = project.config.includes(includes);

    let bundle = bundle_file(&spec, &includes).map_err(|e| report(&e))?;
    let text = render(&bundle, format).map_err(|e| report(&e))?;

    write_output(project.output_path(output).as_deref(), &text)
}

fn run_parse(
    project: &Project,
    spec: Option<PathBuf>,
    includes: &[String],
    types: &str,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let Some(mapper) = mapper_for(types) else {
        eprintln!("Error: unknown type backend: {} (expected rust or postgres)", types);
        return Err(2);
    };
    let spec_path = project.spec_path(spec);
    let options = project
        .config
        .parse_options(project.config.includes(includes));

    let spec = parse_file(&spec_path, &options).map_err(|e| report(&e))?;
    let summary = spec.summary(mapper.as_ref());

    let mut text = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    text.push('\n');

    write_output(output.as_deref(), &text)
}

fn run_lint(
    project: &Project,
    spec: Option<PathBuf>,
    includes: &[String],
    format: &str,
    strict: bool,
    quiet: bool,
) -> Result<(), u8> {
    let spec = project.spec_path(spec);
    if !spec.exists() {
        eprintln!("Error: path not found: {}", spec.display());
        return Err(2);
    }

    let result =
        lint_path(&spec, &project.config.includes(includes), strict).map_err(|e| report(&e))?;

    if format == "json" {
        let text = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", text);
    } else {
        if !quiet {
            println!("Linting {} ...\n", spec.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file);
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() {
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

    if result.is_ok() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_validate(
    project: &Project,
    payload_path: &Path,
    schema: &str,
    spec: Option<PathBuf>,
    includes: &[String],
    json_output: bool,
) -> Result<(), u8> {
    let data = std::fs::read(payload_path).map_err(|e| {
        report_error(
            json_output,
            &format!("cannot read {}: {}", payload_path.display(), e),
        );
        3u8
    })?;
    let payload: serde_json::Value = serde_json::from_slice(&data).map_err(|e| {
        report_error(json_output, &format!("invalid JSON in payload: {}", e));
        2u8
    })?;

    let spec = project.spec_path(spec);
    let bundle = bundle_file(&spec, &project.config.includes(includes)).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;
    let bundle = serde_json::to_value(&bundle).map_err(|e| {
        report_error(json_output, &format!("bundle is not valid JSON: {}", e));
        2u8
    })?;

    match validate_payload(&bundle, schema, &payload) {
        Ok(()) => {
            if json_output {
                println!("{}", json!({ "valid": true }));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                println!("{}", json!({ "valid": false, "errors": errors }));
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e @ ValidateError::Spec(_)) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
