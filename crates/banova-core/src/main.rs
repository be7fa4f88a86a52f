//! banova - Bayesian two-factor hierarchical ANOVA
//!
//! The command-line entry point:
//! - `run`: fit the model to a data document and report effects and contrasts
//! - `sources`, `config show`, `schema`, `version`: introspection

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use banova_common::{format_error_human, Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use banova_core::config::{load_config, ConfigOptions, DataSource, RunOverrides, SourceStatus};
use banova_core::contrast::ContrastDocument;
use banova_core::data::{DataDocument, ResponseTransform};
use banova_core::exit_codes::ExitCode;
use banova_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use banova_core::pipeline::Pipeline;
use banova_core::report::AnalysisReport;
use banova_core::sampler::CancelToken;
use banova_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use clap::{Args, Parser, Subcommand};

/// Bayesian two-factor hierarchical ANOVA
#[derive(Parser)]
#[command(name = "banova")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (overrides BANOVA_CONFIG and the XDG default)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model and report effects and contrasts
    Run(RunArgs),
    /// List named data sources
    Sources,
    /// Configuration management
    Config(ConfigArgs),
    /// Print JSON Schema for input and report types
    Schema(SchemaArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Data document: {"response": [...], "factor1": [...], "factor2": [...]}
    #[arg(long)]
    data: PathBuf,

    /// Named source; selects the response transform and preset contrasts
    #[arg(long)]
    source: Option<String>,

    /// Contrast document; replaces the source presets
    #[arg(long)]
    contrasts: Option<PathBuf>,

    #[arg(long)]
    chain_length: Option<usize>,

    #[arg(long)]
    burnin: Option<usize>,

    #[arg(long)]
    thin: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Minimum hyper scale of the effect priors
    #[arg(long)]
    scale_floor: Option<f64>,

    /// Include raw contrast draws in the report
    #[arg(long)]
    draws: bool,

    /// Abort sampling after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type name, e.g. AnalysisReport
    type_name: Option<String>,

    /// List available types
    #[arg(long, conflicts_with = "type_name")]
    list: bool,

    /// Print every schema
    #[arg(long, conflicts_with_all = ["type_name", "list"])]
    all: bool,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else if cli.global.verbose > 0 {
        Some(LogLevel::Warn.more_verbose(cli.global.verbose))
    } else {
        None
    };
    let mut log_config = LogConfig::from_env(cli_level, None);
    // Machine-readable stdout pairs with machine-readable stderr unless asked otherwise.
    if cli.global.format.is_machine() && std::env::var_os("BANOVA_LOG_FORMAT").is_none() {
        log_config = log_config.with_format(LogFormat::Jsonl);
    }
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Run(args) => run_run(&cli.global, args),
        Commands::Sources => run_sources(&cli.global),
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
        },
        Commands::Schema(args) => run_schema(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn run_run(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    match run_pipeline(global, args) {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            ExitCode::Clean
        }
        Err(e) => output_error(global, &e),
    }
}

fn run_pipeline(global: &GlobalOpts, args: &RunArgs) -> banova_common::Result<String> {
    let log = LogContext::new(generate_run_id());
    let _run = log.run_span().entered();

    let (resolved, source, data, contrasts) = log.stage_span(Stage::Init).in_scope(|| {
        let source = args
            .source
            .as_deref()
            .map(str::parse::<DataSource>)
            .transpose()?;
        if let Some(source) = source {
            source.ensure_supported()?;
        }

        let overrides = RunOverrides {
            chain_length: args.chain_length,
            burnin: args.burnin,
            thin: args.thin,
            seed: args.seed,
            scale_floor: args.scale_floor,
        };
        let resolved = load_config(&ConfigOptions::from_env(global.config.clone(), overrides))?;

        let transform = source
            .map(DataSource::transform)
            .unwrap_or(ResponseTransform::Identity);
        let data = DataDocument::from_path(&args.data)?.into_dataset(transform)?;

        let contrasts = match (&args.contrasts, source) {
            (Some(path), _) => ContrastDocument::from_path(path)?.into_contrasts(),
            (None, Some(source)) => source.preset_contrasts()?,
            (None, None) => Vec::new(),
        };
        Ok::<_, Error>((resolved, source, data, contrasts))
    })?;

    let cancel = match args.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    let analysis = Pipeline::new(resolved.config.clone())?
        .with_run_id(log.run_id.clone())
        .run(&data, contrasts, &cancel)?;

    log.stage_span(Stage::Report).in_scope(|| {
        let report = AnalysisReport::build(&analysis, resolved.snapshot(), source, args.draws);
        let rendered = report.render(global.format)?;
        tracing::debug!(
            target: event_names::REPORT_RENDERED,
            format = %global.format,
            bytes = rendered.len(),
            "report rendered"
        );
        Ok::<_, Error>(rendered)
    })
}

fn run_sources(global: &GlobalOpts) -> ExitCode {
    let sources: Vec<_> = DataSource::ALL.iter().map(|s| s.info()).collect();

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "sources": sources,
            });
            print_json(&response);
        }
        OutputFormat::Summary => {
            for s in &sources {
                println!("{}: {}", s.name, status_label(s.status));
            }
        }
        OutputFormat::Md => {
            println!("| source | status | factor 1 | factor 2 | response | presets |");
            println!("|---|---|---|---|---|---|");
            for s in &sources {
                println!(
                    "| {} | {} | {} | {} | {} | {} |",
                    s.name,
                    status_label(s.status),
                    s.factor1.as_deref().unwrap_or("-"),
                    s.factor2.as_deref().unwrap_or("-"),
                    s.response.as_deref().unwrap_or("-"),
                    s.preset_contrasts.join(", "),
                );
            }
        }
    }
    ExitCode::Clean
}

fn status_label(status: SourceStatus) -> &'static str {
    match status {
        SourceStatus::Available => "available",
        SourceStatus::NotImplemented => "not implemented",
    }
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let options = ConfigOptions::from_env(global.config.clone(), RunOverrides::default());
    let resolved = match load_config(&options) {
        Ok(c) => c,
        Err(e) => return output_error(global, &e),
    };
    let snapshot = resolved.snapshot();

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "using_defaults": snapshot.path.is_none(),
                "source": {
                    "path": snapshot.path.as_ref().map(|p| p.display().to_string()),
                    "hash": &snapshot.hash,
                },
                "config": &snapshot.config,
            });
            print_json(&response);
        }
        OutputFormat::Md | OutputFormat::Summary => {
            match &snapshot.path {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: built-in defaults"),
            }
            match toml::to_string_pretty(&snapshot.config) {
                Ok(text) => print!("{}", text),
                Err(e) => return output_error(global, &Error::Config(e.to_string())),
            }
        }
    }
    ExitCode::Clean
}

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> ExitCode {
    if args.all {
        print_json(&generate_all_schemas());
        return ExitCode::Clean;
    }

    match args.type_name.as_deref() {
        Some(name) if !args.list => match generate_schema(name) {
            Some(schema) => {
                print_json(&schema);
                ExitCode::Clean
            }
            None => {
                eprintln!("unknown schema type '{}'; see 'banova schema --list'", name);
                ExitCode::ArgsError
            }
        },
        _ => {
            let schemas = available_schemas();
            match global.format {
                OutputFormat::Json => {
                    let list: Vec<_> = schemas
                        .iter()
                        .map(|(name, desc)| serde_json::json!({ "name": name, "description": desc }))
                        .collect();
                    print_json(&list);
                }
                OutputFormat::Md | OutputFormat::Summary => {
                    for (name, desc) in schemas {
                        println!("{:<20} {}", name, desc);
                    }
                }
            }
            ExitCode::Clean
        }
    }
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => {
            let version_info = serde_json::json!({
                "banova_version": env!("CARGO_PKG_VERSION"),
                "schema_version": SCHEMA_VERSION,
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            print_json(&version_info);
        }
        OutputFormat::Md | OutputFormat::Summary => {
            println!("banova {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

/// Report an error on the channel that matches the output format.
fn output_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::from_error(err);
    if code.is_internal_error() {
        tracing::error!(target: event_names::INTERNAL_ERROR, exit_code = %code, error = %err, "command failed");
    } else {
        tracing::debug!(exit_code = %code, "command failed");
    }
    if global.format.is_machine() {
        let structured = StructuredError::from(err).with_context("exit_code", code.code_name());
        println!("{}", structured.to_json_pretty());
    } else {
        let use_color = !global.no_color && std::io::stderr().is_terminal();
        eprintln!("{}", format_error_human(err, use_color));
    }
    code
}
