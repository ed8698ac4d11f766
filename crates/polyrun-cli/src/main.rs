//! Polyrun CLI
//!
//! A command-line tool for running code snippets locally or serving them
//! over HTTP.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polyrun::{
    Config, EXAMPLE_CONFIG, ExecutionOutcome, Language, Runner, SubmissionResponse, gate,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

mod server;

#[derive(Parser)]
#[command(name = "polyrun")]
#[command(about = "A tool for compiling and running code snippets against many inputs")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: polyrun.toml)
        #[arg(short, long, default_value = "polyrun.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a program once per input file (compile first if needed)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language (e.g. Python, C++, go)
        #[arg(short, long)]
        language: String,

        /// Input file; repeat for several runs (default: one run, no input)
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Skip the content gate
        #[arg(long)]
        no_gate: bool,

        /// Print the result as a JSON response body
        #[arg(long)]
        json: bool,
    },

    /// Check a source file without running it
    ///
    /// The content gate is a textual denylist, not a sandbox; passing it
    /// does not make code safe to run.
    Check {
        /// Source file to check
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language (e.g. Python, C++, go)
        #[arg(short, long)]
        language: String,
    },

    /// List available languages
    Languages,

    /// Show effective configuration
    ShowConfig,

    /// Serve submissions over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
    } else {
        debug!("using default configuration");
    }
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            input,
            no_gate,
            json,
        } => run_execute(config, &source, &language, &input, no_gate, json).await,
        Commands::Check { source, language } => run_check(&config, &source, &language).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
        Commands::Serve { addr } => server::serve(Runner::new(config), addr).await,
    }
}

/// Accept wire names ("C++") as well as short ids ("cpp"), case-insensitively
fn parse_language(name: &str) -> Result<Language> {
    if let Ok(language) = name.parse::<Language>() {
        return Ok(language);
    }
    Language::ALL
        .into_iter()
        .find(|lang| {
            lang.id().eq_ignore_ascii_case(name) || lang.name().eq_ignore_ascii_case(name)
        })
        .with_context(|| format!("unknown language '{name}'"))
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read source file '{}'", path.display()))
}

async fn run_execute(
    config: Config,
    source: &Path,
    language_name: &str,
    input_files: &[PathBuf],
    no_gate: bool,
    json: bool,
) -> Result<()> {
    let language = parse_language(language_name)?;
    let code = read_source(source).await?;

    if !no_gate {
        gate::validate(language, &code)?;
    }

    let mut inputs = Vec::with_capacity(input_files.len().max(1));
    for path in input_files {
        let input = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read input file '{}'", path.display()))?;
        inputs.push(input);
    }
    if inputs.is_empty() {
        inputs.push(String::new());
    }

    info!(%language, runs = inputs.len(), "running program");

    let runner = Runner::new(config);
    let outcome = runner
        .execute_language(language, &code, &inputs)
        .await
        .context("execution failed")?;

    let failed = outcome.is_compile_failure();
    if json {
        let response = SubmissionResponse::success(outcome.into_outputs());
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        match outcome {
            ExecutionOutcome::Ran(outputs) => {
                for output in outputs {
                    println!("{output}");
                }
            }
            ExecutionOutcome::CompileFailed(diagnostic) => {
                eprintln!("Compilation failed:");
                eprintln!("{diagnostic}");
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_check(config: &Config, source: &Path, language_name: &str) -> Result<()> {
    let language = parse_language(language_name)?;
    let code = read_source(source).await?;

    if code.len() > config.max_code_size {
        anyhow::bail!(
            "source is {} bytes, limit is {}",
            code.len(),
            config.max_code_size
        );
    }

    gate::validate(language, &code)?;

    let name = config
        .registry()
        .get(language)
        .source_name(&code)
        .context("source cannot be staged")?;

    println!("OK: {} would be staged as '{}'", language, name.file_name);
    Ok(())
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    for toolchain in config.registry().iter() {
        let language = toolchain.language();
        let lang_type = if toolchain.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        println!(
            "  {:<12} {:<12} ({}) {}",
            language.id(),
            language.name(),
            lang_type,
            toolchain.run_template().join(" ")
        );
    }
}

fn show_config(config: &Config) {
    println!("Job directory: {}", config.base_dir.display());
    println!("Compile timeout: {:?}", config.compile_timeout());
    println!("Execution timeout: {:?}", config.exec_timeout());
    println!("Max code size: {} bytes", config.max_code_size);
    println!("Max inputs: {}", config.max_inputs);
    println!(
        "Secret key: {}",
        if config.secret_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!();
    println!("Toolchains:");
    for toolchain in config.registry().iter() {
        let language = toolchain.language();
        if let Some(compile) = toolchain.compile_template() {
            println!("  {:<12} compile: {}", language.id(), compile.join(" "));
        }
        println!(
            "  {:<12} run:     {}",
            language.id(),
            toolchain.run_template().join(" ")
        );
    }
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
