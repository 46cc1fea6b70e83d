//! CLI module for Docscribe

mod args;

pub use args::{Args, Command};

use crate::analysis::Extractor;
use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::llm::CompletionClient;
use crate::output::{write_document, DocumentAssembler, DocumentSettings};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "docscribe.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_tracing(&args);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for `extract`
fn init_tracing(args: &Args) {
    let level = if args.quiet {
        Level::WARN
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Explicit config must load; the default file is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                Config::load(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            path,
            output,
            config,
            provider,
            model,
            exclude,
            include_source,
            fail_fast,
            progress,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(CliOverrides {
                root: path,
                output,
                provider,
                model,
                exclude,
                include_source,
                fail_fast,
            })?;
            cfg.validate()?;

            debug!("Source: {}", cfg.source.root.display());
            debug!("Output: {}", cfg.output.path.display());
            debug!("Provider: {:?}, model: {}", cfg.llm.provider, cfg.llm.model);

            let client = CompletionClient::from_config(&cfg.llm)?;
            debug!("Using {} backend", client.backend_name());
            let mut extractor = Extractor::new(cfg.source.clone())?.with_progress(progress);
            let extraction = extractor.extract()?;

            println!(
                "Extracted {} classes, {} methods from {} files",
                extraction.classes.len(),
                extraction.method_count(),
                extraction.files
            );

            if !extraction.parse_failures.is_empty() {
                println!("\nParse errors ({}):", extraction.parse_failures.len());
                for failure in extraction.parse_failures.iter().take(5) {
                    println!("  {}: {}", failure.path.display(), failure.message);
                }
                if extraction.parse_failures.len() > 5 {
                    println!("  ... and {} more", extraction.parse_failures.len() - 5);
                }
            }

            let assembler = DocumentAssembler::new(&client, DocumentSettings::from_config(&cfg))
                .with_progress(progress);
            let document = assembler.assemble(&extraction.classes)?;

            write_document(&cfg.output.path, &document.markdown)?;

            println!("{}", document.report.summary());
            println!("Documentation written to: {}", cfg.output.path.display());

            Ok(())
        }

        Command::Extract {
            path,
            config,
            exclude,
            pretty,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(CliOverrides {
                root: path,
                exclude,
                ..Default::default()
            })?;
            cfg.validate()?;

            let mut extractor = Extractor::new(cfg.source)?;
            let extraction = extractor.extract()?;

            let json = if pretty {
                serde_json::to_string_pretty(&extraction)?
            } else {
                serde_json::to_string(&extraction)?
            };
            println!("{}", json);

            Ok(())
        }

        Command::Version => {
            println!("docscribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
