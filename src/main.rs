use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use apiready::config::ClassifierConfig;
use apiready::logging::{init_logging, LoggingConfig};
use apiready::{ApiAvailability, ClassifierError};

/// Output format for `check`
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum CheckFormat {
    /// One tab-separated line per message
    #[default]
    Text,
    /// One JSON object per message
    Json,
}

/// Output format for `patterns`
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum TableFormat {
    /// TOML, loadable again with --config
    #[default]
    Toml,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "apiready")]
#[command(version)]
#[command(about = "Classify Kubernetes API client errors as transient control-plane unavailability")]
#[command(after_help = "Examples:
  apiready check 'Get \"https://api.x.io/api/v1/nodes\": EOF'
  kubectl get nodes 2>&1 | apiready check
  apiready patterns > apiready.toml

Exit status: 0 if any message means the API is not available yet,
1 if none does, 2 on error.")]
struct Cli {
    /// Classifier configuration file (TOML)
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Suppress all logging
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify error messages, one per argument or one per stdin line
    Check {
        /// Messages to classify (reads stdin when none are given)
        #[arg(value_name = "MESSAGE")]
        messages: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: CheckFormat,
    },
    /// Print the active pattern table
    Patterns {
        /// Output format
        #[arg(long, value_enum, default_value = "toml")]
        format: TableFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(LoggingConfig::from_flags(cli.verbose, cli.quiet));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "apiready failed");
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, ClassifierError> {
    let config = match &cli.config {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::from_env()?,
    };
    let classifier = config.build()?;

    match cli.command {
        Commands::Check { messages, format } => {
            let messages = if messages.is_empty() {
                read_stdin_messages()?
            } else {
                messages
            };
            Ok(check(&classifier, &messages, format))
        }
        Commands::Patterns { format } => {
            let described = ClassifierConfig::describe(&classifier);
            let rendered = match format {
                TableFormat::Toml => described.to_toml()?,
                TableFormat::Json => described.to_json()?,
            };
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_stdin_messages() -> Result<Vec<String>, ClassifierError> {
    let mut messages = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            messages.push(line.to_string());
        }
    }
    tracing::debug!(count = messages.len(), "read messages from stdin");
    Ok(messages)
}

fn check(classifier: &ApiAvailability, messages: &[String], format: CheckFormat) -> ExitCode {
    let mut any_unavailable = false;

    for message in messages {
        let rule = classifier.matching_pattern(message).map(|p| p.name());
        any_unavailable |= rule.is_some();
        tracing::debug!(rule = rule.unwrap_or("-"), %message, "classified message");

        match format {
            CheckFormat::Text => match rule {
                Some(rule) => println!("unavailable\t{}\t{}", rule, message),
                None => println!("other\t-\t{}", message),
            },
            CheckFormat::Json => {
                let line = serde_json::json!({
                    "message": message,
                    "api_not_available": rule.is_some(),
                    "rule": rule,
                });
                println!("{}", line);
            }
        }
    }

    if any_unavailable {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
