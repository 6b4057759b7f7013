//! WhatSignal operator CLI
//!
//! `run` starts the relay server in-process (same composition root as the
//! `whatsignal-server` binary); `migrate`, `check-config`, and `print-config`
//! are maintenance commands an operator runs before or alongside it.

use clap::{Parser, Subcommand};
use infrastructure::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "whatsignal", version, about = "WhatSignal relay operator CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the webhook server (default if no subcommand is given)
    Run,
    /// Apply pending schema migrations and exit
    Migrate,
    /// Validate the effective configuration and print it, secrets redacted
    CheckConfig,
    /// Print the effective configuration as TOML, secrets redacted
    PrintConfig,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(cli.verbose)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return std::process::ExitCode::from(1);
        },
    };

    match cli.command {
        Command::Run => presentation_http::run(config).await,
        Command::Migrate => run_migrate(&config),
        Command::CheckConfig => run_check_config(&config),
        Command::PrintConfig => run_print_config(&config),
    }
}

/// Force `run_migrations` on and open a pool; `create_pool` applies pending
/// migrations as a side effect before handing back the connection.
fn run_migrate(config: &AppConfig) -> std::process::ExitCode {
    let mut database = config.database.clone();
    database.run_migrations = true;

    match infrastructure::create_pool(&database) {
        Ok(_pool) => {
            println!("migrations applied");
            std::process::ExitCode::from(0)
        },
        Err(e) => {
            eprintln!("migration failed: {e}");
            std::process::ExitCode::from(2)
        },
    }
}

fn run_check_config(config: &AppConfig) -> std::process::ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("configuration is invalid: {e}");
        return std::process::ExitCode::from(1);
    }
    match redacted_config_toml(config) {
        Ok(toml) => {
            println!("configuration is valid");
            println!("{toml}");
            std::process::ExitCode::from(0)
        },
        Err(e) => {
            eprintln!("failed to render configuration: {e}");
            std::process::ExitCode::from(1)
        },
    }
}

fn run_print_config(config: &AppConfig) -> std::process::ExitCode {
    match redacted_config_toml(config) {
        Ok(toml) => {
            println!("{toml}");
            std::process::ExitCode::from(0)
        },
        Err(e) => {
            eprintln!("failed to render configuration: {e}");
            std::process::ExitCode::from(1)
        },
    }
}

/// Render `config` as TOML with every secret-bearing field replaced by a
/// placeholder. `AppConfig` derives `Serialize` for config-file round
/// tripping, but `secrecy`'s `serde` feature serialises the real secret
/// value; that derive must never be used directly for operator-facing
/// output, so the redaction happens on the serialised `toml::Value` instead.
fn redacted_config_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut value = toml::Value::try_from(config)?;

    if let Some(signal) = value.get_mut("signal").and_then(toml::Value::as_table_mut) {
        signal.insert("webhook_secret".to_string(), toml::Value::String("[redacted]".to_string()));
        signal.insert(
            "intermediary_phone_number".to_string(),
            toml::Value::String("[redacted]".to_string()),
        );
    }
    if let Some(whatsapp) = value.get_mut("whatsapp").and_then(toml::Value::as_table_mut) {
        if whatsapp.contains_key("webhook_secret") {
            whatsapp
                .insert("webhook_secret".to_string(), toml::Value::String("[redacted]".to_string()));
        }
    }

    toml::to_string_pretty(&value)
}

/// Map `-v` occurrences to a tracing filter directive, following the
/// project's convention: 0 warn, 1 info, 2 debug, 3+ trace.
fn log_filter_from_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
