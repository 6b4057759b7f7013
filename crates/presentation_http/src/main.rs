//! WhatSignal relay server binary
//!
//! Thin entry point: set up tracing, load configuration, and hand off to
//! [`presentation_http::server::run`]. The composition root itself lives in
//! the lib crate so `presentation_cli`'s `run` subcommand can start the
//! server in-process as well.

use infrastructure::AppConfig;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whatsignal_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            return std::process::ExitCode::from(1);
        },
    };

    presentation_http::run(config).await
}
