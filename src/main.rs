//! CLI entry point for the download broker.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use download_broker::{
    Broker, DownloadMarkers, HandoffOutcome, LinkClassifier, ManagerClient, ManagerStatus,
};
use tracing::{debug, info};

mod app_config;
mod cli;
mod console_host;

use app_config::VerbositySetting;
use cli::{Cli, Command};
use console_host::ConsoleHost;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let loaded = app_config::load_config(cli.config.as_deref())?;
    init_tracing(&cli, loaded.config.verbosity);

    debug!(
        ?cli,
        config_path = ?loaded.path,
        loaded_from_file = loaded.loaded_from_file,
        "configuration resolved"
    );

    let broker_config = loaded.config.broker_config();

    match cli.command {
        Command::Classify {
            url,
            text,
            page_marker,
            element_marker,
        } => {
            let classifier = LinkClassifier::new(broker_config.attribute_scope);
            let markers = DownloadMarkers {
                on_page: page_marker,
                on_element: element_marker,
            };
            if let Some(reason) = classifier.explain(&url, &text, markers) {
                println!("download ({reason})");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("not a download");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Status => {
            let watcher = build_broker(&loaded.config, cli.port)?.download_watcher();
            let status = watcher.status().await;
            println!("{status}");
            Ok(exit_code(status == ManagerStatus::Connected))
        }
        Command::Send { url, filename } => {
            let watcher = build_broker(&loaded.config, cli.port)?.download_watcher();
            let outcome = watcher.send_link(url, filename.as_deref()).await;
            info!(?outcome, "send finished");
            Ok(exit_code(outcome == HandoffOutcome::Delivered))
        }
    }
}

fn build_broker(config: &app_config::FileConfig, port: Option<u16>) -> Result<Broker> {
    let manager_config = config.manager_config(port);
    let client = Arc::new(ManagerClient::new(&manager_config)?);
    debug!(port = manager_config.port, "using download manager on loopback");
    Ok(Broker::new(
        client.clone(),
        client,
        Arc::new(ConsoleHost),
        config.broker_config(),
    ))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > config verbosity > default (info).
fn init_tracing(cli: &Cli, file_verbosity: Option<VerbositySetting>) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => file_verbosity.map_or("info", VerbositySetting::filter_directive),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout only carries command results.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
