//! `kintone-data-loader` binary: CSV goes to stdout, logs to stderr.

use std::process::ExitCode;

use clap::Parser;
use data_loader::cli::{Cli, Command};
use data_loader::{export_records, import_records, LoaderError, UreqTransport};
use kintone_core::KintoneRestApiClient;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // stdout carries CSV.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), LoaderError> {
    let options = cli.client_config()?.into_options()?;
    let client = KintoneRestApiClient::new(options, UreqTransport::new())?;

    match cli.command {
        Command::Export { app, query } => {
            let csv = export_records(&client, app, query).await?;
            print!("{csv}");
        }
        Command::Import { app, file } => {
            let csv = std::fs::read_to_string(&file).map_err(|source| LoaderError::Io {
                path: file.clone(),
                source,
            })?;
            let added = import_records(&client, app, &csv).await?;
            println!("imported {added} records");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            if let LoaderError::PartialImport { added, .. } = err {
                eprintln!(
                    "{added} records were stored before the failure; \
                     remove them from the CSV before retrying"
                );
            }
            ExitCode::FAILURE
        }
    }
}
