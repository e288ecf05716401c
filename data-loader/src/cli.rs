//! Command-line flags and how they combine with `KINTONE_*` settings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use kintone_core::{ClientConfig, ConfigurationError};

/// Export and import kintone records as CSV.
///
/// Connection settings fall back to `KINTONE_*` environment variables.
#[derive(Debug, Parser)]
#[command(name = "kintone-data-loader", version)]
pub struct Cli {
    /// kintone base URL, e.g. https://example.cybozu.com [env: KINTONE_BASE_URL]
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API token [env: KINTONE_API_TOKEN]
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Login name for password authentication [env: KINTONE_USERNAME]
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password for password authentication [env: KINTONE_PASSWORD]
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Basic authentication user in front of kintone [env: KINTONE_BASIC_AUTH_USERNAME]
    #[arg(long, global = true)]
    pub basic_auth_username: Option<String>,

    /// Basic authentication password [env: KINTONE_BASIC_AUTH_PASSWORD]
    #[arg(long, global = true)]
    pub basic_auth_password: Option<String>,

    /// Guest space the app lives in [env: KINTONE_GUEST_SPACE_ID]
    #[arg(long, global = true)]
    pub guest_space_id: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the app's records to stdout as CSV.
    Export {
        #[arg(long)]
        app: u64,
        /// Query condition, e.g. `status = "open"`.
        #[arg(long)]
        query: Option<String>,
    },
    /// Add the records of a CSV file to the app.
    Import {
        #[arg(long)]
        app: u64,
        #[arg(long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Settings given on the command line.
    pub fn overrides(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            basic_auth_username: self.basic_auth_username.clone(),
            basic_auth_password: self.basic_auth_password.clone(),
            guest_space_id: self.guest_space_id,
        }
    }

    /// Environment settings with command-line flags merged on top.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigurationError> {
        let figment = ClientConfig::figment().merge(Serialized::defaults(self.overrides()));
        ClientConfig::extract(&figment)
    }
}
