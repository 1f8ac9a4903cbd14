use crate::auth::StoreConfig;
use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};
use url::Url;

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string, uses file storage when not set")
                .env("SSO_DSN")
                .global(true),
        )
        .arg(
            Arg::new("storage-path")
                .long("storage-path")
                .help("Path of the JSON file used by file storage")
                .env("SSO_STORAGE_PATH")
                .default_value("./storage/in_file_storage.json")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("store-timeout-ms")
                .long("store-timeout-ms")
                .help("Deadline for each database operation in milliseconds")
                .env("SSO_STORE_TIMEOUT_MS")
                .default_value("3000")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Pick the storage backend: database when a DSN is given, file otherwise.
///
/// # Errors
/// Returns an error if the DSN is not a postgres URL.
pub fn parse(matches: &ArgMatches) -> Result<StoreConfig> {
    if let Some(dsn) = matches.get_one::<String>("dsn") {
        let url = Url::parse(dsn).context("invalid SSO_DSN")?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(anyhow!("unsupported DSN scheme: {}", url.scheme()));
        }

        let timeout = matches
            .get_one::<u64>("store-timeout-ms")
            .copied()
            .unwrap_or(3000);

        return Ok(StoreConfig::Database {
            dsn: dsn.clone(),
            timeout: Duration::from_millis(timeout),
        });
    }

    let path = matches
        .get_one::<PathBuf>("storage-path")
        .cloned()
        .context("missing required argument: --storage-path")?;

    Ok(StoreConfig::File { path })
}
