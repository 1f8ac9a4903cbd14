use crate::cli::{
    actions::{provision, server, Action},
    commands,
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::provision::NAME, sub_m)) => provision_app(sub_m),
        _ => serve(matches),
    }
}

fn serve(matches: &ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let store = commands::storage::parse(matches)?;
    let auth = commands::auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port,
        store,
        token_ttl: auth.token_ttl,
        app_policy: auth.app_policy,
    }))
}

fn provision_app(matches: &ArgMatches) -> Result<Action> {
    let store = commands::storage::parse(matches)?;
    let app_id = matches
        .get_one::<i32>("app-id")
        .copied()
        .context("missing required argument: --app-id")?;
    let name = matches.get_one::<String>("name").cloned();
    let secret = matches
        .get_one::<String>("secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --secret")?;

    Ok(Action::ProvisionApp(provision::Args {
        store,
        app_id,
        name,
        secret,
    }))
}
