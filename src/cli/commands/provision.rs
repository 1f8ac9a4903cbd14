use clap::{Arg, Command};

pub const NAME: &str = "provision-app";

#[must_use]
pub fn command() -> Command {
    Command::new(NAME)
        .about("Create an app with an operator supplied signing secret")
        .arg(
            Arg::new("app-id")
                .long("app-id")
                .help("App id, must be positive")
                .required(true)
                .value_parser(clap::value_parser!(i32).range(1..)),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Display name (default: App_<app-id>)"),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .help("Signing secret for the app's session tokens")
                .env("SSO_APP_SECRET")
                .hide_env_values(true)
                .required(true),
        )
}
