use crate::auth::AppPolicy;
use anyhow::{anyhow, Result};
use clap::{builder::PossibleValuesParser, Arg, ArgMatches, Command};
use std::time::Duration;

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("token-ttl-seconds")
                .long("token-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("SSO_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("app-policy")
                .long("app-policy")
                .help("How unknown app ids are handled on login; auto-provision is insecure")
                .env("SSO_APP_POLICY")
                .default_value("strict")
                .value_parser(PossibleValuesParser::new(["strict", "auto-provision"])),
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub token_ttl: Duration,
    pub app_policy: AppPolicy,
}

impl Options {
    /// # Errors
    /// Returns an error if the app policy cannot be parsed.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let token_ttl = matches
            .get_one::<u64>("token-ttl-seconds")
            .copied()
            .unwrap_or(3600);

        let app_policy = matches
            .get_one::<String>("app-policy")
            .map_or(Ok(AppPolicy::Strict), |s| s.parse::<AppPolicy>())
            .map_err(|e| anyhow!(e))?;

        Ok(Self {
            token_ttl: Duration::from_secs(token_ttl),
            app_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ttl_and_policy() -> Result<()> {
        temp_env::with_vars(
            [
                ("SSO_TOKEN_TTL_SECONDS", None::<&str>),
                ("SSO_APP_POLICY", None),
            ],
            || {
                let matches = with_args(Command::new("sso")).get_matches_from(vec![
                    "sso",
                    "--token-ttl-seconds",
                    "0",
                    "--app-policy",
                    "auto-provision",
                ]);
                let options = Options::parse(&matches)?;

                assert_eq!(options.token_ttl, Duration::ZERO);
                assert_eq!(options.app_policy, AppPolicy::AutoProvision);
                Ok(())
            },
        )
    }
}
