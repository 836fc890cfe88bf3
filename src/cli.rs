use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{AccountCommand, CredentialsCommand};
use crate::config::Config;

#[derive(Debug, Clone, Parser)]
#[command(name = "whoaws", version, about = "Resolve AWS credentials and identify the owning account", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(long, global = true, help = "Static access key, tried before any other source")]
    pub access_key: Option<String>,

    #[arg(long, global = true, help = "Static secret key paired with --access-key")]
    pub secret_key: Option<String>,

    #[arg(long, global = true, help = "Session token for the static credentials")]
    pub session_token: Option<String>,

    #[arg(long, global = true, help = "Region for identity calls (defaults to us-east-1)")]
    pub region: Option<String>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Resolve credentials and print the owning partition and account ID")]
    Account(AccountCommand),
    #[command(about = "Resolve credentials and print where they came from")]
    Credentials(CredentialsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Config {
            access_key: self.access_key,
            secret_key: self.secret_key,
            security_token: self.session_token,
            region: self.region,
        };

        let command = self
            .command
            .unwrap_or(Commands::Account(AccountCommand { json: false }));

        match command {
            Commands::Account(cmd) => cmd.execute(&config).await,
            Commands::Credentials(cmd) => cmd.execute(&config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_no_command_defaults_to_account() {
        let cli = Cli::try_parse_from(["whoaws"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_account_command_parsing() {
        let cli = Cli::try_parse_from(["whoaws", "account"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Account(_))));
    }

    #[test]
    fn test_account_json_flag() {
        let cli = Cli::try_parse_from(["whoaws", "account", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Account(cmd)) => assert!(cmd.json),
            _ => panic!("Expected Account command"),
        }
    }

    #[test]
    fn test_credentials_command_parsing() {
        let cli = Cli::try_parse_from(["whoaws", "credentials"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Credentials(_))));
    }

    #[test]
    fn test_static_credential_flags() {
        let cli = Cli::try_parse_from([
            "whoaws",
            "--access-key",
            "AKIAEXAMPLE",
            "--secret-key",
            "secret",
            "--session-token",
            "token",
            "account",
        ])
        .unwrap();
        assert_eq!(cli.access_key.as_deref(), Some("AKIAEXAMPLE"));
        assert_eq!(cli.secret_key.as_deref(), Some("secret"));
        assert_eq!(cli.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_region_flag() {
        let cli = Cli::try_parse_from(["whoaws", "--region", "eu-central-1", "account"]).unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-central-1"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["whoaws", "account", "--region", "eu-west-1"]).unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_verbose_flag_counts() {
        let cli = Cli::try_parse_from(["whoaws", "-vv", "account"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_verbose_default_zero() {
        let cli = Cli::try_parse_from(["whoaws", "account"]).unwrap();
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_invalid_command_fails() {
        let result = Cli::try_parse_from(["whoaws", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_flag_works() {
        let result = Cli::try_parse_from(["whoaws", "--help"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_version_flag_works() {
        let result = Cli::try_parse_from(["whoaws", "--version"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn test_command_structure_validation() {
        let cmd = Cli::command();
        cmd.debug_assert();
    }
}
