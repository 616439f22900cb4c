use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_ACCESS_TOKEN_MINUTES, ENV_CONFIG, ENV_DEFAULT_PASSWORD, ENV_HOST, ENV_PORT,
    ENV_REFRESH_TOKEN_DAYS,
};

#[derive(Parser)]
#[command(name = "canvass")]
#[command(version, about = "Questionnaire assignment and response collection server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Access token lifetime in minutes
    #[arg(long, global = true, env = ENV_ACCESS_TOKEN_MINUTES)]
    pub access_token_minutes: Option<u32>,

    /// Refresh token lifetime in days
    #[arg(long, global = true, env = ENV_REFRESH_TOKEN_DAYS)]
    pub refresh_token_days: Option<u32>,

    /// Password given to users created without one
    #[arg(long, global = true, env = ENV_DEFAULT_PASSWORD, hide_env_values = true)]
    pub default_password: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum UserCommands {
    /// Create a user account (use --admin for the first administrator)
    Create {
        /// Login email
        #[arg(long)]
        email: String,
        /// Login password
        #[arg(long)]
        password: String,
        /// Display name (defaults to the email's local part)
        #[arg(long)]
        name: Option<String>,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (database and secrets). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub access_token_minutes: Option<u32>,
    pub refresh_token_days: Option<u32>,
    pub default_password: Option<String>,
}

impl Cli {
    /// Split parsed arguments into config overrides and the subcommand
    fn into_parts(self) -> (CliConfig, Option<Commands>) {
        let config = CliConfig {
            host: self.host,
            port: self.port,
            config: self.config,
            access_token_minutes: self.access_token_minutes,
            refresh_token_days: self.refresh_token_days,
            default_password: self.default_password,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into_parts()
}
