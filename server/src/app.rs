//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{ApiServer, AuthManager};
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands, UserCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::secret::SecretManager;
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::{DataError, TransactionalService};
use crate::data::types::UserRole;
use crate::domain::users::{self, CreateUser, UserError};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub secrets: SecretManager,
    pub database: Arc<TransactionalService>,
    pub auth: Arc<AuthManager>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System {
                command: system_cmd,
            }) => Self::handle_system_command(system_cmd),
            Some(Commands::User { command: user_cmd }) => {
                Self::handle_user_command(&cli_config, user_cmd).await
            }
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init().await?;
        let secrets = SecretManager::init(&storage).await?;

        let database = Arc::new(
            TransactionalService::init(&storage)
                .await
                .context("Failed to initialize database")?,
        );
        let auth = Arc::new(AuthManager::init(&secrets, &config.auth).await?);
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            storage,
            secrets,
            database,
            auth,
        })
    }

    fn handle_system_command(cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
        }
    }

    async fn handle_user_command(cli: &CliConfig, cmd: UserCommands) -> Result<()> {
        match cmd {
            UserCommands::Create {
                email,
                password,
                name,
                admin,
            } => {
                // Validate config so a bad file fails here too
                AppConfig::load(cli)?;
                let storage = AppStorage::init().await?;
                let database = TransactionalService::init(&storage)
                    .await
                    .context("Failed to initialize database")?;

                let result = Self::create_user(&database, email, password, name, admin).await;
                database.close().await;
                result
            }
        }
    }

    async fn create_user(
        database: &TransactionalService,
        email: String,
        password: String,
        name: Option<String>,
        admin: bool,
    ) -> Result<()> {
        let name = name.unwrap_or_else(|| users::username_base(&email).to_string());
        let role = if admin {
            UserRole::Admin
        } else {
            UserRole::Stakeholder
        };

        let repo = database.repository();
        let request = CreateUser {
            name,
            email,
            password,
            role,
        };
        match users::create_user(repo.as_ref(), request).await {
            Ok(user) => {
                println!(
                    "Created {} user {} ({})",
                    user.role(),
                    user.username,
                    user.email
                );
                Ok(())
            }
            Err(UserError::Data(DataError::Conflict(message))) => {
                tracing::warn!("{}, nothing to do", message);
                Ok(())
            }
            Err(e) => Err(e).context("Failed to create user"),
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the local data directory:");
        println!("  {}", data_dir.display());
        println!();
        println!(
            "Make sure the server is not running. \
             Deleting data while the server is running will cause data corruption."
        );

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await;

        tracing::debug!(backend = app.secrets.backend().name(), "Signing key loaded");
        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            &app.storage.data_dir().display().to_string(),
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        self.shutdown
            .register(
                self.database
                    .start_checkpoint_task(self.shutdown.subscribe()),
            )
            .await;

        tracing::debug!("Background tasks started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_user_command_is_idempotent_on_email() {
        let database = TransactionalService::in_memory().await;

        CoreApp::create_user(
            &database,
            "root@example.com".to_string(),
            "pw".to_string(),
            None,
            true,
        )
        .await
        .unwrap();
        CoreApp::create_user(
            &database,
            "root@example.com".to_string(),
            "other".to_string(),
            Some("Someone Else".to_string()),
            false,
        )
        .await
        .unwrap();

        let repo = database.repository();
        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user.username, "root");
        assert!(users[0].user.is_admin);
    }
}
