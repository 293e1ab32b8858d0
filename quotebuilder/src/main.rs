use axum::ServiceExt;
use axum::extract::Request;
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use quotebuilder::api::{ApiState, app};
use quotebuilder::auth::Auth;
use quotebuilder::config::{Config, redact_db_url};
use quotebuilder::context::RequestContext;
use quotebuilder::service::{ADMIN_ROLES, AccountDraft, Services, UserDraft};
use sea_orm::Database;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "quotebuilder", about = "QuoteBuilder account and profile API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server (default)
    Serve,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Grant ROLE_SYSADMIN in addition to ROLE_USER
        #[arg(long, action = clap::ArgAction::SetTrue)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing::info!(database = %redact_db_url(&config.database_url), "connecting to database");

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    tracing::info!("database initialized");

    let services = Services::new(db);

    match cli.command {
        None | Some(Commands::Serve) => {
            serve(config, services).await?;
        }
        Some(Commands::Account { action }) => {
            handle_account_action(services, action).await?;
        }
    }

    Ok(())
}

async fn serve(config: Config, services: Services) -> Result<(), Box<dyn std::error::Error>> {
    if services.accounts.count().await? == 0 {
        let Some(admin_password) = config.admin_password.as_deref() else {
            eprintln!(
                "FATAL: QB_ADMIN_PASSWORD is not set and no accounts exist. \
                 Set this environment variable to a strong password before starting."
            );
            std::process::exit(1);
        };
        services
            .accounts
            .seed_admin(&config.admin_user, admin_password)
            .await?;
    }

    let Some(client_secret) = config.client_secret else {
        eprintln!(
            "FATAL: QB_OAUTH_CLIENT_SECRET is not set. \
             Set it to the secret clients present to /oauth/token."
        );
        std::process::exit(1);
    };

    let state = ApiState {
        auth: Arc::new(Auth::new(services.accounts.clone())),
        services,
        jwt_secret: config.jwt_secret,
        token_expiry_secs: config.token_expiry_secs,
        client_id: config.client_id,
        client_secret,
    };

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "QuoteBuilder API online");

    let app = app(state, &config.cors_allowed_origins);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}

async fn handle_account_action(
    services: Services,
    action: AccountAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AccountAction::Create {
            username,
            password,
            admin,
        } => {
            let roles: &[&str] = if admin { &ADMIN_ROLES } else { &["ROLE_USER"] };
            let created = services
                .accounts
                .create_user(
                    &RequestContext::system(),
                    UserDraft {
                        account: AccountDraft {
                            username,
                            password: Some(password),
                            ..Default::default()
                        },
                        roles: Some(roles.iter().map(|r| r.to_string()).collect()),
                        profile: None,
                    },
                )
                .await?;
            tracing::info!(
                account_id = created.account.id,
                username = %created.account.username,
                is_admin = admin,
                "Created account"
            );
        }
    }
    Ok(())
}
