use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parking_server::auth::PasswordService;
use parking_server::config::Config;
use parking_server::database::queries::UserQueries;
use parking_server::database::Database;
use parking_server::models::Role;
use parking_server::services::reports::run_monthly_report_loop;
use parking_server::services::Notifier;
use parking_server::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parking_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;
    tracing::info!("database connected and migrated");

    ensure_admin(&database, &config).await?;

    let notifier = Arc::new(Notifier::new(&config));

    tokio::spawn(run_monthly_report_loop(
        database.pool().clone(),
        notifier.clone(),
        config.report_check_interval_secs,
    ));

    let state = AppState {
        database,
        config: config.clone(),
        notifier,
    };
    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("parking server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the administrator account on first boot. Skipped when credentials
/// are not configured or an admin already exists.
async fn ensure_admin(database: &Database, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("admin bootstrap credentials not configured, skipping");
        return Ok(());
    };

    if UserQueries::find_any_admin(database.pool()).await?.is_some() {
        return Ok(());
    }

    let password_hash = PasswordService::hash_password(password)?;
    let admin = UserQueries::create_user(
        database.pool(),
        "Administrator",
        email,
        &password_hash,
        Role::Admin,
        "000000",
    )
    .await?;

    tracing::info!(admin_id = admin.id, "administrator account created");
    Ok(())
}
