use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use session_service::config::Config;
use session_service::domain::session::ports::AuthServicePort;
use session_service::domain::session::service::AuthService;
use session_service::domain::user::service::UserService;
use session_service::inbound::http::router::create_router;
use session_service::inbound::sweeper::spawn_token_sweeper;
use session_service::outbound::notifier::TracingResetNotifier;
use session_service::outbound::repositories::PostgresPasswordResetRepository;
use session_service::outbound::repositories::PostgresRefreshTokenRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "session-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        max_connections = config.database.max_connections,
        access_token_ttl_secs = config.jwt.access_token_ttl_secs,
        refresh_token_ttl_secs = config.session.refresh_token_ttl_secs,
        revoke_all_on_reuse = config.session.revoke_all_on_reuse,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        config.access_token_ttl(),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let refresh_token_repository = Arc::new(PostgresRefreshTokenRepository::new(pg_pool.clone()));
    let password_reset_repository = Arc::new(PostgresPasswordResetRepository::new(pg_pool));

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        refresh_token_repository,
        password_reset_repository,
        Arc::new(TracingResetNotifier::new()),
        Arc::clone(&authenticator),
        config.session_settings(),
    ));
    let user_service = Arc::new(UserService::new(user_repository, authenticator));

    spawn_token_sweeper(
        Arc::clone(&auth_service),
        Duration::from_secs(config.session.cleanup_interval_secs.max(1)),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        user_service,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
