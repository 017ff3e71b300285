use guest_portal::{
    build_router,
    config::PortalConfig,
    error::AppError,
    middleware::rate_limit::create_ip_rate_limiter,
    observability::logging::init_tracing,
    services::{
        LiveEmailVerifier, PassphrasePolicy, RedisChallengeVerifier, RedisStore,
        RegistrationService, RegistrationSettings, SmtpNotifier,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = PortalConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting guest portal"
    );

    let store = RedisStore::connect(&config.redis).await?;
    tracing::info!("Credential store initialized");

    let challenge = RedisChallengeVerifier::new(store.manager(), config.challenge_ttl_seconds);

    let verifier = LiveEmailVerifier::new();

    let notifier = SmtpNotifier::new(
        &config.smtp,
        &config.mail,
        &config.network.ssid,
        config.credential_ttl_days,
    )?;
    tracing::info!("Notifier initialized");

    let policy = PassphrasePolicy::parse(&config.passphrase_pattern)
        .map_err(AppError::ConfigError)?;

    let store = Arc::new(store);
    let challenge = Arc::new(challenge);

    let registration = RegistrationService::new(
        store.clone(),
        Arc::new(verifier),
        challenge.clone(),
        Arc::new(notifier),
        policy,
        RegistrationSettings {
            credential_ttl_days: config.credential_ttl_days,
            guest_vlan_id: config.network.guest_vlan_id,
            corp_vlan_id: config.network.corp_vlan_id,
            base_url: config.base_url.clone(),
        },
    );

    let register_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.register_attempts,
        config.rate_limit.register_window_seconds,
    );
    tracing::info!("Rate limiter initialized for registration");

    let bind_ip = config
        .bind_addr
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid BIND_ADDR: {}", e)))?;
    let addr = SocketAddr::new(bind_ip, config.port);

    let state = AppState {
        config,
        store,
        challenge,
        registration,
        register_rate_limiter,
    };

    let app = build_router(state);

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
