pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod services;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PortalConfig;
use crate::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use crate::services::{ChallengeVerifier, CredentialStore, RegistrationService};

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub store: Arc<dyn CredentialStore>,
    pub challenge: Arc<dyn ChallengeVerifier>,
    pub registration: RegistrationService,
    pub register_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Register is the only endpoint worth brute-forcing for free challenges
    // and mail sends, so it gets its own IP limiter.
    let register_limiter = state.register_rate_limiter.clone();
    let register_route = Router::new()
        .route("/api/v1/register", post(handlers::portal::register))
        .layer(from_fn_with_state(
            register_limiter,
            ip_rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/captcha", get(handlers::portal::new_challenge))
        .route("/api/v1/approve", get(handlers::portal::approve))
        .merge(register_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
