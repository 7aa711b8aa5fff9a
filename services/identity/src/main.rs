//! Identity Service binary: wires configuration, storage and both listeners
//! under the supervisor.

use anyhow::Context;
use identity_service::config::{Config, StorageBackend};
use identity_service::grpc::{GrpcProtocol, UserGrpcService};
use identity_service::http::{self, AppState, HttpProtocol};
use identity_service::jwt::TokenIssuer;
use identity_service::password::CredentialVerifier;
use identity_service::server::{Listener, Supervisor};
use identity_service::storage::{
    MemoryUserCache, MemoryUserStore, PostgresUserStore, RedisUserCache, UserCache, UserStore,
};
use identity_service::AuthService;
use rust_common::{init_tracing, TracingConfig};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(
        &TracingConfig::default()
            .with_service_name(&config.app_name)
            .with_log_level(&config.log_level)
            .with_json_output(config.log_json),
    )
    .context("Failed to initialize tracing")?;

    info!(service = %config.app_name, "Starting Identity Service");

    let auth = Arc::new(build_auth_service(&config).await?);

    let mut supervisor = Supervisor::new();
    supervisor.add(Listener::new(
        "http",
        config.http_addr(),
        HttpProtocol::new(http::router(AppState { auth: auth.clone() })),
        config.shutdown_timeout,
    ));
    supervisor.add(Listener::new(
        "grpc",
        config.grpc_addr(),
        GrpcProtocol::new(UserGrpcService::new(auth)),
        config.shutdown_timeout,
    ));

    supervisor.run().await?;

    info!("Identity Service stopped");
    Ok(())
}

async fn build_auth_service(config: &Config) -> anyhow::Result<AuthService> {
    let store: Arc<dyn UserStore> = match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory user storage; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let store = PostgresUserStore::connect(url, config.database_pool_max)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store.migrate().await.context("Failed to create schema")?;
            Arc::new(store)
        }
    };

    let cache: Arc<dyn UserCache> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisUserCache::connect(url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => Arc::new(MemoryUserCache::default()),
    };

    let verifier =
        CredentialVerifier::with_cost(config.password_memory_kib, config.password_iterations)
            .context("Invalid password hashing parameters")?;

    let issuer = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    );

    Ok(AuthService::new(
        store,
        cache,
        verifier,
        issuer,
        config.user_cache_ttl,
    ))
}
