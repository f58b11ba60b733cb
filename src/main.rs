//! DuraBata storefront API server
//!
//! (c) DuraBata 2025

use durabata_storefront::api;
use durabata_storefront::config::Settings;
use durabata_storefront::core::assistant::GeminiClient;
use durabata_storefront::core::catalog::Catalog;
use durabata_storefront::core::services::{MyChatService, MyContactService};
use durabata_storefront::core::session::SessionLocks;
use durabata_storefront::infrastructure::database::DatabaseConnection;
use durabata_storefront::infrastructure::repositories::{DbContactRepository, DbKeyValueStore};

use anyhow::anyhow;
use axum::Router;
use axum::http::{HeaderValue, Method};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::{error, info, warn};
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    if settings.gemini.api_key.is_none() {
        error!("GEMINI_API_KEY is not set, questions outside the keyword rules get an apology");
    }

    DatabaseConnection::open(&settings.database_url)
        .map_err(|e| anyhow!("invalid DATABASE_URL {}: {e}", settings.database_url))?;

    let provider = ServiceCollection::new()
        .add(DatabaseConnection::singleton())
        .add(Catalog::singleton())
        .add(SessionLocks::singleton())
        .add(GeminiClient::singleton())
        .add(DbKeyValueStore::scoped())
        .add(DbContactRepository::scoped())
        .add(MyChatService::scoped())
        .add(MyContactService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await?;
    info!("database migrations applied");

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| warn!("ignoring allowed origin {origin}: {e}"))
                .ok()
        })
        .collect();

    let app = Router::new()
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new(&settings.static_dir)),
        )
        .nest("/products", api::products::router())
        .nest("/chat", api::chat::router())
        .nest("/contact", api::contact::router())
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_origin(AllowOrigin::list(origins)),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
