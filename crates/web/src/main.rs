use anyhow::Context;
use std::time::Duration;
use storage::Database;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod access;
mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod session;
mod state;

use config::Config;
use session::SessionStore;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health,
        features::auth::handlers::login,
        features::auth::handlers::logout,
        features::auth::handlers::me,
        features::athletes::handlers::list_athletes,
        features::athletes::handlers::create_athlete,
        features::athletes::handlers::update_athlete,
        features::athletes::handlers::delete_athlete,
        features::athletes::handlers::delete_athletes,
        features::athletes::handlers::get_stats,
        features::uploads::handlers::upload,
        features::uploads::handlers::preview,
        features::uploads::handlers::commit,
        features::uploads::handlers::discard,
        features::uploads::handlers::download_template,
        features::admin::handlers::list_athletes,
        features::admin::handlers::list_coaches,
        features::admin::handlers::get_stats,
    ),
    components(
        schemas(
            storage::dto::athlete::AthleteResponse,
            storage::dto::athlete::CreateAthleteRequest,
            storage::dto::athlete::UpdateAthleteRequest,
            storage::dto::athlete::DeleteAthletesRequest,
            storage::dto::athlete::AthleteStats,
            storage::dto::coach::LoginRequest,
            storage::dto::coach::LoginResponse,
            storage::dto::coach::CoachResponse,
            storage::dto::common::PaginationMeta,
            storage::models::Athlete,
            storage::models::Coach,
        )
    ),
    tags(
        (name = "auth", description = "Coach sign-in and sessions"),
        (name = "athletes", description = "Athletes registered by the signed-in coach"),
        (name = "uploads", description = "Spreadsheet entry sheets"),
        (name = "admin", description = "Tournament-wide overview for admins"),
        (name = "health", description = "Liveness"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("Session token")
                        .build(),
                ),
            )
        }
    }
}

/// Expired sessions are refused on lookup; this also frees the ones nobody comes back for.
fn spawn_session_sweeper(sessions: SessionStore) {
    let period = (sessions.ttl() / 4).clamp(Duration::from_secs(60), Duration::from_secs(15 * 60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::info!(
                    "Purged {} expired session(s), {} active",
                    purged,
                    sessions.len().await
                );
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting EntryDesk API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");
    if !config.writes_enabled {
        tracing::warn!("Registrations are closed: write endpoints will answer 403");
    }

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let state = AppState::new(db, &config);
    spawn_session_sweeper(state.sessions.clone());

    let app = routes::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
