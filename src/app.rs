use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    app_state::AppState,
    middleware::{observability_middleware, USER_ID_HEADER},
    modules::{
        admin::routes::admin_routes, auth::routes::auth_routes, courses::routes::course_routes,
        learner::routes::learner_routes,
    },
};

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.env.app.cors_allowed_origins);

    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/course", course_routes())
        .nest("/admin", admin_routes())
        .nest("/learner", learner_routes());

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
}

async fn hello() -> &'static str {
    "MicroCourses LMS API is running\n"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let storage_status = match &state.db {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::info!("Database health check failed: {}", e);
                "unhealthy"
            }
        },
        None => "in_memory",
    };

    let telemetry_health = crate::telemetry::telemetry_health_check();

    Json(json!({
        "status": "ok",
        "timestamp": time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "storage": storage_status,
            "telemetry": telemetry_health
        }
    }))
}
