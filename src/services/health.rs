use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::database::connection::DatabaseManager;
use crate::database::models::User;
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub connection_pool_size: u32,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersCountResponse {
    pub count: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub start_time: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        let state = AppState {
            db,
            start_time: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/api/users/count", get(users_count))
            .with_state(state);

        Self { router }
    }
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let start = std::time::Instant::now();

    let db_status = match test_database_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response_time_ms = start.elapsed().as_millis() as u64;
    let uptime = Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds() as u64;

    let health_response = HealthResponse {
        status: db_status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: db_status.to_string(),
            connection_pool_size: state.db.pool.size(),
            response_time_ms,
        },
        uptime_seconds: uptime,
    };

    if health_response.status == "healthy" {
        Ok(Json(health_response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn users_count(State(state): State<AppState>) -> Result<Json<UsersCountResponse>, StatusCode> {
    match User::count(&state.db.pool).await {
        Ok(count) => Ok(Json(UsersCountResponse { count })),
        Err(e) => {
            tracing::error!("users count query failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn test_database_connection(db: &DatabaseManager) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1")
        .fetch_one(&db.pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let db = Arc::new(
            DatabaseManager::open(&db_url)
                .await
                .expect("Failed to create test database"),
        );

        (
            AppState {
                db,
                start_time: Utc::now(),
            },
            temp_dir,
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _temp_dir) = test_state().await;

        let response = health_check(State(state))
            .await
            .expect("health check should succeed");

        assert_eq!(response.status, "healthy");
        assert_eq!(response.database.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_users_count_empty() {
        let (state, _temp_dir) = test_state().await;

        let response = users_count(State(state))
            .await
            .expect("count should succeed");

        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_users_count_after_insert() {
        let (state, _temp_dir) = test_state().await;

        User::get_or_create(&state.db.pool, 100)
            .await
            .expect("user creation should succeed");
        User::get_or_create(&state.db.pool, 200)
            .await
            .expect("user creation should succeed");

        let response = users_count(State(state))
            .await
            .expect("count should succeed");

        assert_eq!(response.count, 2);
    }
}
