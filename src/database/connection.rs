use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::info;

/// Owns the sqlite pool behind the user store. Opening creates the
/// database file on first run and brings the schema up to date, so the
/// bot never serves updates from an unmigrated store.
#[derive(Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn open(database_url: &str) -> Result<Self> {
        let exists = Sqlite::database_exists(database_url).await.unwrap_or(false);
        if !exists {
            info!("Creating timetable database at {database_url}");
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        info!("Running user store migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_creates_and_migrates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let db = DatabaseManager::open(&db_url).await.expect("open");
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db.pool)
            .await
            .expect("users table exists");
        assert_eq!(count, 0);

        // Reopening an existing store must be a no-op.
        DatabaseManager::open(&db_url).await.expect("reopen");
    }
}
