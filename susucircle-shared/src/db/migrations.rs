/// Database migration runner
///
/// Runs the SQL migrations stored in the `migrations/` directory at the
/// workspace root using sqlx's embedded migrator. Each migration is a
/// reversible pair: `{timestamp}_{name}.up.sql` / `{timestamp}_{name}.down.sql`.
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::db::pool::{create_pool, DatabaseConfig};
/// use susucircle_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///
///     Ok(())
/// }
/// ```

use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// Migrations that have already been applied are skipped. A failed
/// migration is rolled back and surfaced as an error; the schema is never
/// left half-applied.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database migrations complete");
    Ok(())
}
