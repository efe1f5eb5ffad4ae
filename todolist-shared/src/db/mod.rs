/// Database plumbing for the PostgreSQL store
///
/// # Modules
///
/// - `pool`: Connection pool creation, health checks and shutdown
/// - `migrations`: Embedded schema migrations
///
/// # Example
///
/// ```no_run
/// use todolist_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
