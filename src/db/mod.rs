pub mod entities;
pub mod services;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{error, info};

use crate::db::entities::subscription;

/// Opens the connection pool, verifies it and brings the schema up to date.
/// Run once before the HTTP server starts.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.ping().await.map_err(|e| {
        error!(error = %e, "Database connection check failed.");
        e
    })?;
    info!(backend = ?db.get_database_backend(), "Connected to database.");

    ensure_schema(&db).await?;
    Ok(db)
}

/// Creates the tables and indexes derived from the entities if they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Applying database schema...");
    let mut create_table = schema.create_table_from_entity(subscription::Entity);
    create_table.if_not_exists();
    db.execute(backend.build(&create_table)).await?;

    for mut create_index in schema.create_index_from_entity(subscription::Entity) {
        create_index.if_not_exists();
        db.execute(backend.build(&create_index)).await?;
    }
    info!("Database schema is up to date.");
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_connection() -> DatabaseConnection {
    // A single pooled connection keeps the in-memory database alive for the whole test.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    ensure_schema(&db).await.unwrap();
    db
}
