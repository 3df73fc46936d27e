use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection};
use std::path::Path;
use std::time::Duration;

/// Handle to the directory's relational store. Constructed once and passed
/// to the services that need it.
pub struct Database {
    pub(crate) conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Self::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        log::info!("Database ready at: {}", path.display());
        Ok(db)
    }

    /// Connect with the given options, enable foreign keys and run pending
    /// migrations.
    pub async fn connect(opt: ConnectOptions) -> Result<Self> {
        let conn = SeaDatabase::connect(opt)
            .await
            .context("Failed to connect to database")?;

        // Show references rely on the store enforcing foreign keys
        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .context("Failed to enable foreign keys")?;

        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to run database migrations")?;

        Ok(Database { conn })
    }
}
