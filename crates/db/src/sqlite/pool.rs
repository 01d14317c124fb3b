//! SQLite Connection Pool mit WAL-Modus

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::Mutex;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::DbError;
use crate::repository::DatabaseConfig;
use crate::sqlite::realtime::RealtimeVerteiler;

/// Wrapper um den SQLite Connection Pool
///
/// Clone teilt Pool, Realtime-Verteiler und Zeitstempel-Quelle.
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
    pub(crate) verteiler: Arc<RealtimeVerteiler>,
    letzter_zeitstempel: Arc<Mutex<DateTime<Utc>>>,
}

impl SqliteDb {
    /// Erstellt einen neuen Pool, fuehrt Migrationen aus
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "SQLite-Pool geoeffnet");

        let db = Self::aus_pool(pool);
        db.migrationen_ausfuehren().await?;

        Ok(db)
    }

    /// Erstellt eine In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // In-Memory benoetigt mindestens 1 persistente Verbindung
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self::aus_pool(pool);
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    fn aus_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            verteiler: Arc::new(RealtimeVerteiler::neu()),
            letzter_zeitstempel: Arc::new(Mutex::new(DateTime::<Utc>::MIN_UTC)),
        }
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serverseitiger Zeitstempel mit Mikrosekunden-Aufloesung.
    ///
    /// Streng monoton innerhalb dieses Backends, damit Paginierungs-Cursor
    /// (`created_at < x`) keine Zeilen mit gleichem Zeitstempel verschlucken.
    pub(crate) fn zeitstempel(&self) -> DateTime<Utc> {
        let jetzt = Utc::now().trunc_subsecs(6);
        let mut letzter = self.letzter_zeitstempel.lock();
        let neu = if jetzt > *letzter {
            jetzt
        } else {
            *letzter + Duration::microseconds(1)
        };
        *letzter = neu;
        neu
    }
}
