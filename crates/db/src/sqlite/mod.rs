//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod benutzer;
pub mod kommentare;
pub mod nachrichten;
pub mod pool;
pub mod realtime;

pub use pool::SqliteDb;
pub use realtime::RealtimeVerteiler;

use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

/// Festes, lexikografisch sortierbares Zeitformat fuer TEXT-Spalten
pub(crate) fn zeit_formatieren(zeit: &DateTime<Utc>) -> String {
    zeit.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub(crate) fn zeit_parsen(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige Zeitangabe '{s}': {e}")))
}

pub(crate) fn id_parsen<T>(s: &str) -> DbResult<T>
where
    T: std::str::FromStr<Err = blogchat_core::KernFehler>,
{
    s.parse::<T>().map_err(|e| DbError::intern(e.to_string()))
}
