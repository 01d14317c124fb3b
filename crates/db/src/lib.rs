//! blogchat-db – Datenschicht
//!
//! Dieses Crate beschreibt das gehostete Backend als Satz von
//! Repository-Traits (Tabellen, Realtime-Feed, Objektspeicher) und liefert
//! eine SQLite-Implementierung (`SqliteDb`) sowie einen Disk-Objektspeicher
//! (`DiskStorage`).

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;
pub mod storage;

pub use error::{DbError, DbResult};
pub use repository::{
    Abonnement, BenutzerRepository, DatabaseConfig, KommentarRepository, NachrichtenRepository,
    RealtimeFeed,
};
pub use sqlite::SqliteDb;
pub use storage::{BlobStorage, DiskStorage};
