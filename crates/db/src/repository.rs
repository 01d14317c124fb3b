//! Repository-Trait-Definitionen
//!
//! Die Traits beschreiben den Vertrag des gehosteten Backends (Tabellen,
//! Realtime-Feed) als Black Box. Fach-Crates programmieren ausschliesslich
//! gegen diese Traits; `SqliteDb` ist die mitgelieferte Implementierung.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use blogchat_core::{BenutzerId, KommentarId, NachrichtId, RealtimeEreignis};

use crate::error::DbResult;
use crate::models::{
    BenutzerRecord, KommentarRecord, NachrichtRecord, NeueNachricht, NeuerBenutzer,
    NeuerKommentar,
};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://blogchat.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://blogchat.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Zugriff auf die Chat-Nachrichten-Tabelle
#[allow(async_fn_in_trait)]
pub trait NachrichtenRepository: Send + Sync {
    /// Fuegt eine Nachricht ein; das Backend vergibt `id` und `created_at`
    async fn insert(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Die neuesten `limit` Nachrichten, absteigend nach `created_at`
    async fn neueste(&self, limit: i64) -> DbResult<Vec<NachrichtRecord>>;

    /// Nachrichten mit `created_at < vor`, absteigend, hoechstens `limit`
    async fn aelter_als(&self, vor: DateTime<Utc>, limit: i64) -> DbResult<Vec<NachrichtRecord>>;

    /// Loescht eine Nachricht; `false` wenn sie nicht existierte
    async fn delete(&self, id: NachrichtId) -> DbResult<bool>;

    async fn count(&self) -> DbResult<i64>;
}

/// Zugriff auf die Kommentar-Tabelle des Blogs
#[allow(async_fn_in_trait)]
pub trait KommentarRepository: Send + Sync {
    /// Fuegt einen Kommentar ein; ohne Benutzer zur IP `NichtGefunden`
    async fn insert(&self, data: NeuerKommentar<'_>) -> DbResult<KommentarRecord>;

    async fn get(&self, id: KommentarId) -> DbResult<Option<KommentarRecord>>;

    /// Kommentare eines Beitrags, aufsteigend nach `created_at`
    async fn list_by_post(&self, post_id: &str) -> DbResult<Vec<KommentarRecord>>;

    /// Alle Kommentare einer IP-Adresse, aufsteigend nach `created_at`
    async fn list_by_ip(&self, ip: &str) -> DbResult<Vec<KommentarRecord>>;

    async fn delete(&self, id: KommentarId) -> DbResult<bool>;

    /// Loescht alle Kommentare einer IP-Adresse in einer Anweisung und gibt
    /// genau die geloeschten Zeilen zurueck
    async fn delete_by_ip(&self, ip: &str) -> DbResult<Vec<KommentarRecord>>;

    /// Setzt den denormalisierten Autorennamen aller Kommentare einer IP
    async fn update_author_by_ip(&self, ip: &str, author_name: &str) -> DbResult<u64>;

    async fn count_by_ip(&self, ip: &str) -> DbResult<i64>;
}

/// Zugriff auf die Benutzer-Tabelle (IP-basiert)
#[allow(async_fn_in_trait)]
pub trait BenutzerRepository: Send + Sync {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer; `DbError::NichtGefunden` wenn er nicht existiert
    async fn get(&self, id: BenutzerId) -> DbResult<BenutzerRecord>;

    /// Laedt den Benutzer einer IP; `DbError::NichtGefunden` fuer Erstbesucher
    async fn get_by_ip(&self, ip: &str) -> DbResult<BenutzerRecord>;

    /// Setzt oder loescht die Sperre eines Benutzers
    async fn update_block(
        &self,
        id: BenutzerId,
        is_blocked: bool,
        reason: Option<&str>,
    ) -> DbResult<BenutzerRecord>;

    async fn rename(&self, id: BenutzerId, username: &str) -> DbResult<BenutzerRecord>;

    async fn delete(&self, id: BenutzerId) -> DbResult<bool>;
}

/// Ein aktives Realtime-Abonnement auf eine Relation
#[derive(Debug)]
pub struct Abonnement {
    pub id: Uuid,
    pub relation: String,
    /// Liefert Ereignisse bis das Abonnement beendet wird (dann `None`)
    pub empfaenger: mpsc::UnboundedReceiver<RealtimeEreignis>,
}

/// Publish/Subscribe-Kanal fuer Zeilenaenderungen
#[allow(async_fn_in_trait)]
pub trait RealtimeFeed: Send + Sync {
    /// Abonniert INSERT/UPDATE/DELETE-Ereignisse einer Relation
    async fn subscribe(&self, relation: &str) -> DbResult<Abonnement>;

    /// Beendet ein Abonnement und gibt die serverseitigen Ressourcen frei.
    ///
    /// Gibt `false` zurueck wenn das Abonnement nicht (mehr) existierte.
    async fn unsubscribe(&self, abo_id: Uuid) -> DbResult<bool>;
}
