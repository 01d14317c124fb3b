//! Datenbankmodelle fuer Blogchat
//!
//! Diese Typen repraesentieren Zeilen der Backend-Tabellen. Sie sind von den
//! Domain-Typen der Fach-Crates getrennt und dienen als reine
//! Datenuebertragungsobjekte. Ihre serde-Form ist gleichzeitig das
//! Zeilenformat im Realtime-Feed.

use blogchat_core::{BenutzerId, KommentarId, NachrichtId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationsname der Chat-Nachrichten (Realtime-Feed)
pub const RELATION_NACHRICHTEN: &str = "nachrichten";
/// Relationsname der Blog-Kommentare (Realtime-Feed)
pub const RELATION_KOMMENTARE: &str = "kommentare";

// ---------------------------------------------------------------------------
// Chat-Nachrichten
// ---------------------------------------------------------------------------

/// Denormalisierte Kopie der Nachricht, auf die geantwortet wird.
///
/// Keine Live-Referenz: wird die Ursprungsnachricht spaeter geloescht, bleibt
/// der Snapshot unveraendert stehen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntwortSnapshot {
    pub id: NachrichtId,
    pub author_name: String,
    pub body_snippet: String,
}

/// Chat-Nachricht-Datensatz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NachrichtRecord {
    pub id: NachrichtId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub reply_to: Option<AntwortSnapshot>,
}

/// Daten zum Erstellen einer neuen Chat-Nachricht
///
/// `id` und `created_at` vergibt das Backend.
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub author_name: &'a str,
    pub body: &'a str,
    pub reply_to: Option<&'a AntwortSnapshot>,
}

// ---------------------------------------------------------------------------
// Blog-Kommentare
// ---------------------------------------------------------------------------

/// Kommentar-Datensatz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KommentarRecord {
    pub id: KommentarId,
    pub post_id: String,
    pub ip_address: String,
    /// Denormalisierter Autorenname (wird beim Umbenennen nachgezogen)
    pub author_name: String,
    pub body: String,
    /// Pfad des angehaengten Fotos im Objektspeicher
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Kommentars
#[derive(Debug, Clone)]
pub struct NeuerKommentar<'a> {
    pub post_id: &'a str,
    pub ip_address: &'a str,
    pub author_name: &'a str,
    pub body: &'a str,
    pub photo_path: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz (genau ein Benutzername pro IP-Adresse)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: BenutzerId,
    pub ip_address: String,
    pub username: String,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub ip_address: &'a str,
    pub username: &'a str,
}
