//! Oeffentliche Typen fuer den Chat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use blogchat_core::{Cooldown, NachrichtId};
use blogchat_db::models::NachrichtRecord;
use blogchat_moderation::STANDARD_KONTAKT;

use crate::error::{ChatError, ChatResult};

pub use blogchat_db::models::AntwortSnapshot;

/// Seitengroesse fuer neueste und aeltere Nachrichten
pub const SEITENGROESSE: i64 = 99;
/// Maximale Laenge einer Nachricht in Zeichen
pub const MAX_NACHRICHTENLAENGE: usize = 500;
/// Laenge des Textauszugs in Antwort-Snapshots
pub const ANTWORT_VORSCHAU_ZEICHEN: usize = 50;

/// Eine Chat-Nachricht (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatNachricht {
    pub id: NachrichtId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub reply_to: Option<AntwortSnapshot>,
}

impl ChatNachricht {
    /// Baut eine Nachricht aus einer Zeile des Realtime-Feeds
    pub fn aus_zeile(zeile: &serde_json::Value) -> ChatResult<Self> {
        let record: NachrichtRecord = serde_json::from_value(zeile.clone())
            .map_err(|e| ChatError::UngueltigeNachricht(e.to_string()))?;
        let nachricht = Self::from(record);
        nachricht.pruefen()?;
        Ok(nachricht)
    }

    /// Autor und Inhalt muessen vorhanden sein
    pub fn pruefen(&self) -> ChatResult<()> {
        if self.author_name.trim().is_empty() {
            return Err(ChatError::UngueltigeNachricht(format!(
                "Nachricht {} ohne Autor",
                self.id
            )));
        }
        if self.body.trim().is_empty() {
            return Err(ChatError::UngueltigeNachricht(format!(
                "Nachricht {} ohne Inhalt",
                self.id
            )));
        }
        Ok(())
    }

    /// Unveraenderliche Kopie fuer eine Antwort
    pub fn antwort_snapshot(&self, vorschau_zeichen: usize) -> AntwortSnapshot {
        AntwortSnapshot {
            id: self.id,
            author_name: self.author_name.clone(),
            body_snippet: textauszug(&self.body, vorschau_zeichen),
        }
    }
}

impl From<NachrichtRecord> for ChatNachricht {
    fn from(r: NachrichtRecord) -> Self {
        Self {
            id: r.id,
            author_name: r.author_name,
            body: r.body,
            created_at: r.created_at,
            reply_to: r.reply_to,
        }
    }
}

/// Getrimmter Text, nach `max_zeichen` Zeichen mit "..." abgeschnitten
pub fn textauszug(text: &str, max_zeichen: usize) -> String {
    let text = text.trim();
    let mut zeichen = text.chars();
    let auszug: String = zeichen.by_ref().take(max_zeichen).collect();
    if zeichen.next().is_some() {
        format!("{auszug}...")
    } else {
        auszug
    }
}

/// Einstellungen einer Chat-Sitzung
#[derive(Debug, Clone)]
pub struct ChatKonfig {
    pub cooldown: Cooldown,
    pub seitengroesse: i64,
    pub max_nachrichtenlaenge: usize,
    pub antwort_vorschau_zeichen: usize,
    /// Kontaktkanal, der gesperrten Benutzern angezeigt wird
    pub kontakt: String,
}

impl Default for ChatKonfig {
    fn default() -> Self {
        Self {
            cooldown: Cooldown::default(),
            seitengroesse: SEITENGROESSE,
            max_nachrichtenlaenge: MAX_NACHRICHTENLAENGE,
            antwort_vorschau_zeichen: ANTWORT_VORSCHAU_ZEICHEN,
            kontakt: STANDARD_KONTAKT.to_string(),
        }
    }
}
