//! Fehlertypen fuer Moderation und Kommentare

use thiserror::Error;

use blogchat_db::DbError;

/// Standard-Kontaktkanal fuer gesperrte Benutzer
pub const STANDARD_KONTAKT: &str = "admin@blogchat.example";

/// Alle moeglichen Fehler in Moderation und Kommentarsystem
#[derive(Debug, Error)]
pub enum ModerationError {
    // --- Validierung ---
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Foto zu gross: {size} Bytes (Maximum: {max} Bytes)")]
    FotoZuGross { size: usize, max: usize },

    #[error("Kein Bild: MIME-Typ '{0}' nicht erlaubt")]
    KeinBild(String),

    // --- Rate-Limit ---
    #[error("Bitte {verbleibend_secs} Sekunden warten")]
    Abkuehlung { verbleibend_secs: u64 },

    #[error("Ein Kommentar wird bereits gesendet")]
    PostenAktiv,

    // --- Moderation ---
    #[error("Benutzer gesperrt: {}", grund.as_deref().unwrap_or("kein Grund angegeben"))]
    Gesperrt { grund: Option<String>, kontakt: String },

    #[error("Kein Anzeigename festgelegt")]
    KeineIdentitaet,

    // --- Ressourcen ---
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    // --- Backend ---
    #[error("Backend-Fehler: {0}")]
    Backend(#[from] DbError),
}

impl ModerationError {
    /// Vor jedem Netzwerkaufruf abgelehnt, sofort korrigierbar
    pub fn ist_validierung(&self) -> bool {
        matches!(
            self,
            Self::UngueltigeEingabe(_) | Self::FotoZuGross { .. } | Self::KeinBild(_)
        )
    }

    /// Nach Ablauf des Cooldowns automatisch behoben
    pub fn ist_rate_limit(&self) -> bool {
        matches!(self, Self::Abkuehlung { .. } | Self::PostenAktiv)
    }

    /// Transport-/Backend-Fehler; der Benutzer muss die Aktion neu ausloesen
    pub fn ist_transport(&self) -> bool {
        matches!(self, Self::Backend(e) if !e.ist_nicht_gefunden())
    }

    /// Text fuer die Anzeige im Formular
    pub fn benutzer_meldung(&self) -> String {
        match self {
            Self::Gesperrt { grund, kontakt } => format!(
                "Du wurdest gesperrt ({}). Kontakt: {kontakt}",
                grund.as_deref().unwrap_or("kein Grund angegeben")
            ),
            Self::Abkuehlung { verbleibend_secs } => {
                format!("Bitte warte noch {verbleibend_secs} Sekunden.")
            }
            e if e.ist_transport() => {
                "Das hat nicht geklappt. Bitte versuche es erneut.".to_string()
            }
            e => e.to_string(),
        }
    }
}

pub type ModerationResult<T> = Result<T, ModerationError>;
