//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

use blogchat_db::DbError;
use blogchat_moderation::ModerationError;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    /// Eingehende Nachricht ohne Autor oder Inhalt
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Bitte {verbleibend_secs} Sekunden warten")]
    Abkuehlung { verbleibend_secs: u64 },

    #[error("Es wird bereits eine Nachricht gesendet")]
    SendenAktiv,

    #[error("Kein Anzeigename festgelegt")]
    KeineIdentitaet,

    #[error("Anzeigename ist bereits festgelegt")]
    IdentitaetBereitsFestgelegt,

    #[error(transparent)]
    Moderation(#[from] ModerationError),

    #[error("Backend-Fehler: {0}")]
    Backend(#[from] DbError),
}

impl ChatError {
    /// Vor jedem Netzwerkaufruf abgelehnt, sofort korrigierbar
    pub fn ist_validierung(&self) -> bool {
        match self {
            Self::UngueltigeEingabe(_)
            | Self::UngueltigeNachricht(_)
            | Self::KeineIdentitaet
            | Self::IdentitaetBereitsFestgelegt => true,
            Self::Moderation(e) => e.ist_validierung(),
            _ => false,
        }
    }

    /// Nach kurzer Wartezeit automatisch behoben
    pub fn ist_rate_limit(&self) -> bool {
        match self {
            Self::Abkuehlung { .. } | Self::SendenAktiv => true,
            Self::Moderation(e) => e.ist_rate_limit(),
            _ => false,
        }
    }

    /// Transport-/Backend-Fehler; keine automatische Wiederholung
    pub fn ist_transport(&self) -> bool {
        match self {
            Self::Backend(_) => true,
            Self::Moderation(e) => e.ist_transport(),
            _ => false,
        }
    }

    /// Gesperrter Benutzer
    pub fn ist_gesperrt(&self) -> bool {
        matches!(self, Self::Moderation(ModerationError::Gesperrt { .. }))
    }

    /// Text fuer die Anzeige im Chatfenster
    pub fn benutzer_meldung(&self) -> String {
        match self {
            Self::Moderation(e) => e.benutzer_meldung(),
            Self::Abkuehlung { verbleibend_secs } => {
                format!("Bitte warte noch {verbleibend_secs} Sekunden.")
            }
            Self::SendenAktiv => "Deine Nachricht wird noch gesendet.".to_string(),
            e if e.ist_transport() => {
                "Das hat nicht geklappt. Bitte versuche es erneut.".to_string()
            }
            e => e.to_string(),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomie() {
        assert!(ChatError::UngueltigeEingabe("leer".into()).ist_validierung());
        assert!(ChatError::Abkuehlung { verbleibend_secs: 4 }.ist_rate_limit());
        assert!(ChatError::SendenAktiv.ist_rate_limit());
        assert!(ChatError::Backend(DbError::intern("weg")).ist_transport());
        assert!(ChatError::Moderation(ModerationError::UngueltigeEingabe("x".into()))
            .ist_validierung());

        let gesperrt = ChatError::Moderation(ModerationError::Gesperrt {
            grund: Some("Spam".into()),
            kontakt: "mod@example.org".into(),
        });
        assert!(gesperrt.ist_gesperrt());
        assert!(!gesperrt.ist_transport());
        assert!(gesperrt.benutzer_meldung().contains("mod@example.org"));
    }

    #[test]
    fn transport_meldung_verraet_keine_details() {
        let e = ChatError::Backend(DbError::intern("disk I/O error"));
        assert!(!e.benutzer_meldung().contains("disk"));
    }
}
