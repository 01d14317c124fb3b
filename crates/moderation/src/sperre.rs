//! Wer darf schreiben?
//!
//! Eine Regel fuer Chat und Kommentare: ein gesperrter Benutzer wird vor dem
//! Schreiben abgewiesen, mit Sperrgrund und Kontaktkanal. Erstbesucher ohne
//! Benutzer-Datensatz sind nicht gesperrt.

use blogchat_db::{models::BenutzerRecord, BenutzerRepository};

use crate::error::{ModerationError, ModerationResult};

/// Prueft einen bereits geladenen Benutzer
pub fn posting_erlaubt(benutzer: &BenutzerRecord, kontakt: &str) -> ModerationResult<()> {
    if benutzer.is_blocked {
        tracing::warn!(
            benutzer_id = %benutzer.id,
            ip = %benutzer.ip_address,
            "Schreibversuch eines gesperrten Benutzers abgewiesen"
        );
        return Err(ModerationError::Gesperrt {
            grund: benutzer.block_reason.clone(),
            kontakt: kontakt.to_string(),
        });
    }
    Ok(())
}

/// Laedt den Benutzer einer IP und prueft die Sperre.
///
/// Gibt den Datensatz zurueck, `None` fuer Erstbesucher.
pub async fn sperre_pruefen<B: BenutzerRepository>(
    repo: &B,
    ip: &str,
    kontakt: &str,
) -> ModerationResult<Option<BenutzerRecord>> {
    match repo.get_by_ip(ip).await {
        Ok(benutzer) => {
            posting_erlaubt(&benutzer, kontakt)?;
            Ok(Some(benutzer))
        }
        Err(e) if e.ist_nicht_gefunden() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
