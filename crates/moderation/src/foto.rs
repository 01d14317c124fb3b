//! Foto-Uploads zu Kommentaren
//!
//! Groesse und MIME-Typ werden geprueft, bevor irgendein Netzwerkaufruf
//! passiert. Jeder Upload bekommt einen eigenen Pfad, damit das Loeschen
//! eines Kommentars nie das Foto eines anderen mitnimmt.

use uuid::Uuid;

use crate::error::{ModerationError, ModerationResult};

/// Maximale Fotogroesse: 5 MiB
pub const MAX_FOTO_BYTES: usize = 5 * 1024 * 1024;

/// Verzeichnis im Objektspeicher fuer Kommentar-Fotos
const FOTO_PRAEFIX: &str = "kommentare";

/// Ein hochzuladendes Foto
#[derive(Debug, Clone)]
pub struct FotoUpload {
    pub dateiname: String,
    pub mime_type: String,
    pub daten: Vec<u8>,
}

impl FotoUpload {
    /// Prueft Groesse und MIME-Typ; gibt den geparsten MIME-Typ zurueck
    pub fn validieren(&self, max_bytes: usize) -> ModerationResult<mime::Mime> {
        if self.daten.is_empty() {
            return Err(ModerationError::UngueltigeEingabe("Foto ist leer".into()));
        }

        if self.daten.len() > max_bytes {
            return Err(ModerationError::FotoZuGross {
                size: self.daten.len(),
                max: max_bytes,
            });
        }

        let mime: mime::Mime = self
            .mime_type
            .parse()
            .map_err(|_| ModerationError::KeinBild(self.mime_type.clone()))?;

        if mime.type_() != mime::IMAGE {
            return Err(ModerationError::KeinBild(self.mime_type.clone()));
        }

        Ok(mime)
    }

    /// Neuer Speicherpfad `kommentare/<uuid>.<endung>`
    pub fn speicherpfad(&self, mime: &mime::Mime) -> String {
        let endung = match mime.subtype().as_str() {
            "jpeg" => "jpg",
            "svg" => "svg",
            andere => andere,
        };

        format!("{FOTO_PRAEFIX}/{}.{endung}", Uuid::new_v4())
    }
}
