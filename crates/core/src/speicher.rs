//! Persistenter Schluessel-Wert-Speicher des Geraets
//!
//! Entspricht dem origin-gebundenen Browser-Speicher: ueberlebt einen
//! Reload und haelt den gewaehlten Anzeigenamen sowie die Zeitstempel der
//! letzten Schreibaktionen. Er dient als Rueckfall, solange die
//! IP-basierte Identitaet vom Backend noch nicht geladen ist.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{KernFehler, Result};

/// Schluessel fuer den Anzeigenamen
pub const SCHLUESSEL_NAME: &str = "blogchat.name";
/// Schluessel fuer den Zeitpunkt der letzten Chat-Nachricht (RFC 3339)
pub const SCHLUESSEL_LETZTE_NACHRICHT: &str = "blogchat.chat.letzte_nachricht";
/// Schluessel fuer den Zeitpunkt des letzten Kommentars (RFC 3339)
pub const SCHLUESSEL_LETZTER_KOMMENTAR: &str = "blogchat.kommentare.letzter_kommentar";

/// Synchroner Schluessel-Wert-Speicher
pub trait LokalerSpeicher: Send + Sync {
    fn lesen(&self, schluessel: &str) -> Option<String>;

    fn schreiben(&self, schluessel: &str, wert: &str) -> Result<()>;

    fn entfernen(&self, schluessel: &str) -> Result<()>;
}

/// Nur im Speicher gehaltene Variante (Tests, privater Modus)
#[derive(Debug, Default)]
pub struct FluechtigerSpeicher {
    werte: Mutex<BTreeMap<String, String>>,
}

impl FluechtigerSpeicher {
    pub fn neu() -> Self {
        Self::default()
    }
}

impl LokalerSpeicher for FluechtigerSpeicher {
    fn lesen(&self, schluessel: &str) -> Option<String> {
        self.werte.lock().get(schluessel).cloned()
    }

    fn schreiben(&self, schluessel: &str, wert: &str) -> Result<()> {
        self.werte
            .lock()
            .insert(schluessel.to_string(), wert.to_string());
        Ok(())
    }

    fn entfernen(&self, schluessel: &str) -> Result<()> {
        self.werte.lock().remove(schluessel);
        Ok(())
    }
}

/// Als JSON-Datei persistierte Variante
///
/// Die Datei wird beim Oeffnen einmal gelesen und nach jeder Aenderung
/// komplett neu geschrieben.
#[derive(Debug)]
pub struct DateiSpeicher {
    pfad: PathBuf,
    werte: Mutex<BTreeMap<String, String>>,
}

impl DateiSpeicher {
    /// Oeffnet den Speicher; eine fehlende Datei ergibt einen leeren Speicher
    pub fn oeffnen(pfad: impl Into<PathBuf>) -> Result<Self> {
        let pfad = pfad.into();
        let werte = match std::fs::read_to_string(&pfad) {
            Ok(inhalt) => serde_json::from_str(&inhalt).map_err(|e| {
                KernFehler::Speicher(format!("'{}' ist kein gueltiges JSON: {e}", pfad.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(KernFehler::Speicher(format!(
                    "'{}' nicht lesbar: {e}",
                    pfad.display()
                )))
            }
        };

        Ok(Self {
            pfad,
            werte: Mutex::new(werte),
        })
    }

    /// Schreibt in eine Temp-Datei im selben Verzeichnis und ersetzt die
    /// alte Datei erst danach; ein Abbruch laesst den alten Stand lesbar
    fn sichern(&self, werte: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(werte)
            .map_err(|e| KernFehler::Speicher(e.to_string()))?;
        let verzeichnis = match self.pfad.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(verzeichnis).map_err(|e| KernFehler::Speicher(e.to_string()))?;

        let nicht_schreibbar = |e: std::io::Error| {
            KernFehler::Speicher(format!("'{}' nicht schreibbar: {e}", self.pfad.display()))
        };
        let mut temp = tempfile::NamedTempFile::new_in(verzeichnis).map_err(nicht_schreibbar)?;
        temp.write_all(json.as_bytes()).map_err(nicht_schreibbar)?;
        temp.as_file().sync_all().map_err(nicht_schreibbar)?;
        temp.persist(&self.pfad).map_err(|e| nicht_schreibbar(e.error))?;
        Ok(())
    }
}

impl LokalerSpeicher for DateiSpeicher {
    fn lesen(&self, schluessel: &str) -> Option<String> {
        self.werte.lock().get(schluessel).cloned()
    }

    fn schreiben(&self, schluessel: &str, wert: &str) -> Result<()> {
        let mut werte = self.werte.lock();
        werte.insert(schluessel.to_string(), wert.to_string());
        self.sichern(&werte)?;
        tracing::trace!(schluessel, "Lokaler Speicher aktualisiert");
        Ok(())
    }

    fn entfernen(&self, schluessel: &str) -> Result<()> {
        let mut werte = self.werte.lock();
        if werte.remove(schluessel).is_some() {
            self.sichern(&werte)?;
        }
        Ok(())
    }
}
