//! Fehlertypen fuer blogchat-core
//!
//! Die Fach-Crates definieren eigene Fehler und konvertieren diesen via `#[from]`.

use thiserror::Error;

/// Result-Alias fuer blogchat-core
pub type Result<T> = std::result::Result<T, KernFehler>;

/// Fehler der gemeinsamen Bausteine
#[derive(Debug, Error)]
pub enum KernFehler {
    #[error("Ungueltige ID '{wert}': {grund}")]
    UngueltigeId { wert: String, grund: String },

    #[error("Unbekannter Ereignistyp: {0}")]
    UnbekannterEreignisTyp(String),

    #[error("Lokaler Speicher nicht verfuegbar: {0}")]
    Speicher(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = KernFehler::UnbekannterEreignisTyp("TRUNCATE".into());
        assert_eq!(e.to_string(), "Unbekannter Ereignistyp: TRUNCATE");
    }
}
