//! Cooldown zwischen zwei Schreibaktionen derselben Art
//!
//! Anders als ein Token-Bucket erlaubt der Cooldown keinen Burst: zwischen
//! zwei akzeptierten Aktionen muss mindestens `dauer` vergangen sein.
//! Chat-Nachrichten und Kommentare fuehren getrennte Zeitstempel.

use chrono::{DateTime, Duration, Utc};

/// Standard-Cooldown fuer Chat und Kommentare: 10 Sekunden
pub const STANDARD_COOLDOWN_SECS: i64 = 10;

/// Mindestabstand zwischen zwei Schreibaktionen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    dauer: Duration,
}

impl Cooldown {
    pub fn neu(dauer: Duration) -> Self {
        Self { dauer }
    }

    pub fn sekunden(secs: i64) -> Self {
        Self::neu(Duration::seconds(secs))
    }

    pub fn dauer(&self) -> Duration {
        self.dauer
    }

    /// Prueft ob eine Aktion zum Zeitpunkt `jetzt` erlaubt ist.
    ///
    /// Gibt `Ok(())` zurueck wenn erlaubt, sonst `Err(verbleibende_secs)`
    /// (aufgerundet, mindestens 1, hoechstens `dauer`).
    pub fn pruefen(&self, letzte: Option<DateTime<Utc>>, jetzt: DateTime<Utc>) -> Result<(), u64> {
        let Some(letzte) = letzte else {
            return Ok(());
        };

        let vergangen = jetzt - letzte;
        if vergangen >= self.dauer {
            return Ok(());
        }

        // Zeitstempel aus der Zukunft (Uhr zurueckgestellt) sperren nie laenger als `dauer`
        let fehlend = (self.dauer - vergangen).min(self.dauer);
        let fehlend_ms = fehlend.num_milliseconds().max(0);
        let secs = (fehlend_ms + 999) / 1000;
        Err(secs.max(1) as u64)
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::sekunden(STANDARD_COOLDOWN_SECS)
    }
}
