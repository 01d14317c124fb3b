//! Zeitquelle
//!
//! Cooldowns und Zeitstempel laufen ueber `Uhr`, damit Tests die Zeit
//! deterministisch vorstellen koennen.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Liefert die aktuelle Zeit
pub trait Uhr: Send + Sync {
    fn jetzt(&self) -> DateTime<Utc>;
}

/// Systemuhr (Produktivbetrieb)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUhr;

impl Uhr for SystemUhr {
    fn jetzt(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manuell gestellte Uhr fuer Tests und Simulationen
#[derive(Debug)]
pub struct FesteUhr {
    zeit: Mutex<DateTime<Utc>>,
}

impl FesteUhr {
    pub fn neu(start: DateTime<Utc>) -> Self {
        Self {
            zeit: Mutex::new(start),
        }
    }

    /// Stellt die Uhr um `dauer` vor
    pub fn vorstellen(&self, dauer: Duration) {
        let mut zeit = self.zeit.lock();
        *zeit += dauer;
    }

    pub fn stellen(&self, neu: DateTime<Utc>) {
        *self.zeit.lock() = neu;
    }
}

impl Uhr for FesteUhr {
    fn jetzt(&self) -> DateTime<Utc> {
        *self.zeit.lock()
    }
}
