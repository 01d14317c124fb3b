//! blogchat-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die Datenschicht, Chat und
//! Moderation gemeinsam nutzen: ID-Newtypes, das Realtime-Ereignisformat,
//! die Cooldown-Regel, der lokale Schluessel-Wert-Speicher des Geraets und
//! die Uhr-Abstraktion.

pub mod cooldown;
pub mod error;
pub mod event;
pub mod speicher;
pub mod types;
pub mod uhr;

// Re-Exporte fuer bequemen Zugriff
pub use cooldown::Cooldown;
pub use error::{KernFehler, Result};
pub use event::{EreignisTyp, RealtimeEreignis};
pub use speicher::{DateiSpeicher, FluechtigerSpeicher, LokalerSpeicher};
pub use types::{BenutzerId, KommentarId, NachrichtId};
pub use uhr::{FesteUhr, SystemUhr, Uhr};
