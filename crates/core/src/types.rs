//! Gemeinsame Identifikationstypen fuer Blogchat
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Nachrichten-, Kommentar- und Benutzer-IDs zur Compilezeit auszuschliessen.
//! Die IDs werden vom Backend vergeben und sind fuer den Client opak.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::KernFehler;

fn uuid_parsen(s: &str) -> Result<Uuid, KernFehler> {
    Uuid::parse_str(s).map_err(|e| KernFehler::UngueltigeId {
        wert: s.to_string(),
        grund: e.to_string(),
    })
}

/// Eindeutige Chat-Nachrichten-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NachrichtId(pub Uuid);

impl NachrichtId {
    /// Erstellt eine neue zufaellige NachrichtId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for NachrichtId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NachrichtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NachrichtId {
    type Err = KernFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid_parsen(s).map(Self)
    }
}

/// Eindeutige Kommentar-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KommentarId(pub Uuid);

impl KommentarId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for KommentarId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for KommentarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KommentarId {
    type Err = KernFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid_parsen(s).map(Self)
    }
}

/// Eindeutige Benutzer-ID (Zeile in der `benutzer`-Tabelle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenutzerId(pub Uuid);

impl BenutzerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for BenutzerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BenutzerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BenutzerId {
    type Err = KernFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid_parsen(s).map(Self)
    }
}
