//! Realtime-Ereignisse des Backends
//!
//! Das Backend meldet jede Zeilenaenderung einer beobachteten Relation als
//! `{eventType, new, old?}`. Die Zeilen bleiben hier untypisiert (JSON), erst
//! der Empfaenger deserialisiert sie in seinen Domain-Typ und verwirft
//! unvollstaendige Zeilen.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::KernFehler;

/// Art der Zeilenaenderung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EreignisTyp {
    Insert,
    Update,
    Delete,
}

impl EreignisTyp {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for EreignisTyp {
    type Err = KernFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(KernFehler::UnbekannterEreignisTyp(other.to_string())),
        }
    }
}

impl std::fmt::Display for EreignisTyp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Eine Zeilenaenderung auf einer beobachteten Relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEreignis {
    /// Name der Relation (Tabelle), z.B. "nachrichten"
    pub relation: String,
    #[serde(rename = "eventType")]
    pub ereignis_typ: EreignisTyp,
    /// Neue Zeile (bei INSERT/UPDATE)
    #[serde(rename = "new")]
    pub neu: Option<Value>,
    /// Alte Zeile (bei UPDATE/DELETE, ggf. nur Primaerschluessel)
    #[serde(rename = "old")]
    pub alt: Option<Value>,
}

impl RealtimeEreignis {
    pub fn insert(relation: impl Into<String>, neu: Value) -> Self {
        Self {
            relation: relation.into(),
            ereignis_typ: EreignisTyp::Insert,
            neu: Some(neu),
            alt: None,
        }
    }

    pub fn update(relation: impl Into<String>, neu: Value, alt: Option<Value>) -> Self {
        Self {
            relation: relation.into(),
            ereignis_typ: EreignisTyp::Update,
            neu: Some(neu),
            alt,
        }
    }

    pub fn delete(relation: impl Into<String>, alt: Value) -> Self {
        Self {
            relation: relation.into(),
            ereignis_typ: EreignisTyp::Delete,
            neu: None,
            alt: Some(alt),
        }
    }
}
