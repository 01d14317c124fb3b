//! MessageStore – geladene Nachrichten, aufsteigend nach `created_at`
//!
//! Einziger Integrationspfad fuer Realtime-Inserts, eigene Sendebestaetigungen
//! und aeltere Seiten. Die Reihenfolge ergibt sich immer aus `created_at`,
//! nie aus der Ankunftsreihenfolge; jede `id` kommt hoechstens einmal vor.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use blogchat_core::NachrichtId;

use crate::error::ChatResult;
use crate::types::ChatNachricht;

#[derive(Debug, Default)]
pub struct MessageStore {
    nachrichten: Vec<ChatNachricht>,
    ids: HashSet<NachrichtId>,
}

impl MessageStore {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt eine Nachricht an ihrer zeitlichen Position ein.
    ///
    /// `Ok(true)` wenn neu, `Ok(false)` wenn die `id` schon bekannt war.
    /// Nachrichten ohne Autor oder Inhalt werden abgewiesen.
    pub fn integrate(&mut self, nachricht: ChatNachricht) -> ChatResult<bool> {
        if let Err(e) = nachricht.pruefen() {
            tracing::warn!(%e, "Fehlerhafte Nachricht verworfen");
            return Err(e);
        }

        if self.ids.contains(&nachricht.id) {
            tracing::debug!(nachricht_id = %nachricht.id, "Nachricht bereits vorhanden");
            return Ok(false);
        }

        // Gleiche Zeitstempel: spaeter integrierte Nachricht steht dahinter
        let pos = self
            .nachrichten
            .partition_point(|n| n.created_at <= nachricht.created_at);
        self.ids.insert(nachricht.id);
        self.nachrichten.insert(pos, nachricht);
        Ok(true)
    }

    /// Fuehrt eine aeltere Seite vorne ein; gibt die Anzahl neuer Nachrichten zurueck.
    ///
    /// Ueberlappende Seiten erzeugen keine Duplikate, fehlerhafte Eintraege
    /// werden uebersprungen.
    pub fn prepend(&mut self, seite: Vec<ChatNachricht>) -> usize {
        let mut neu = 0;
        for nachricht in seite {
            if let Ok(true) = self.integrate(nachricht) {
                neu += 1;
            }
        }
        neu
    }

    /// Ersetzt eine vorhandene Nachricht (Realtime-Update)
    pub fn ersetzen(&mut self, nachricht: ChatNachricht) -> ChatResult<bool> {
        nachricht.pruefen()?;
        if !self.ids.contains(&nachricht.id) {
            return Ok(false);
        }
        self.entfernen(nachricht.id);
        self.integrate(nachricht)
    }

    pub fn entfernen(&mut self, id: NachrichtId) -> Option<ChatNachricht> {
        if !self.ids.remove(&id) {
            return None;
        }
        let pos = self.nachrichten.iter().position(|n| n.id == id)?;
        Some(self.nachrichten.remove(pos))
    }

    pub fn count(&self) -> usize {
        self.nachrichten.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nachrichten.is_empty()
    }

    pub fn contains(&self, id: NachrichtId) -> bool {
        self.ids.contains(&id)
    }

    pub fn get(&self, id: NachrichtId) -> Option<&ChatNachricht> {
        if !self.contains(id) {
            return None;
        }
        self.nachrichten.iter().find(|n| n.id == id)
    }

    /// Nachrichten in Anzeigereihenfolge
    pub fn iter(&self) -> std::slice::Iter<'_, ChatNachricht> {
        self.nachrichten.iter()
    }

    pub fn aelteste(&self) -> Option<&ChatNachricht> {
        self.nachrichten.first()
    }

    pub fn neueste(&self) -> Option<&ChatNachricht> {
        self.nachrichten.last()
    }

    /// Zeitspanne der geladenen Nachrichten
    pub fn zeitspanne(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.aelteste()?.created_at, self.neueste()?.created_at))
    }
}
