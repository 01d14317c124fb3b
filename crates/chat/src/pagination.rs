//! Rueckwaerts-Paginierung
//!
//! `load_latest` laedt die neueste Seite, `load_older` jeweils die Seite vor
//! der aeltesten geladenen Nachricht. Aeltere Seiten werden nie parallel
//! geladen: ein zweiter Aufruf waehrend eines laufenden Abrufs kehrt sofort
//! mit `LadeErgebnis::BereitsAktiv` zurueck.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use blogchat_db::{models::NachrichtRecord, NachrichtenRepository};

use crate::error::ChatResult;
use crate::store::MessageStore;
use crate::types::{ChatNachricht, SEITENGROESSE};

/// Grenzen des zusammenhaengend geladenen Bereichs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationWindow {
    pub oldest_loaded_at: Option<DateTime<Utc>>,
    pub newest_loaded_at: Option<DateTime<Utc>>,
    pub has_more_older: bool,
    pub is_loading_more: bool,
}

/// Ergebnis eines Ladeversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadeErgebnis {
    /// Seite abgerufen; `neue` Nachrichten waren noch nicht im Store
    Geladen { abgerufen: usize, neue: usize },
    /// Ein Abruf laeuft bereits, kein weiterer Netzwerkaufruf
    BereitsAktiv,
    /// Es gibt keine aelteren Nachrichten (mehr)
    KeineAelteren,
}

#[derive(Debug)]
pub struct PaginationCursor {
    fenster: Mutex<PaginationWindow>,
    seitengroesse: i64,
}

/// Setzt `is_loading_more` zurueck, auch wenn der Abruf abgebrochen wird
struct LadeSperre<'a> {
    fenster: &'a Mutex<PaginationWindow>,
}

impl Drop for LadeSperre<'_> {
    fn drop(&mut self) {
        self.fenster.lock().is_loading_more = false;
    }
}

impl PaginationCursor {
    pub fn neu(seitengroesse: i64) -> Self {
        Self {
            fenster: Mutex::new(PaginationWindow::default()),
            seitengroesse: seitengroesse.max(1),
        }
    }

    pub fn fenster(&self) -> PaginationWindow {
        self.fenster.lock().clone()
    }

    pub fn seitengroesse(&self) -> i64 {
        self.seitengroesse
    }

    /// Laedt die neuesten Nachrichten
    pub async fn load_latest<R: NachrichtenRepository>(
        &self,
        repo: &R,
        store: &Mutex<MessageStore>,
    ) -> ChatResult<LadeErgebnis> {
        let seite = repo.neueste(self.seitengroesse).await.map_err(|e| {
            tracing::error!(%e, "Neueste Nachrichten konnten nicht geladen werden");
            e
        })?;
        let abgerufen = seite.len();
        let neue = Self::integrieren(seite, store);

        {
            let mut fenster = self.fenster.lock();
            if let Some((aelteste, neueste)) = store.lock().zeitspanne() {
                fenster.oldest_loaded_at = Some(aelteste);
                fenster.newest_loaded_at = Some(neueste);
            }
            fenster.has_more_older = abgerufen as i64 >= self.seitengroesse;
        }

        tracing::info!(abgerufen, neue, "Neueste Nachrichten geladen");
        Ok(LadeErgebnis::Geladen { abgerufen, neue })
    }

    /// Laedt die naechstaeltere Seite
    pub async fn load_older<R: NachrichtenRepository>(
        &self,
        repo: &R,
        store: &Mutex<MessageStore>,
    ) -> ChatResult<LadeErgebnis> {
        let vor = {
            let mut fenster = self.fenster.lock();
            if fenster.is_loading_more {
                tracing::debug!("Aeltere Nachrichten werden bereits geladen");
                return Ok(LadeErgebnis::BereitsAktiv);
            }
            let Some(vor) = fenster.oldest_loaded_at.filter(|_| fenster.has_more_older) else {
                return Ok(LadeErgebnis::KeineAelteren);
            };
            fenster.is_loading_more = true;
            vor
        };
        let _sperre = LadeSperre {
            fenster: &self.fenster,
        };

        let seite = repo.aelter_als(vor, self.seitengroesse).await.map_err(|e| {
            tracing::error!(%e, "Aeltere Nachrichten konnten nicht geladen werden");
            e
        })?;
        let abgerufen = seite.len();
        let neue_aelteste = seite.iter().map(|r| r.created_at).min();
        let neue = Self::integrieren(seite, store);

        {
            let mut fenster = self.fenster.lock();
            if let Some(t) = neue_aelteste {
                fenster.oldest_loaded_at = Some(fenster.oldest_loaded_at.map_or(t, |alt| alt.min(t)));
            }
            fenster.has_more_older = abgerufen as i64 == self.seitengroesse;
        }

        tracing::debug!(abgerufen, neue, bis = %vor, "Aeltere Nachrichten geladen");
        Ok(LadeErgebnis::Geladen { abgerufen, neue })
    }

    /// Eine live eingetroffene Nachricht erweitert den Bereich nach vorne
    pub fn neueste_beobachtet(&self, created_at: DateTime<Utc>) {
        let mut fenster = self.fenster.lock();
        if fenster.newest_loaded_at.map_or(true, |t| created_at > t) {
            fenster.newest_loaded_at = Some(created_at);
        }
        if fenster.oldest_loaded_at.is_none() {
            fenster.oldest_loaded_at = Some(created_at);
        }
    }

    /// Absteigende Seite umdrehen und ueber den Store-Pfad integrieren
    fn integrieren(seite: Vec<NachrichtRecord>, store: &Mutex<MessageStore>) -> usize {
        let aufsteigend: Vec<ChatNachricht> = seite.into_iter().rev().map(Into::into).collect();
        store.lock().prepend(aufsteigend)
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::neu(SEITENGROESSE)
    }
}
