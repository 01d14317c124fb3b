//! RenderProjector – Store und Antwortzustand auf Anzeigeanweisungen abbilden
//!
//! Reine Funktionen ohne Seiteneffekte. Die UI montiert pro Anweisung eine
//! Nachricht, in der gelieferten Reihenfolge.

use blogchat_core::NachrichtId;

use crate::pagination::PaginationWindow;
use crate::store::MessageStore;
use crate::types::{AntwortSnapshot, ChatNachricht};

/// Abstand zum oberen Rand, ab dem aeltere Nachrichten geladen werden (Pixel)
pub const OBERER_RAND_PX: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderAnweisung {
    pub nachricht: ChatNachricht,
    /// Die zitierte Nachricht ist geladen, ein Klick springt zu ihr
    pub ist_antwort_vorschau_klickbar: bool,
    /// Auf diese Nachricht wird gerade geantwortet
    pub ist_antwortziel: bool,
}

/// Vollstaendig berechnete Anzeige (aufsteigend nach `created_at`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projektion {
    pub anweisungen: Vec<RenderAnweisung>,
    pub antwort: Option<AntwortSnapshot>,
}

impl Projektion {
    pub fn len(&self) -> usize {
        self.anweisungen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anweisungen.is_empty()
    }

    pub fn ids(&self) -> Vec<NachrichtId> {
        self.anweisungen.iter().map(|a| a.nachricht.id).collect()
    }
}

/// Wohin die Ansicht nach einer Aenderung scrollen soll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollZiel {
    /// Ans Ende (eigene Nachricht, Live-Nachricht bei offenem Chat, Oeffnen)
    Unten,
    /// Die bisher aelteste Nachricht bleibt optisch an ihrer Stelle
    Anker(NachrichtId),
}

pub struct RenderProjector;

impl RenderProjector {
    /// Lazy, beliebig oft neu startbare Folge von Anweisungen
    pub fn anweisungen<'a>(
        store: &'a MessageStore,
        antwort: Option<&'a AntwortSnapshot>,
    ) -> impl Iterator<Item = RenderAnweisung> + Clone + 'a {
        store.iter().map(move |n| RenderAnweisung {
            ist_antwort_vorschau_klickbar: n
                .reply_to
                .as_ref()
                .is_some_and(|ziel| store.contains(ziel.id)),
            ist_antwortziel: antwort.is_some_and(|a| a.id == n.id),
            nachricht: n.clone(),
        })
    }

    pub fn projizieren(store: &MessageStore, antwort: Option<&AntwortSnapshot>) -> Projektion {
        Projektion {
            anweisungen: Self::anweisungen(store, antwort).collect(),
            antwort: antwort.cloned(),
        }
    }
}

/// Neuer Scroll-Offset nach dem Voranstellen von Nachrichten der Gesamthoehe
/// `hinzugefuegte_hoehe`
pub fn scroll_nach_prepend(alter_offset: f64, hinzugefuegte_hoehe: f64) -> f64 {
    alter_offset + hinzugefuegte_hoehe.max(0.0)
}

/// Pegelgesteuert: am oberen Rand, es gibt Aeltere, kein Abruf laeuft
pub fn soll_aeltere_laden(scroll_top: f64, fenster: &PaginationWindow) -> bool {
    scroll_top <= OBERER_RAND_PX && fenster.has_more_older && !fenster.is_loading_more
}
