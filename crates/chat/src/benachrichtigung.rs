//! System-Benachrichtigungen fuer Nachrichten bei geschlossenem Chat
//!
//! Fire-and-forget: ohne Berechtigung passiert nichts, das ist kein Fehler.

use blogchat_core::NachrichtId;

use crate::types::{textauszug, ChatNachricht};

/// Laenge der Textvorschau in Benachrichtigungen
pub const BENACHRICHTIGUNG_VORSCHAU_ZEICHEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Benachrichtigung {
    pub nachricht_id: NachrichtId,
    pub titel: String,
    pub vorschau: String,
}

impl Benachrichtigung {
    pub fn fuer(nachricht: &ChatNachricht) -> Self {
        Self {
            nachricht_id: nachricht.id,
            titel: nachricht.author_name.clone(),
            vorschau: textauszug(&nachricht.body, BENACHRICHTIGUNG_VORSCHAU_ZEICHEN),
        }
    }
}

/// Kanal fuer System-Benachrichtigungen.
///
/// Ein Klick auf eine Benachrichtigung muss
/// `ChatSessionController::benachrichtigung_geklickt` ausloesen.
pub trait Benachrichtiger: Send + Sync {
    /// Hat der Benutzer Benachrichtigungen erlaubt?
    fn berechtigung(&self) -> bool;

    fn anzeigen(&self, benachrichtigung: &Benachrichtigung);
}

/// Benachrichtigungen abgelehnt oder nicht verfuegbar
#[derive(Debug, Default, Clone, Copy)]
pub struct KeineBenachrichtigung;

impl Benachrichtiger for KeineBenachrichtigung {
    fn berechtigung(&self) -> bool {
        false
    }

    fn anzeigen(&self, _benachrichtigung: &Benachrichtigung) {}
}

/// Schreibt Benachrichtigungen ins Log (Headless-Betrieb)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBenachrichtiger;

impl Benachrichtiger for LogBenachrichtiger {
    fn berechtigung(&self) -> bool {
        true
    }

    fn anzeigen(&self, b: &Benachrichtigung) {
        tracing::info!(
            nachricht_id = %b.nachricht_id,
            autor = %b.titel,
            vorschau = %b.vorschau,
            "Neue Chat-Nachricht"
        );
    }
}
