//! ChatSessionController – Lebenszyklus einer Chat-Sitzung
//!
//! Eine Instanz pro geoeffneter Seite. Der Controller besitzt den
//! `ChatSession`-Zustand, den MessageStore und die Paginierung und buendelt
//! alle Benutzeraktionen: oeffnen, schliessen, Namen festlegen, senden,
//! antworten, aeltere Nachrichten laden.
//!
//! Zustandsuebergaenge:
//!
//! ```text
//! Geschlossen --open()--> Offen                 (Name bekannt)
//! Geschlossen --open()--> NamensAbfrage --identitaet_festlegen()--> Offen
//! Offen / NamensAbfrage --close()--> Geschlossen
//! ```
//!
//! Das Realtime-Abonnement lebt von `starten` bis `beenden`, unabhaengig
//! davon ob das Fenster offen ist; bei geschlossenem Fenster zaehlt es
//! ungelesene Nachrichten.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use blogchat_core::{
    speicher::{SCHLUESSEL_LETZTE_NACHRICHT, SCHLUESSEL_NAME},
    EreignisTyp, LokalerSpeicher, NachrichtId, RealtimeEreignis, Uhr,
};
use blogchat_db::{
    models::{NeueNachricht, NeuerBenutzer, RELATION_NACHRICHTEN},
    BenutzerRepository, NachrichtenRepository, RealtimeFeed,
};
use blogchat_moderation::{name_validieren, sperre_pruefen};

use crate::benachrichtigung::{Benachrichtiger, Benachrichtigung};
use crate::error::{ChatError, ChatResult};
use crate::pagination::{LadeErgebnis, PaginationCursor, PaginationWindow};
use crate::realtime::{AboZustand, EreignisSenke, RealtimeSubscriptionManager};
use crate::render::{soll_aeltere_laden, Projektion, RenderProjector, ScrollZiel};
use crate::store::MessageStore;
use crate::types::{AntwortSnapshot, ChatKonfig, ChatNachricht};

/// Sichtbarer Zustand des Chatfensters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Ansicht {
    #[default]
    Geschlossen,
    /// Oeffnen wartet auf einen Anzeigenamen
    NamensAbfrage,
    Offen,
}

/// Zustand einer Chat-Sitzung (pro Seitenaufruf)
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSession {
    pub identity: Option<String>,
    pub ansicht: Ansicht,
    pub unread_count: u32,
    pub last_send_at: Option<DateTime<Utc>>,
    pub pending_reply: Option<AntwortSnapshot>,
    /// `load_latest` lief bereits erfolgreich an
    pub erstes_oeffnen_erfolgt: bool,
    #[serde(skip)]
    pub scroll_anforderung: Option<ScrollZiel>,
}

impl ChatSession {
    pub fn is_open(&self) -> bool {
        self.ansicht == Ansicht::Offen
    }
}

/// Ergebnis von `open()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OeffnenErgebnis {
    Geoeffnet,
    /// Erst Namen erfassen, dann `identitaet_festlegen`
    NameErforderlich,
}

/// Gemeinsamer Zustand von Controller und Realtime-Task
struct SitzungsKern {
    sitzung: Mutex<ChatSession>,
    store: Mutex<MessageStore>,
    cursor: PaginationCursor,
    benachrichtiger: Arc<dyn Benachrichtiger>,
}

impl SitzungsKern {
    fn realtime_ereignis(&self, ereignis: RealtimeEreignis) {
        if ereignis.relation != RELATION_NACHRICHTEN {
            return;
        }

        match ereignis.ereignis_typ {
            EreignisTyp::Insert => self.live_insert(ereignis.neu.as_ref()),
            EreignisTyp::Update => self.live_update(ereignis.neu.as_ref()),
            EreignisTyp::Delete => self.live_delete(ereignis.alt.as_ref()),
        }
    }

    fn live_insert(&self, zeile: Option<&serde_json::Value>) {
        let nachricht = match zeile.map(ChatNachricht::aus_zeile) {
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                tracing::warn!(%e, "Realtime-Insert verworfen");
                return;
            }
            None => {
                tracing::warn!("Realtime-Insert ohne Zeile");
                return;
            }
        };

        let created_at = nachricht.created_at;
        let benachrichtigung = Benachrichtigung::fuer(&nachricht);

        let neu = match self.store.lock().integrate(nachricht) {
            Ok(neu) => neu,
            Err(_) => return,
        };
        if !neu {
            return;
        }
        self.cursor.neueste_beobachtet(created_at);

        let offen = {
            let mut sitzung = self.sitzung.lock();
            if sitzung.is_open() {
                sitzung.scroll_anforderung = Some(ScrollZiel::Unten);
                true
            } else {
                sitzung.unread_count += 1;
                false
            }
        };

        if !offen {
            if self.benachrichtiger.berechtigung() {
                self.benachrichtiger.anzeigen(&benachrichtigung);
            } else {
                tracing::debug!("Keine Berechtigung fuer Benachrichtigungen");
            }
        }
    }

    fn live_update(&self, zeile: Option<&serde_json::Value>) {
        let Some(Ok(nachricht)) = zeile.map(ChatNachricht::aus_zeile) else {
            tracing::warn!("Realtime-Update verworfen");
            return;
        };
        if let Err(e) = self.store.lock().ersetzen(nachricht) {
            tracing::warn!(%e, "Realtime-Update verworfen");
        }
    }

    fn live_delete(&self, zeile: Option<&serde_json::Value>) {
        let id = zeile
            .and_then(|z| z.get("id"))
            .and_then(|id| id.as_str())
            .and_then(|id| id.parse::<NachrichtId>().ok());
        let Some(id) = id else {
            tracing::warn!("Realtime-Delete ohne gueltige id");
            return;
        };
        if self.store.lock().entfernen(id).is_some() {
            tracing::debug!(nachricht_id = %id, "Nachricht entfernt");
        }
    }
}

impl EreignisSenke for SitzungsKern {
    fn ereignis(&self, ereignis: RealtimeEreignis) {
        self.realtime_ereignis(ereignis);
    }
}

/// Setzt `sende_laeuft` zurueck, auch wenn das Senden abgebrochen wird
struct SendeSperre<'a>(&'a Mutex<bool>);

impl Drop for SendeSperre<'_> {
    fn drop(&mut self) {
        *self.0.lock() = false;
    }
}

/// Steuert eine Chat-Sitzung
pub struct ChatSessionController<D>
where
    D: NachrichtenRepository + BenutzerRepository + RealtimeFeed + 'static,
{
    backend: Arc<D>,
    kern: Arc<SitzungsKern>,
    realtime: RealtimeSubscriptionManager<D>,
    speicher: Arc<dyn LokalerSpeicher>,
    uhr: Arc<dyn Uhr>,
    konfig: ChatKonfig,
    ip: String,
    sende_laeuft: Mutex<bool>,
}

impl<D> ChatSessionController<D>
where
    D: NachrichtenRepository + BenutzerRepository + RealtimeFeed + 'static,
{
    /// Erstellt die Sitzung; Name und letzter Sendezeitpunkt kommen
    /// vorlaeufig aus dem lokalen Speicher
    pub fn neu(
        backend: Arc<D>,
        speicher: Arc<dyn LokalerSpeicher>,
        uhr: Arc<dyn Uhr>,
        benachrichtiger: Arc<dyn Benachrichtiger>,
        konfig: ChatKonfig,
        ip: impl Into<String>,
    ) -> Arc<Self> {
        let sitzung = ChatSession {
            identity: speicher.lesen(SCHLUESSEL_NAME),
            last_send_at: speicher
                .lesen(SCHLUESSEL_LETZTE_NACHRICHT)
                .and_then(|wert| DateTime::parse_from_rfc3339(&wert).ok())
                .map(|t| t.with_timezone(&Utc)),
            ..Default::default()
        };

        let kern = Arc::new(SitzungsKern {
            sitzung: Mutex::new(sitzung),
            store: Mutex::new(MessageStore::neu()),
            cursor: PaginationCursor::neu(konfig.seitengroesse),
            benachrichtiger,
        });

        Arc::new(Self {
            realtime: RealtimeSubscriptionManager::neu(backend.clone(), RELATION_NACHRICHTEN),
            backend,
            kern,
            speicher,
            uhr,
            konfig,
            ip: ip.into(),
            sende_laeuft: Mutex::new(false),
        })
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Seitenaufruf: Identitaet aufloesen und Realtime abonnieren
    pub async fn starten(&self) -> ChatResult<()> {
        self.identitaet_aufloesen().await;
        self.realtime.subscribe(self.kern.clone()).await
    }

    /// Seite wird verlassen: Abonnement freigeben
    pub async fn beenden(&self) {
        self.realtime.teardown().await;
        tracing::info!(ip = %self.ip, "Chat-Sitzung beendet");
    }

    pub fn abo_zustand(&self) -> AboZustand {
        self.realtime.zustand()
    }

    // -----------------------------------------------------------------------
    // Identitaet
    // -----------------------------------------------------------------------

    /// Laedt den Benutzer dieser IP.
    ///
    /// Schlaegt die Abfrage fehl, bleibt der Name aus dem lokalen Speicher
    /// stehen. Existiert kein Benutzer, gilt das Geraet als unbekannt.
    pub async fn identitaet_aufloesen(&self) -> Option<String> {
        match self.backend.get_by_ip(&self.ip).await {
            Ok(benutzer) => {
                self.identitaet_setzen(&benutzer.username);
                Some(benutzer.username)
            }
            Err(e) if e.ist_nicht_gefunden() => {
                let verworfen = self.kern.sitzung.lock().identity.take();
                if verworfen.is_some() {
                    tracing::info!(ip = %self.ip, "Kein Benutzer zur IP, lokaler Name verworfen");
                    if let Err(e) = self.speicher.entfernen(SCHLUESSEL_NAME) {
                        tracing::warn!(%e, "Lokaler Name konnte nicht entfernt werden");
                    }
                }
                None
            }
            Err(e) => {
                tracing::warn!(%e, ip = %self.ip, "Identitaet nicht abrufbar, lokaler Name bleibt");
                self.identitaet()
            }
        }
    }

    /// Legt den Anzeigenamen dieses Geraets fest und setzt ein
    /// unterbrochenes `open()` fort
    pub async fn identitaet_festlegen(&self, name: &str) -> ChatResult<String> {
        if self.kern.sitzung.lock().identity.is_some() {
            return Err(ChatError::IdentitaetBereitsFestgelegt);
        }
        let name = name_validieren(name)?;

        let benutzer = match self.backend.get_by_ip(&self.ip).await {
            Ok(vorhanden) => vorhanden,
            Err(e) if e.ist_nicht_gefunden() => {
                let neu = NeuerBenutzer {
                    ip_address: &self.ip,
                    username: name,
                };
                match self.backend.create(neu).await {
                    Ok(benutzer) => benutzer,
                    // parallel von einem anderen Tab angelegt
                    Err(e) if e.ist_eindeutigkeit() => self.backend.get_by_ip(&self.ip).await?,
                    Err(e) => {
                        tracing::error!(%e, "Benutzer konnte nicht angelegt werden");
                        return Err(e.into());
                    }
                }
            }
            Err(e) => {
                tracing::error!(%e, "Benutzerabfrage fehlgeschlagen");
                return Err(e.into());
            }
        };

        self.identitaet_setzen(&benutzer.username);
        tracing::info!(ip = %self.ip, name = %benutzer.username, "Anzeigename festgelegt");

        let wartet = self.kern.sitzung.lock().ansicht == Ansicht::NamensAbfrage;
        if wartet {
            self.open().await?;
        }
        Ok(benutzer.username)
    }

    fn identitaet_setzen(&self, name: &str) {
        self.kern.sitzung.lock().identity = Some(name.to_string());
        if let Err(e) = self.speicher.schreiben(SCHLUESSEL_NAME, name) {
            tracing::warn!(%e, "Name nicht im lokalen Speicher gesichert");
        }
    }

    // -----------------------------------------------------------------------
    // Oeffnen / Schliessen
    // -----------------------------------------------------------------------

    /// Oeffnet das Chatfenster; ohne Namen geht es in die Namensabfrage.
    ///
    /// Beim ersten Oeffnen werden die neuesten Nachrichten geladen. Scheitert
    /// das, versucht es das naechste Oeffnen erneut.
    pub async fn open(&self) -> ChatResult<OeffnenErgebnis> {
        let erstes_oeffnen = {
            let mut sitzung = self.kern.sitzung.lock();
            if sitzung.identity.is_none() {
                sitzung.ansicht = Ansicht::NamensAbfrage;
                return Ok(OeffnenErgebnis::NameErforderlich);
            }
            sitzung.ansicht = Ansicht::Offen;
            sitzung.unread_count = 0;
            sitzung.scroll_anforderung = Some(ScrollZiel::Unten);
            !std::mem::replace(&mut sitzung.erstes_oeffnen_erfolgt, true)
        };
        tracing::debug!(erstes_oeffnen, "Chat geoeffnet");

        if erstes_oeffnen {
            if let Err(e) = self
                .kern
                .cursor
                .load_latest(self.backend.as_ref(), &self.kern.store)
                .await
            {
                self.kern.sitzung.lock().erstes_oeffnen_erfolgt = false;
                return Err(e);
            }
            self.kern.sitzung.lock().scroll_anforderung = Some(ScrollZiel::Unten);
        }

        Ok(OeffnenErgebnis::Geoeffnet)
    }

    /// Schliesst das Fenster; das Abonnement bleibt bestehen
    pub fn close(&self) {
        self.kern.sitzung.lock().ansicht = Ansicht::Geschlossen;
        tracing::debug!("Chat geschlossen");
    }

    /// Klick auf eine System-Benachrichtigung
    pub async fn benachrichtigung_geklickt(&self) -> ChatResult<OeffnenErgebnis> {
        self.open().await
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Sendet eine Nachricht.
    ///
    /// Der Cooldown startet erst nach bestaetigtem Einfuegen, ein
    /// fehlgeschlagenes Senden ist sofort wiederholbar.
    pub async fn send(&self, body: &str) -> ChatResult<ChatNachricht> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Nachricht darf nicht leer sein".into(),
            ));
        }
        let laenge = body.chars().count();
        if laenge > self.konfig.max_nachrichtenlaenge {
            return Err(ChatError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {laenge} Zeichen (Maximum: {})",
                self.konfig.max_nachrichtenlaenge
            )));
        }

        let (identity, letzte, antwort) = {
            let sitzung = self.kern.sitzung.lock();
            (
                sitzung.identity.clone(),
                sitzung.last_send_at,
                sitzung.pending_reply.clone(),
            )
        };
        let identity = identity.ok_or(ChatError::KeineIdentitaet)?;

        self.konfig
            .cooldown
            .pruefen(letzte, self.uhr.jetzt())
            .map_err(|verbleibend_secs| ChatError::Abkuehlung { verbleibend_secs })?;

        {
            let mut laeuft = self.sende_laeuft.lock();
            if *laeuft {
                return Err(ChatError::SendenAktiv);
            }
            *laeuft = true;
        }
        let _sperre = SendeSperre(&self.sende_laeuft);

        sperre_pruefen(self.backend.as_ref(), &self.ip, &self.konfig.kontakt).await?;

        let record = self
            .backend
            .insert(NeueNachricht {
                author_name: &identity,
                body,
                reply_to: antwort.as_ref(),
            })
            .await
            .map_err(|e| {
                tracing::error!(%e, "Nachricht konnte nicht gesendet werden");
                e
            })?;

        let gesendet_um = self.uhr.jetzt();
        {
            let mut sitzung = self.kern.sitzung.lock();
            sitzung.last_send_at = Some(gesendet_um);
            sitzung.pending_reply = None;
            sitzung.scroll_anforderung = Some(ScrollZiel::Unten);
        }
        if let Err(e) = self
            .speicher
            .schreiben(SCHLUESSEL_LETZTE_NACHRICHT, &gesendet_um.to_rfc3339())
        {
            tracing::warn!(%e, "Sendezeitpunkt nicht im lokalen Speicher gesichert");
        }

        let nachricht = ChatNachricht::from(record);
        // Das Realtime-Echo derselben Zeile wird im Store verworfen
        let neu = matches!(self.kern.store.lock().integrate(nachricht.clone()), Ok(true));
        if neu {
            self.kern.cursor.neueste_beobachtet(nachricht.created_at);
        }

        tracing::info!(
            nachricht_id = %nachricht.id,
            antwort = nachricht.reply_to.is_some(),
            "Nachricht gesendet"
        );
        Ok(nachricht)
    }

    // -----------------------------------------------------------------------
    // Antworten
    // -----------------------------------------------------------------------

    /// Merkt eine Antwort auf `ziel` vor; ersetzt eine vorherige
    pub fn begin_reply(&self, ziel: &ChatNachricht) -> AntwortSnapshot {
        let snapshot = ziel.antwort_snapshot(self.konfig.antwort_vorschau_zeichen);
        self.kern.sitzung.lock().pending_reply = Some(snapshot.clone());
        snapshot
    }

    /// Verwirft die vorgemerkte Antwort; `true` wenn eine bestand
    pub fn cancel_reply(&self) -> bool {
        self.kern.sitzung.lock().pending_reply.take().is_some()
    }

    /// Escape-Taste
    pub fn escape_gedrueckt(&self) -> bool {
        self.cancel_reply()
    }

    // -----------------------------------------------------------------------
    // Paginierung
    // -----------------------------------------------------------------------

    /// Laedt die naechstaeltere Seite
    pub async fn load_older(&self) -> ChatResult<LadeErgebnis> {
        let anker = self.kern.store.lock().aelteste().map(|n| n.id);
        let ergebnis = self
            .kern
            .cursor
            .load_older(self.backend.as_ref(), &self.kern.store)
            .await?;

        if let (LadeErgebnis::Geladen { neue, .. }, Some(anker)) = (ergebnis, anker) {
            if neue > 0 {
                self.kern.sitzung.lock().scroll_anforderung = Some(ScrollZiel::Anker(anker));
            }
        }
        Ok(ergebnis)
    }

    /// Scroll-Ereignis der Nachrichtenliste
    pub async fn scroll_gemeldet(&self, scroll_top: f64) -> ChatResult<Option<LadeErgebnis>> {
        if !soll_aeltere_laden(scroll_top, &self.kern.cursor.fenster()) {
            return Ok(None);
        }
        self.load_older().await.map(Some)
    }

    // -----------------------------------------------------------------------
    // Realtime / Anzeige
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Realtime-Ereignis direkt (sonst ueber das Abonnement)
    pub fn realtime_ereignis(&self, ereignis: RealtimeEreignis) {
        self.kern.realtime_ereignis(ereignis);
    }

    /// Was das offene Chatfenster zeigt; leer solange es geschlossen ist
    pub fn projektion(&self) -> Projektion {
        let antwort = {
            let sitzung = self.kern.sitzung.lock();
            if !sitzung.is_open() {
                return Projektion::default();
            }
            sitzung.pending_reply.clone()
        };
        RenderProjector::projizieren(&self.kern.store.lock(), antwort.as_ref())
    }

    /// Holt eine ausstehende Scroll-Anweisung ab
    pub fn scroll_anforderung_nehmen(&self) -> Option<ScrollZiel> {
        self.kern.sitzung.lock().scroll_anforderung.take()
    }

    // -----------------------------------------------------------------------
    // Zustand
    // -----------------------------------------------------------------------

    pub fn sitzung(&self) -> ChatSession {
        self.kern.sitzung.lock().clone()
    }

    pub fn ansicht(&self) -> Ansicht {
        self.kern.sitzung.lock().ansicht
    }

    pub fn is_open(&self) -> bool {
        self.kern.sitzung.lock().is_open()
    }

    pub fn identitaet(&self) -> Option<String> {
        self.kern.sitzung.lock().identity.clone()
    }

    pub fn unread_count(&self) -> u32 {
        self.kern.sitzung.lock().unread_count
    }

    pub fn pending_reply(&self) -> Option<AntwortSnapshot> {
        self.kern.sitzung.lock().pending_reply.clone()
    }

    pub fn fenster(&self) -> PaginationWindow {
        self.kern.cursor.fenster()
    }

    pub fn anzahl_nachrichten(&self) -> usize {
        self.kern.store.lock().count()
    }

    pub fn nachricht(&self, id: NachrichtId) -> Option<ChatNachricht> {
        self.kern.store.lock().get(id).cloned()
    }
}
