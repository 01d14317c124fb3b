//! RealtimeSubscriptionManager – genau ein Abonnement pro Sitzung
//!
//! Zustaende: `Unsubscribed -> Subscribing -> Subscribed`, zurueck nach
//! `Unsubscribed` beim Abbau. Ein erneutes `subscribe` baut das bestehende
//! Abonnement vorher ab. Eingehende Ereignisse liest ein eigener Task und
//! reicht sie synchron an die `EreignisSenke` weiter.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use blogchat_core::RealtimeEreignis;
use blogchat_db::RealtimeFeed;

use crate::error::ChatResult;

/// Empfaenger der Realtime-Ereignisse
pub trait EreignisSenke: Send + Sync + 'static {
    fn ereignis(&self, ereignis: RealtimeEreignis);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AboZustand {
    Unsubscribed,
    Subscribing,
    Subscribed,
}

struct AktivesAbo {
    id: Uuid,
    task: JoinHandle<()>,
}

pub struct RealtimeSubscriptionManager<F: RealtimeFeed> {
    feed: Arc<F>,
    relation: String,
    zustand: Mutex<AboZustand>,
    // serialisiert subscribe/teardown ueber den await hinweg
    aktiv: tokio::sync::Mutex<Option<AktivesAbo>>,
}

impl<F: RealtimeFeed> RealtimeSubscriptionManager<F> {
    pub fn neu(feed: Arc<F>, relation: impl Into<String>) -> Self {
        Self {
            feed,
            relation: relation.into(),
            zustand: Mutex::new(AboZustand::Unsubscribed),
            aktiv: tokio::sync::Mutex::new(None),
        }
    }

    pub fn zustand(&self) -> AboZustand {
        *self.zustand.lock()
    }

    /// Abonniert die Relation; ein bestehendes Abonnement wird vorher abgebaut
    pub async fn subscribe(&self, senke: Arc<dyn EreignisSenke>) -> ChatResult<()> {
        let mut aktiv = self.aktiv.lock().await;
        if let Some(alt) = aktiv.take() {
            tracing::debug!(abo_id = %alt.id, "Bestehendes Abonnement wird ersetzt");
            self.abbauen(alt).await;
        }

        *self.zustand.lock() = AboZustand::Subscribing;
        let abo = match self.feed.subscribe(&self.relation).await {
            Ok(abo) => abo,
            Err(e) => {
                *self.zustand.lock() = AboZustand::Unsubscribed;
                tracing::error!(%e, relation = %self.relation, "Realtime-Abonnement fehlgeschlagen");
                return Err(e.into());
            }
        };

        let id = abo.id;
        let relation = self.relation.clone();
        let mut empfaenger = abo.empfaenger;
        let task = tokio::spawn(async move {
            while let Some(ereignis) = empfaenger.recv().await {
                senke.ereignis(ereignis);
            }
            tracing::debug!(abo_id = %id, relation = %relation, "Realtime-Kanal geschlossen");
        });

        *aktiv = Some(AktivesAbo { id, task });
        *self.zustand.lock() = AboZustand::Subscribed;
        tracing::info!(abo_id = %id, relation = %self.relation, "Realtime abonniert");
        Ok(())
    }

    /// Baut das Abonnement ab; `false` wenn keines bestand
    pub async fn teardown(&self) -> bool {
        let mut aktiv = self.aktiv.lock().await;
        match aktiv.take() {
            Some(abo) => {
                self.abbauen(abo).await;
                true
            }
            None => false,
        }
    }

    async fn abbauen(&self, abo: AktivesAbo) {
        abo.task.abort();
        match self.feed.unsubscribe(abo.id).await {
            Ok(_) => tracing::info!(abo_id = %abo.id, "Realtime-Abonnement beendet"),
            Err(e) => tracing::warn!(%e, abo_id = %abo.id, "Abbestellen fehlgeschlagen"),
        }
        *self.zustand.lock() = AboZustand::Unsubscribed;
    }
}

impl<F: RealtimeFeed> Drop for RealtimeSubscriptionManager<F> {
    fn drop(&mut self) {
        // Ohne await kein Abbestellen; der Feed raeumt geschlossene Empfaenger selbst auf
        if let Some(abo) = self.aktiv.get_mut().take() {
            abo.task.abort();
        }
    }
}
