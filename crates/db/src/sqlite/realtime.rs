//! Realtime-Feed des SQLite-Backends
//!
//! Jede schreibende Repository-Operation veroeffentlicht ihre
//! Zeilenaenderungen ueber den `RealtimeVerteiler`. Jedes Abonnement hat eine
//! eigene Queue; geschlossene Empfaenger werden beim naechsten Versand
//! aufgeraeumt.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use blogchat_core::RealtimeEreignis;

use crate::error::DbResult;
use crate::repository::{Abonnement, RealtimeFeed};
use crate::sqlite::pool::SqliteDb;

#[derive(Debug)]
struct AboEintrag {
    relation: String,
    tx: mpsc::UnboundedSender<RealtimeEreignis>,
}

/// Verteilt Zeilenaenderungen an alle Abonnenten einer Relation
#[derive(Debug, Default)]
pub struct RealtimeVerteiler {
    abos: DashMap<Uuid, AboEintrag>,
}

impl RealtimeVerteiler {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert ein neues Abonnement
    pub fn abonnieren(&self, relation: &str) -> Abonnement {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.abos.insert(
            id,
            AboEintrag {
                relation: relation.to_string(),
                tx,
            },
        );
        tracing::debug!(abo_id = %id, relation, "Realtime-Abonnement registriert");
        Abonnement {
            id,
            relation: relation.to_string(),
            empfaenger: rx,
        }
    }

    /// Entfernt ein Abonnement; der Empfaenger sieht danach `None`
    pub fn abbestellen(&self, id: Uuid) -> bool {
        let entfernt = self.abos.remove(&id).is_some();
        if entfernt {
            tracing::debug!(abo_id = %id, "Realtime-Abonnement entfernt");
        }
        entfernt
    }

    /// Sendet ein Ereignis an alle Abonnenten seiner Relation
    pub fn veroeffentlichen(&self, ereignis: RealtimeEreignis) {
        let mut geschlossen = Vec::new();

        for eintrag in self.abos.iter() {
            if eintrag.relation != ereignis.relation {
                continue;
            }
            if eintrag.tx.send(ereignis.clone()).is_err() {
                geschlossen.push(*eintrag.key());
            }
        }

        // Entfernen erst nach der Iteration (DashMap-Shard-Locks)
        for id in geschlossen {
            self.abos.remove(&id);
            tracing::debug!(abo_id = %id, "Geschlossenes Realtime-Abonnement aufgeraeumt");
        }
    }

    /// Anzahl aktiver Abonnements (alle Relationen)
    pub fn anzahl(&self) -> usize {
        self.abos.len()
    }
}

impl SqliteDb {
    /// Veroeffentlicht eine Zeilenaenderung an alle Abonnenten
    pub(crate) fn ereignis_senden(&self, ereignis: RealtimeEreignis) {
        self.verteiler.veroeffentlichen(ereignis);
    }

    /// Anzahl der aktiven Realtime-Abonnements (Diagnose, Tests)
    pub fn aktive_abonnements(&self) -> usize {
        self.verteiler.anzahl()
    }

    /// Verteiler fuer direkt eingespeiste Ereignisse (Replays, Tests)
    pub fn verteiler(&self) -> &RealtimeVerteiler {
        &self.verteiler
    }
}

impl RealtimeFeed for SqliteDb {
    async fn subscribe(&self, relation: &str) -> DbResult<Abonnement> {
        Ok(self.verteiler.abonnieren(relation))
    }

    async fn unsubscribe(&self, abo_id: Uuid) -> DbResult<bool> {
        Ok(self.verteiler.abbestellen(abo_id))
    }
}
