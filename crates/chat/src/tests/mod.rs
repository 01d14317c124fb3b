
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use uuid::Uuid;

use blogchat_core::{BenutzerId, NachrichtId};
use blogchat_db::{
    models::{BenutzerRecord, NachrichtRecord, NeueNachricht, NeuerBenutzer},
    Abonnement, BenutzerRepository, DbError, DbResult, NachrichtenRepository, RealtimeFeed,
    SqliteDb,
};

use crate::benachrichtigung::{Benachrichtiger, Benachrichtigung};

/// SQLite-Backend mit Zaehlern, Sperrtor und schaltbaren Fehlern
pub(crate) struct TestBackend {
    pub db: SqliteDb,
    pub neueste_aufrufe: AtomicUsize,
    pub aelter_aufrufe: AtomicUsize,
    pub insert_scheitert: AtomicBool,
    pub neueste_scheitert: AtomicBool,
    tor_aktiv: AtomicBool,
    tor: Semaphore,
}

impl TestBackend {
    pub async fn neu() -> Arc<Self> {
        Arc::new(Self {
            db: SqliteDb::in_memory()
                .await
                .expect("In-Memory-DB konnte nicht geoeffnet werden"),
            neueste_aufrufe: AtomicUsize::new(0),
            aelter_aufrufe: AtomicUsize::new(0),
            insert_scheitert: AtomicBool::new(false),
            neueste_scheitert: AtomicBool::new(false),
            tor_aktiv: AtomicBool::new(false),
            tor: Semaphore::new(0),
        })
    }

    /// `aelter_als` blockiert bis `tor_oeffnen`
    pub fn tor_schliessen(&self) {
        self.tor_aktiv.store(true, Ordering::SeqCst);
    }

    pub fn tor_oeffnen(&self) {
        self.tor.add_permits(1);
    }

    /// Fuegt `anzahl` Nachrichten eines anderen Geraets ein
    pub async fn nachrichten_einfuegen(&self, anzahl: usize) -> Vec<NachrichtRecord> {
        let mut records = Vec::with_capacity(anzahl);
        for i in 0..anzahl {
            let body = format!("nachricht {i}");
            let record = NachrichtenRepository::insert(
                &self.db,
                NeueNachricht {
                    author_name: "berta",
                    body: &body,
                    reply_to: None,
                },
            )
            .await
            .expect("Nachricht einfuegen fehlgeschlagen");
            records.push(record);
        }
        records
    }
}

impl NachrichtenRepository for TestBackend {
    async fn insert(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        if self.insert_scheitert.load(Ordering::SeqCst) {
            return Err(DbError::intern("Verbindung abgebrochen"));
        }
        NachrichtenRepository::insert(&self.db, data).await
    }

    async fn neueste(&self, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        self.neueste_aufrufe.fetch_add(1, Ordering::SeqCst);
        if self.neueste_scheitert.load(Ordering::SeqCst) {
            return Err(DbError::intern("Zeitueberschreitung"));
        }
        self.db.neueste(limit).await
    }

    async fn aelter_als(&self, vor: DateTime<Utc>, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        self.aelter_aufrufe.fetch_add(1, Ordering::SeqCst);
        if self.tor_aktiv.load(Ordering::SeqCst) {
            self.tor
                .acquire()
                .await
                .map_err(|e| DbError::intern(e.to_string()))?
                .forget();
        }
        self.db.aelter_als(vor, limit).await
    }

    async fn delete(&self, id: NachrichtId) -> DbResult<bool> {
        NachrichtenRepository::delete(&self.db, id).await
    }

    async fn count(&self) -> DbResult<i64> {
        self.db.count().await
    }
}

impl BenutzerRepository for TestBackend {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        self.db.create(data).await
    }

    async fn get(&self, id: BenutzerId) -> DbResult<BenutzerRecord> {
        BenutzerRepository::get(&self.db, id).await
    }

    async fn get_by_ip(&self, ip: &str) -> DbResult<BenutzerRecord> {
        self.db.get_by_ip(ip).await
    }

    async fn update_block(
        &self,
        id: BenutzerId,
        is_blocked: bool,
        reason: Option<&str>,
    ) -> DbResult<BenutzerRecord> {
        self.db.update_block(id, is_blocked, reason).await
    }

    async fn rename(&self, id: BenutzerId, username: &str) -> DbResult<BenutzerRecord> {
        self.db.rename(id, username).await
    }

    async fn delete(&self, id: BenutzerId) -> DbResult<bool> {
        BenutzerRepository::delete(&self.db, id).await
    }
}

impl RealtimeFeed for TestBackend {
    async fn subscribe(&self, relation: &str) -> DbResult<Abonnement> {
        self.db.subscribe(relation).await
    }

    async fn unsubscribe(&self, abo_id: Uuid) -> DbResult<bool> {
        self.db.unsubscribe(abo_id).await
    }
}

/// Merkt sich alle angezeigten Benachrichtigungen
pub(crate) struct AufzeichnenderBenachrichtiger {
    pub erlaubt: AtomicBool,
    pub angezeigt: Mutex<Vec<Benachrichtigung>>,
}

impl AufzeichnenderBenachrichtiger {
    pub fn neu(erlaubt: bool) -> Arc<Self> {
        Arc::new(Self {
            erlaubt: AtomicBool::new(erlaubt),
            angezeigt: Mutex::new(Vec::new()),
        })
    }
}

impl Benachrichtiger for AufzeichnenderBenachrichtiger {
    fn berechtigung(&self) -> bool {
        self.erlaubt.load(Ordering::SeqCst)
    }

    fn anzeigen(&self, benachrichtigung: &Benachrichtigung) {
        self.angezeigt.lock().push(benachrichtigung.clone());
    }
}

/// Gibt dem Realtime-Task Gelegenheit zu laufen, bis `bedingung` gilt
pub(crate) async fn warten_bis(mut bedingung: impl FnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !bedingung() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("Bedingung nicht rechtzeitig erfuellt");
}
