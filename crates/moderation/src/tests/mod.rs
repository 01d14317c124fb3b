mod gateway_tests;
mod kommentar_tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use blogchat_db::{
    models::{BenutzerRecord, NeuerBenutzer},
    BenutzerRepository, BlobStorage, DbError, DbResult, DiskStorage, SqliteDb,
};

pub(crate) async fn test_db() -> Arc<SqliteDb> {
    Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    )
}

pub(crate) async fn benutzer_anlegen(db: &SqliteDb, ip: &str, name: &str) -> BenutzerRecord {
    BenutzerRepository::create(
        db,
        NeuerBenutzer {
            ip_address: ip,
            username: name,
        },
    )
    .await
    .expect("Benutzer anlegen fehlgeschlagen")
}

/// Objektspeicher, dessen `delete` fuer ausgewaehlte Pfade scheitert und
/// dessen `store` sich anhalten laesst
pub(crate) struct StoerrischerSpeicher {
    pub inner: DiskStorage,
    /// Pfad -> Anzahl noch fehlschlagender Loeschversuche
    fehler: Mutex<HashMap<String, usize>>,
    pub loeschversuche: Mutex<Vec<String>>,
    tor_aktiv: AtomicBool,
    tor: Semaphore,
    pub upload_wartet: AtomicBool,
}

impl StoerrischerSpeicher {
    pub fn neu(inner: DiskStorage) -> Self {
        Self {
            inner,
            fehler: Mutex::new(HashMap::new()),
            loeschversuche: Mutex::new(Vec::new()),
            tor_aktiv: AtomicBool::new(false),
            tor: Semaphore::new(0),
            upload_wartet: AtomicBool::new(false),
        }
    }

    /// `store` blockiert bis `tor_oeffnen`
    pub fn tor_schliessen(&self) {
        self.tor_aktiv.store(true, Ordering::SeqCst);
    }

    pub fn tor_oeffnen(&self) {
        self.tor.add_permits(1);
    }

    pub fn loeschen_scheitert(&self, pfad: &str, mal: usize) {
        self.fehler.lock().insert(pfad.to_string(), mal);
    }
}

impl BlobStorage for StoerrischerSpeicher {
    async fn store(&self, path: &str, data: &[u8]) -> DbResult<()> {
        if self.tor_aktiv.load(Ordering::SeqCst) {
            self.upload_wartet.store(true, Ordering::SeqCst);
            self.tor
                .acquire()
                .await
                .map_err(|e| DbError::intern(e.to_string()))?
                .forget();
        }
        self.inner.store(path, data).await
    }

    async fn retrieve(&self, path: &str) -> DbResult<Vec<u8>> {
        self.inner.retrieve(path).await
    }

    async fn delete(&self, path: &str) -> DbResult<()> {
        self.loeschversuche.lock().push(path.to_string());
        {
            let mut fehler = self.fehler.lock();
            if let Some(rest) = fehler.get_mut(path) {
                if *rest > 0 {
                    *rest -= 1;
                    return Err(DbError::intern("Objektspeicher nicht erreichbar"));
                }
            }
        }
        self.inner.delete(path).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }
}

pub(crate) fn test_speicher() -> (Arc<StoerrischerSpeicher>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Temp-Verzeichnis");
    let disk = DiskStorage::new(dir.path(), "https://cdn.example/fotos");
    (Arc::new(StoerrischerSpeicher::neu(disk)), dir)
}
