//! Objektspeicher fuer hochgeladene Fotos
//!
//! Das `BlobStorage`-Trait abstrahiert den konkreten Speicher (Disk, Bucket
//! des Backends, etc.). Pfade sind relativ und duerfen den Speicher nicht
//! verlassen.

use std::path::{Component, Path, PathBuf};

use crate::error::{DbError, DbResult};

/// Abstrakter Objektspeicher
#[allow(async_fn_in_trait)]
pub trait BlobStorage: Send + Sync {
    /// Blob unter dem angegebenen Pfad speichern (ueberschreibt)
    async fn store(&self, path: &str, data: &[u8]) -> DbResult<()>;

    /// Blob laden
    async fn retrieve(&self, path: &str) -> DbResult<Vec<u8>>;

    /// Blob loeschen; ein bereits fehlender Blob ist kein Fehler
    async fn delete(&self, path: &str) -> DbResult<()>;

    /// Oeffentliche URL eines gespeicherten Blobs
    fn public_url(&self, path: &str) -> String;
}

/// Disk-basierter Objektspeicher
///
/// Speichert Blobs unter `base_dir/<path>` und liefert URLs der Form
/// `<oeffentliche_url>/<path>`.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    base_dir: PathBuf,
    oeffentliche_url: String,
}

impl DiskStorage {
    pub fn new(base_dir: impl Into<PathBuf>, oeffentliche_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            oeffentliche_url: oeffentliche_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Vollstaendigen Dateipfad aus relativem Pfad berechnen
    fn full_path(&self, path: &str) -> DbResult<PathBuf> {
        let relativ = Path::new(path);
        let gueltig = !path.is_empty()
            && relativ
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !gueltig {
            return Err(DbError::UngueltigerPfad(path.to_string()));
        }
        Ok(self.base_dir.join(relativ))
    }
}

impl BlobStorage for DiskStorage {
    async fn store(&self, path: &str, data: &[u8]) -> DbResult<()> {
        let full = self.full_path(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full, data).await?;
        tracing::debug!(path = %full.display(), bytes = data.len(), "Blob gespeichert");
        Ok(())
    }

    async fn retrieve(&self, path: &str) -> DbResult<Vec<u8>> {
        let full = self.full_path(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DbError::nicht_gefunden(format!("Blob {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> DbResult<()> {
        let full = self.full_path(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                tracing::debug!(path = %full.display(), "Blob geloescht");
                Ok(())
            }
            // Bereits geloescht
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.oeffentliche_url, path.trim_start_matches('/'))
    }
}
