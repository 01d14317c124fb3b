//! Kommentarsystem des Blogs
//!
//! Kommentare laufen ueber dieselben Regeln wie der Chat (Sperre, Cooldown),
//! fuehren aber einen eigenen Cooldown-Zeitstempel im lokalen Speicher.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use blogchat_core::{
    speicher::SCHLUESSEL_LETZTER_KOMMENTAR, Cooldown, LokalerSpeicher, Uhr,
};
use blogchat_db::{
    models::{KommentarRecord, NeuerKommentar},
    BenutzerRepository, BlobStorage, KommentarRepository,
};

use crate::error::{ModerationError, ModerationResult, STANDARD_KONTAKT};
use crate::foto::{FotoUpload, MAX_FOTO_BYTES};
use crate::sperre::sperre_pruefen;

/// Einstellungen des Kommentarsystems
#[derive(Debug, Clone)]
pub struct KommentarKonfig {
    pub cooldown: Cooldown,
    pub max_laenge: usize,
    pub max_foto_bytes: usize,
    /// Kontaktkanal, der gesperrten Benutzern angezeigt wird
    pub kontakt: String,
}

impl Default for KommentarKonfig {
    fn default() -> Self {
        Self {
            cooldown: Cooldown::default(),
            max_laenge: 2000,
            max_foto_bytes: MAX_FOTO_BYTES,
            kontakt: STANDARD_KONTAKT.to_string(),
        }
    }
}

/// Ein Kommentar samt oeffentlicher Foto-URL
#[derive(Debug, Clone)]
pub struct KommentarAnsicht {
    pub kommentar: KommentarRecord,
    pub foto_url: Option<String>,
}

/// Setzt `posten_laeuft` zurueck, auch wenn das Posten abgebrochen wird
struct PostenSperre<'a>(&'a Mutex<bool>);

impl Drop for PostenSperre<'_> {
    fn drop(&mut self) {
        *self.0.lock() = false;
    }
}

/// Kommentare eines Geraets (einer IP) schreiben und lesen
pub struct KommentarService<D, S>
where
    D: BenutzerRepository + KommentarRepository,
    S: BlobStorage,
{
    backend: Arc<D>,
    storage: Arc<S>,
    speicher: Arc<dyn LokalerSpeicher>,
    uhr: Arc<dyn Uhr>,
    konfig: KommentarKonfig,
    ip: String,
    letzter_kommentar: Mutex<Option<DateTime<Utc>>>,
    posten_laeuft: Mutex<bool>,
}

impl<D, S> KommentarService<D, S>
where
    D: BenutzerRepository + KommentarRepository,
    S: BlobStorage,
{
    pub fn neu(
        backend: Arc<D>,
        storage: Arc<S>,
        speicher: Arc<dyn LokalerSpeicher>,
        uhr: Arc<dyn Uhr>,
        konfig: KommentarKonfig,
        ip: impl Into<String>,
    ) -> Arc<Self> {
        let letzter_kommentar = speicher
            .lesen(SCHLUESSEL_LETZTER_KOMMENTAR)
            .and_then(|wert| DateTime::parse_from_rfc3339(&wert).ok())
            .map(|t| t.with_timezone(&Utc));

        Arc::new(Self {
            backend,
            storage,
            speicher,
            uhr,
            konfig,
            ip: ip.into(),
            letzter_kommentar: Mutex::new(letzter_kommentar),
            posten_laeuft: Mutex::new(false),
        })
    }

    /// Schreibt einen Kommentar zu einem Beitrag.
    ///
    /// Reihenfolge: Eingabe und Foto pruefen, Cooldown, Identitaet und
    /// Sperre, Foto hochladen, Zeile einfuegen. Der Cooldown startet erst
    /// nach erfolgreichem Einfuegen; solange ein Posten laeuft, wird ein
    /// zweites mit `PostenAktiv` abgelehnt.
    pub async fn posten(
        &self,
        post_id: &str,
        body: &str,
        foto: Option<&FotoUpload>,
    ) -> ModerationResult<KommentarRecord> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ModerationError::UngueltigeEingabe(
                "Kommentar darf nicht leer sein".into(),
            ));
        }
        let laenge = body.chars().count();
        if laenge > self.konfig.max_laenge {
            return Err(ModerationError::UngueltigeEingabe(format!(
                "Kommentar zu lang: {laenge} Zeichen (Maximum: {})",
                self.konfig.max_laenge
            )));
        }

        let foto_mime = foto
            .map(|f| f.validieren(self.konfig.max_foto_bytes))
            .transpose()?;

        let jetzt = self.uhr.jetzt();
        self.konfig
            .cooldown
            .pruefen(*self.letzter_kommentar.lock(), jetzt)
            .map_err(|verbleibend_secs| ModerationError::Abkuehlung { verbleibend_secs })?;

        // Zweiter Aufruf vor dem Einfuegen des ersten: kein Netzwerkaufruf
        {
            let mut laeuft = self.posten_laeuft.lock();
            if *laeuft {
                return Err(ModerationError::PostenAktiv);
            }
            *laeuft = true;
        }
        let _sperre = PostenSperre(&self.posten_laeuft);

        let benutzer = sperre_pruefen(self.backend.as_ref(), &self.ip, &self.konfig.kontakt)
            .await?
            .ok_or(ModerationError::KeineIdentitaet)?;

        let photo_path = match (foto, foto_mime) {
            (Some(foto), Some(mime)) => {
                let pfad = foto.speicherpfad(&mime);
                self.storage.store(&pfad, &foto.daten).await.map_err(|e| {
                    tracing::error!(%e, pfad = %pfad, "Foto-Upload fehlgeschlagen");
                    ModerationError::from(e)
                })?;
                Some(pfad)
            }
            _ => None,
        };

        let ergebnis = self
            .backend
            .insert(NeuerKommentar {
                post_id,
                ip_address: &self.ip,
                author_name: &benutzer.username,
                body,
                photo_path: photo_path.as_deref(),
            })
            .await;

        let kommentar = match ergebnis {
            Ok(kommentar) => kommentar,
            Err(e) => {
                tracing::error!(%e, post_id, "Kommentar konnte nicht gespeichert werden");
                if let Some(pfad) = &photo_path {
                    if let Err(e) = self.storage.delete(pfad).await {
                        tracing::warn!(%e, pfad = %pfad, "Verwaistes Foto bleibt liegen");
                    }
                }
                // Benutzer wurde waehrend des Postens geloescht
                if e.ist_nicht_gefunden() {
                    return Err(ModerationError::KeineIdentitaet);
                }
                return Err(e.into());
            }
        };

        *self.letzter_kommentar.lock() = Some(jetzt);
        if let Err(e) = self
            .speicher
            .schreiben(SCHLUESSEL_LETZTER_KOMMENTAR, &jetzt.to_rfc3339())
        {
            tracing::warn!(%e, "Cooldown-Zeitstempel nicht gespeichert");
        }

        tracing::info!(
            kommentar_id = %kommentar.id,
            post_id,
            foto = kommentar.photo_path.is_some(),
            "Kommentar gespeichert"
        );
        Ok(kommentar)
    }

    /// Alle Kommentare eines Beitrags, aelteste zuerst
    pub async fn kommentare_laden(&self, post_id: &str) -> ModerationResult<Vec<KommentarAnsicht>> {
        let kommentare = self.backend.list_by_post(post_id).await?;
        Ok(kommentare
            .into_iter()
            .map(|kommentar| KommentarAnsicht {
                foto_url: kommentar
                    .photo_path
                    .as_deref()
                    .map(|pfad| self.storage.public_url(pfad)),
                kommentar,
            })
            .collect())
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }
}
