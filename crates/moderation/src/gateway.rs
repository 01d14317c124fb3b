//! ModerationGateway – Sperren, Kaskaden-Loeschung und Umbenennen
//!
//! Admin-Operationen auf Benutzern, Kommentaren und Chat-Nachrichten. Die
//! Kaskaden sind nicht transaktional: die dominante Operation (Zeilen
//! loeschen, Benutzer umbenennen) wird durchgezogen, Teilfehler landen im
//! Bericht statt die Operation abzubrechen.

use std::sync::Arc;

use blogchat_core::{BenutzerId, KommentarId, NachrichtId};
use blogchat_db::{
    models::{BenutzerRecord, KommentarRecord},
    BenutzerRepository, BlobStorage, KommentarRepository, NachrichtenRepository,
};

use crate::error::{ModerationError, ModerationResult};
use crate::name::name_validieren;

/// Versuche pro Foto beim Kaskaden-Loeschen
const FOTO_LOESCH_VERSUCHE: usize = 2;

/// Ein Foto, das beim Loeschen nicht entfernt werden konnte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FotoFehler {
    pub pfad: String,
    pub fehler: String,
}

/// Ergebnis einer Kaskaden-Loeschung
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KaskadenBericht {
    pub geloeschte_kommentare: u64,
    pub geloeschte_fotos: usize,
    pub fehlgeschlagene_fotos: Vec<FotoFehler>,
    pub benutzer_geloescht: bool,
}

impl KaskadenBericht {
    /// true wenn auch alle Fotos entfernt wurden
    pub fn ist_vollstaendig(&self) -> bool {
        self.fehlgeschlagene_fotos.is_empty()
    }
}

/// Ergebnis einer Umbenennung
#[derive(Debug, Clone)]
pub struct UmbenennungsBericht {
    pub benutzer: BenutzerRecord,
    /// Anzahl nachgezogener Kommentare; `None` wenn das Nachziehen scheiterte
    pub kommentare_aktualisiert: Option<u64>,
    pub fehler: Option<String>,
}

/// Admin-Schnittstelle fuer Benutzer- und Inhaltsmoderation
pub struct ModerationGateway<D, S>
where
    D: BenutzerRepository + KommentarRepository + NachrichtenRepository,
    S: BlobStorage,
{
    backend: Arc<D>,
    storage: Arc<S>,
}

impl<D, S> ModerationGateway<D, S>
where
    D: BenutzerRepository + KommentarRepository + NachrichtenRepository,
    S: BlobStorage,
{
    pub fn neu(backend: Arc<D>, storage: Arc<S>) -> Arc<Self> {
        Arc::new(Self { backend, storage })
    }

    async fn benutzer_laden(&self, user_id: BenutzerId) -> ModerationResult<BenutzerRecord> {
        BenutzerRepository::get(self.backend.as_ref(), user_id)
            .await
            .map_err(|e| {
                if e.ist_nicht_gefunden() {
                    ModerationError::BenutzerNichtGefunden(user_id.to_string())
                } else {
                    e.into()
                }
            })
    }

    /// Sperrt einen Benutzer. Bestehende Inhalte bleiben stehen.
    pub async fn block_user(
        &self,
        user_id: BenutzerId,
        reason: &str,
    ) -> ModerationResult<BenutzerRecord> {
        self.benutzer_laden(user_id).await?;

        let grund = Some(reason.trim()).filter(|g| !g.is_empty());
        let benutzer = self.backend.update_block(user_id, true, grund).await?;

        tracing::info!(
            benutzer_id = %user_id,
            ip = %benutzer.ip_address,
            grund = ?grund,
            "Benutzer gesperrt"
        );
        Ok(benutzer)
    }

    /// Hebt die Sperre eines Benutzers auf
    pub async fn unblock_user(&self, user_id: BenutzerId) -> ModerationResult<BenutzerRecord> {
        self.benutzer_laden(user_id).await?;

        let benutzer = self.backend.update_block(user_id, false, None).await?;
        tracing::info!(benutzer_id = %user_id, "Sperre aufgehoben");
        Ok(benutzer)
    }

    /// Loescht einen Benutzer samt aller Kommentare und deren Fotos.
    ///
    /// Nach dem Loeschen der Benutzerzeile werden die Kommentare der IP ein
    /// zweites Mal entfernt: ein Kommentar, der zwischen den beiden Schritten
    /// eingefuegt wurde, faellt so mit weg, spaetere Einfuegungen scheitern
    /// am fehlenden Benutzer. Fotos kommen aus genau den geloeschten Zeilen.
    /// Scheitert das Loeschen einzelner Fotos, werden Kommentare und
    /// Benutzer trotzdem geloescht; die Fehler stehen im Bericht.
    pub async fn delete_user(&self, user_id: BenutzerId) -> ModerationResult<KaskadenBericht> {
        let benutzer = self.benutzer_laden(user_id).await?;

        let mut kommentare = self.backend.delete_by_ip(&benutzer.ip_address).await?;
        let benutzer_geloescht = BenutzerRepository::delete(self.backend.as_ref(), user_id).await?;
        let nachzuegler = self.backend.delete_by_ip(&benutzer.ip_address).await?;
        if !nachzuegler.is_empty() {
            tracing::debug!(
                benutzer_id = %user_id,
                anzahl = nachzuegler.len(),
                "Waehrend der Loeschung gepostete Kommentare entfernt"
            );
        }
        kommentare.extend(nachzuegler);

        let mut bericht = KaskadenBericht {
            geloeschte_kommentare: kommentare.len() as u64,
            benutzer_geloescht,
            ..Default::default()
        };

        self.fotos_loeschen(&kommentare, &mut bericht).await;

        if bericht.ist_vollstaendig() {
            tracing::info!(
                benutzer_id = %user_id,
                kommentare = bericht.geloeschte_kommentare,
                fotos = bericht.geloeschte_fotos,
                "Benutzer mit allen Inhalten geloescht"
            );
        } else {
            tracing::warn!(
                benutzer_id = %user_id,
                kommentare = bericht.geloeschte_kommentare,
                fehlgeschlagene_fotos = bericht.fehlgeschlagene_fotos.len(),
                "Benutzer geloescht, einzelne Fotos konnten nicht entfernt werden"
            );
        }

        Ok(bericht)
    }

    /// Benennt einen Benutzer um und zieht den Namen in allen seinen
    /// Kommentaren nach. Scheitert das Nachziehen, bleibt die Umbenennung
    /// bestehen.
    pub async fn rename_user(
        &self,
        user_id: BenutzerId,
        new_name: &str,
    ) -> ModerationResult<UmbenennungsBericht> {
        let name = name_validieren(new_name)?;
        self.benutzer_laden(user_id).await?;

        let benutzer = self.backend.rename(user_id, name).await?;

        let bericht = match self
            .backend
            .update_author_by_ip(&benutzer.ip_address, name)
            .await
        {
            Ok(anzahl) => {
                tracing::info!(benutzer_id = %user_id, name, kommentare = anzahl, "Benutzer umbenannt");
                UmbenennungsBericht {
                    benutzer,
                    kommentare_aktualisiert: Some(anzahl),
                    fehler: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    benutzer_id = %user_id,
                    %e,
                    "Benutzer umbenannt, alte Kommentare tragen noch den alten Namen"
                );
                UmbenennungsBericht {
                    benutzer,
                    kommentare_aktualisiert: None,
                    fehler: Some(e.to_string()),
                }
            }
        };

        Ok(bericht)
    }

    /// Loescht eine Chat-Nachricht (wird per Realtime an alle Sitzungen verteilt)
    pub async fn nachricht_loeschen(&self, id: NachrichtId) -> ModerationResult<()> {
        if !NachrichtenRepository::delete(self.backend.as_ref(), id).await? {
            return Err(ModerationError::NichtGefunden(format!("Nachricht {id}")));
        }
        tracing::info!(nachricht_id = %id, "Chat-Nachricht geloescht");
        Ok(())
    }

    /// Loescht einen Kommentar samt Foto
    pub async fn kommentar_loeschen(&self, id: KommentarId) -> ModerationResult<KaskadenBericht> {
        let kommentar = KommentarRepository::get(self.backend.as_ref(), id)
            .await?
            .ok_or_else(|| ModerationError::NichtGefunden(format!("Kommentar {id}")))?;

        let geloescht = KommentarRepository::delete(self.backend.as_ref(), id).await?;
        let mut bericht = KaskadenBericht {
            geloeschte_kommentare: u64::from(geloescht),
            ..Default::default()
        };

        self.fotos_loeschen(std::slice::from_ref(&kommentar), &mut bericht)
            .await;

        tracing::info!(kommentar_id = %id, "Kommentar geloescht");
        Ok(bericht)
    }

    async fn fotos_loeschen(&self, kommentare: &[KommentarRecord], bericht: &mut KaskadenBericht) {
        let mut pfade: Vec<&str> = kommentare
            .iter()
            .filter_map(|k| k.photo_path.as_deref())
            .collect();
        pfade.sort_unstable();
        pfade.dedup();

        for pfad in pfade {
            let mut letzter_fehler = None;
            for versuch in 1..=FOTO_LOESCH_VERSUCHE {
                match self.storage.delete(pfad).await {
                    Ok(()) => {
                        letzter_fehler = None;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%e, pfad, versuch, "Foto loeschen fehlgeschlagen");
                        letzter_fehler = Some(e);
                    }
                }
            }

            match letzter_fehler {
                None => bericht.geloeschte_fotos += 1,
                Some(e) => {
                    tracing::warn!(%e, pfad, "Foto konnte nicht geloescht werden");
                    bericht.fehlgeschlagene_fotos.push(FotoFehler {
                        pfad: pfad.to_string(),
                        fehler: e.to_string(),
                    });
                }
            }
        }
    }
}
