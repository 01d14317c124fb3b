//! Tests fuer den KommentarService

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use blogchat_core::{
    speicher::SCHLUESSEL_LETZTER_KOMMENTAR, FesteUhr, FluechtigerSpeicher, LokalerSpeicher,
};
use blogchat_db::{BlobStorage, KommentarRepository, SqliteDb};

use super::{benutzer_anlegen, test_db, test_speicher, StoerrischerSpeicher};
use crate::{FotoUpload, KommentarKonfig, KommentarService, ModerationError, ModerationGateway};

const IP: &str = "10.0.0.1";

struct Aufbau {
    db: Arc<SqliteDb>,
    speicher: Arc<StoerrischerSpeicher>,
    lokal: Arc<FluechtigerSpeicher>,
    uhr: Arc<FesteUhr>,
    service: Arc<KommentarService<SqliteDb, StoerrischerSpeicher>>,
    dir: tempfile::TempDir,
}

async fn aufbau() -> Aufbau {
    let db = test_db().await;
    let (speicher, dir) = test_speicher();
    let lokal = Arc::new(FluechtigerSpeicher::neu());
    let uhr = Arc::new(FesteUhr::neu(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()));
    let service = KommentarService::neu(
        db.clone(),
        speicher.clone(),
        lokal.clone(),
        uhr.clone(),
        KommentarKonfig::default(),
        IP,
    );
    Aufbau {
        db,
        speicher,
        lokal,
        uhr,
        service,
        dir,
    }
}

fn png(groesse: usize) -> FotoUpload {
    FotoUpload {
        dateiname: "urlaub.png".into(),
        mime_type: "image/png".into(),
        daten: vec![1u8; groesse],
    }
}

#[tokio::test]
async fn test_kommentar_posten() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    let k = a.service.posten("post-1", "  Schoener Beitrag!  ", None).await.unwrap();
    assert_eq!(k.body, "Schoener Beitrag!");
    assert_eq!(k.author_name, "anna");
    assert_eq!(k.ip_address, IP);
    assert!(k.photo_path.is_none());

    assert!(a.lokal.lesen(SCHLUESSEL_LETZTER_KOMMENTAR).is_some());
}

#[tokio::test]
async fn test_ohne_identitaet_abgelehnt() {
    let a = aufbau().await;
    let err = a.service.posten("post-1", "hallo", None).await.unwrap_err();
    assert!(matches!(err, ModerationError::KeineIdentitaet));
    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cooldown() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    a.service.posten("post-1", "erster", None).await.unwrap();

    a.uhr.vorstellen(Duration::seconds(5));
    let err = a.service.posten("post-1", "zweiter", None).await.unwrap_err();
    assert!(err.ist_rate_limit());
    assert!(matches!(err, ModerationError::Abkuehlung { verbleibend_secs: 5 }));

    a.uhr.vorstellen(Duration::seconds(6));
    a.service.posten("post-1", "dritter", None).await.unwrap();
    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 2);
}

#[tokio::test]
async fn test_doppelklick_postet_nur_einmal() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    let (x, y) = tokio::join!(
        a.service.posten("post-1", "erster", None),
        a.service.posten("post-1", "zweiter", None)
    );

    let erfolge = [x.is_ok(), y.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(erfolge, 1);
    let err = x.err().or(y.err()).unwrap();
    assert!(err.ist_rate_limit());
    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 1);

    // Nach dem Abschluss ist die Sperre frei, es gilt nur noch der Cooldown
    a.uhr.vorstellen(Duration::seconds(10));
    a.service.posten("post-1", "dritter", None).await.unwrap();
    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 2);
}

#[tokio::test]
async fn test_cooldown_ueberlebt_neuladen() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;
    a.service.posten("post-1", "erster", None).await.unwrap();

    // Neues Service-Objekt mit demselben lokalen Speicher (Seite neu geladen)
    let neu_geladen = KommentarService::neu(
        a.db.clone(),
        a.speicher.clone(),
        a.lokal.clone(),
        a.uhr.clone(),
        KommentarKonfig::default(),
        IP,
    );
    a.uhr.vorstellen(Duration::seconds(2));
    let err = neu_geladen.posten("post-1", "zweiter", None).await.unwrap_err();
    assert!(err.ist_rate_limit());
}

#[tokio::test]
async fn test_fehlschlag_startet_keinen_cooldown() {
    let a = aufbau().await;

    // ohne Identitaet abgelehnt
    assert!(a.service.posten("post-1", "hallo", None).await.is_err());

    benutzer_anlegen(&a.db, IP, "anna").await;
    a.service.posten("post-1", "hallo", None).await.unwrap();
}

#[tokio::test]
async fn test_gesperrt_mit_grund_und_kontakt() {
    let a = aufbau().await;
    let benutzer = benutzer_anlegen(&a.db, IP, "anna").await;
    let gateway = ModerationGateway::neu(a.db.clone(), a.speicher.clone());
    gateway.block_user(benutzer.id, "Beleidigungen").await.unwrap();

    let err = a
        .service
        .posten("post-1", "hallo", Some(&png(64)))
        .await
        .unwrap_err();
    match &err {
        ModerationError::Gesperrt { grund, kontakt } => {
            assert_eq!(grund.as_deref(), Some("Beleidigungen"));
            assert_eq!(kontakt, crate::STANDARD_KONTAKT);
        }
        andere => panic!("Gesperrt erwartet, war {andere:?}"),
    }
    // nichts hochgeladen, nichts gespeichert
    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 0);
    assert!(std::fs::read_dir(a.dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_validierung_vor_netzwerk() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    let err = a.service.posten("post-1", "   ", None).await.unwrap_err();
    assert!(err.ist_validierung());

    let zu_lang = "x".repeat(2001);
    assert!(a.service.posten("post-1", &zu_lang, None).await.unwrap_err().ist_validierung());

    let gross = png(crate::MAX_FOTO_BYTES + 1);
    let err = a.service.posten("post-1", "hallo", Some(&gross)).await.unwrap_err();
    assert!(matches!(err, ModerationError::FotoZuGross { .. }));

    let pdf = FotoUpload {
        dateiname: "rechnung.pdf".into(),
        mime_type: "application/pdf".into(),
        daten: vec![1u8; 16],
    };
    let err = a.service.posten("post-1", "hallo", Some(&pdf)).await.unwrap_err();
    assert!(matches!(err, ModerationError::KeinBild(_)));

    assert_eq!(a.db.count_by_ip(IP).await.unwrap(), 0);
}

#[tokio::test]
async fn test_foto_hochladen_und_url() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    let k = a
        .service
        .posten("post-1", "mit Bild", Some(&png(128)))
        .await
        .unwrap();
    let pfad = k.photo_path.clone().unwrap();
    assert!(pfad.starts_with("kommentare/"));
    assert!(pfad.ends_with(".png"));
    assert_eq!(a.speicher.retrieve(&pfad).await.unwrap().len(), 128);

    let ansichten = a.service.kommentare_laden("post-1").await.unwrap();
    assert_eq!(ansichten.len(), 1);
    assert_eq!(
        ansichten[0].foto_url.as_deref(),
        Some(format!("https://cdn.example/fotos/{pfad}").as_str())
    );
    assert!(a.service.kommentare_laden("post-2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gleiches_foto_zweimal_getrennt_gespeichert() {
    let a = aufbau().await;
    benutzer_anlegen(&a.db, IP, "anna").await;

    let erster = a.service.posten("post-1", "eins", Some(&png(32))).await.unwrap();
    a.uhr.vorstellen(Duration::seconds(10));
    let zweiter = a.service.posten("post-1", "zwei", Some(&png(32))).await.unwrap();
    assert_ne!(erster.photo_path, zweiter.photo_path);

    // Loeschen des ersten laesst das Foto des zweiten stehen
    let gateway = ModerationGateway::neu(a.db.clone(), a.speicher.clone());
    gateway.kommentar_loeschen(erster.id).await.unwrap();
    let pfad = zweiter.photo_path.unwrap();
    assert!(a.speicher.retrieve(&pfad).await.is_ok());
    assert!(KommentarRepository::get(a.db.as_ref(), zweiter.id)
        .await
        .unwrap()
        .is_some());
}
