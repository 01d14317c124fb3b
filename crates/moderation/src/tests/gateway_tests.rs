//! Tests fuer den ModerationGateway

use std::sync::atomic::Ordering;

use blogchat_core::{BenutzerId, FluechtigerSpeicher, KommentarId, SystemUhr};
use blogchat_db::{
    models::{KommentarRecord, NeueNachricht, NeuerKommentar},
    BenutzerRepository, BlobStorage, KommentarRepository, NachrichtenRepository, SqliteDb,
};

use super::{benutzer_anlegen, test_db, test_speicher, StoerrischerSpeicher};
use crate::{FotoUpload, KommentarKonfig, KommentarService, ModerationError, ModerationGateway};

async fn kommentar_mit_foto(
    db: &SqliteDb,
    speicher: &StoerrischerSpeicher,
    ip: &str,
    body: &str,
    foto: Option<&str>,
) -> KommentarRecord {
    if let Some(pfad) = foto {
        speicher.store(pfad, b"\x89PNG").await.unwrap();
    }
    KommentarRepository::insert(
        db,
        NeuerKommentar {
            post_id: "post-1",
            ip_address: ip,
            author_name: "anna",
            body,
            photo_path: foto,
        },
    )
    .await
    .unwrap()
}

/// Benutzer mit 3 Kommentaren, davon 2 mit Foto
async fn benutzer_mit_inhalten(
    db: &SqliteDb,
    speicher: &StoerrischerSpeicher,
) -> BenutzerId {
    let benutzer = benutzer_anlegen(db, "10.0.0.1", "anna").await;
    kommentar_mit_foto(db, speicher, "10.0.0.1", "eins", Some("kommentare/a.png")).await;
    kommentar_mit_foto(db, speicher, "10.0.0.1", "zwei", None).await;
    kommentar_mit_foto(db, speicher, "10.0.0.1", "drei", Some("kommentare/b.jpg")).await;
    benutzer.id
}

#[tokio::test]
async fn test_kaskade_loescht_alles() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let user_id = benutzer_mit_inhalten(&db, &speicher).await;
    let fremd = benutzer_anlegen(&db, "10.0.0.2", "berta").await;
    kommentar_mit_foto(&db, &speicher, "10.0.0.2", "fremd", Some("kommentare/c.png")).await;

    let gateway = ModerationGateway::neu(db.clone(), speicher.clone());
    let bericht = gateway.delete_user(user_id).await.unwrap();

    assert_eq!(bericht.geloeschte_kommentare, 3);
    assert_eq!(bericht.geloeschte_fotos, 2);
    assert!(bericht.benutzer_geloescht);
    assert!(bericht.ist_vollstaendig());

    assert_eq!(db.count_by_ip("10.0.0.1").await.unwrap(), 0);
    assert!(BenutzerRepository::get(db.as_ref(), user_id)
        .await
        .unwrap_err()
        .ist_nicht_gefunden());
    assert!(speicher.retrieve("kommentare/a.png").await.is_err());
    assert!(speicher.retrieve("kommentare/b.jpg").await.is_err());

    // Inhalte anderer Benutzer bleiben unberuehrt
    assert_eq!(db.count_by_ip("10.0.0.2").await.unwrap(), 1);
    assert!(speicher.retrieve("kommentare/c.png").await.is_ok());
    assert!(BenutzerRepository::get(db.as_ref(), fremd.id).await.is_ok());
}

#[tokio::test]
async fn test_kaskade_uebersteht_einzelnen_fotofehler() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let user_id = benutzer_mit_inhalten(&db, &speicher).await;
    speicher.loeschen_scheitert("kommentare/a.png", 1);

    let gateway = ModerationGateway::neu(db.clone(), speicher.clone());
    let bericht = gateway.delete_user(user_id).await.unwrap();

    assert_eq!(bericht.geloeschte_kommentare, 3);
    assert_eq!(bericht.geloeschte_fotos, 2);
    assert!(bericht.benutzer_geloescht);
    assert!(bericht.ist_vollstaendig());

    assert_eq!(db.count_by_ip("10.0.0.1").await.unwrap(), 0);
    assert!(speicher.retrieve("kommentare/a.png").await.is_err());
    assert!(speicher.retrieve("kommentare/b.jpg").await.is_err());

    let versuche = speicher.loeschversuche.lock().clone();
    assert_eq!(versuche.iter().filter(|p| *p == "kommentare/a.png").count(), 2);
}

#[tokio::test]
async fn test_kaskade_meldet_dauerhaften_fotofehler() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let user_id = benutzer_mit_inhalten(&db, &speicher).await;
    speicher.loeschen_scheitert("kommentare/b.jpg", usize::MAX);

    let gateway = ModerationGateway::neu(db.clone(), speicher.clone());
    let bericht = gateway.delete_user(user_id).await.unwrap();

    // Zeilen sind trotzdem weg
    assert_eq!(bericht.geloeschte_kommentare, 3);
    assert!(bericht.benutzer_geloescht);
    assert_eq!(db.count_by_ip("10.0.0.1").await.unwrap(), 0);

    assert!(!bericht.ist_vollstaendig());
    assert_eq!(bericht.geloeschte_fotos, 1);
    assert_eq!(bericht.fehlgeschlagene_fotos.len(), 1);
    assert_eq!(bericht.fehlgeschlagene_fotos[0].pfad, "kommentare/b.jpg");
}

#[tokio::test]
async fn test_kaskade_waehrend_laufendem_posten() {
    let db = test_db().await;
    let (speicher, dir) = test_speicher();
    let user_id = benutzer_mit_inhalten(&db, &speicher).await;
    let service = KommentarService::neu(
        db.clone(),
        speicher.clone(),
        std::sync::Arc::new(FluechtigerSpeicher::neu()),
        std::sync::Arc::new(SystemUhr),
        KommentarKonfig::default(),
        "10.0.0.1",
    );
    let gateway = ModerationGateway::neu(db.clone(), speicher.clone());
    let foto = FotoUpload {
        dateiname: "spaet.png".into(),
        mime_type: "image/png".into(),
        daten: vec![1u8; 32],
    };

    // Identitaet ist geprueft, der Upload haengt, dann laeuft die Kaskade
    speicher.tor_schliessen();
    let (gepostet, bericht) = tokio::join!(service.posten("post-1", "spaet", Some(&foto)), async {
        while !speicher.upload_wartet.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let bericht = gateway.delete_user(user_id).await;
        speicher.tor_oeffnen();
        bericht
    });

    let bericht = bericht.unwrap();
    assert_eq!(bericht.geloeschte_kommentare, 3);
    assert_eq!(bericht.geloeschte_fotos, 2);
    assert!(bericht.benutzer_geloescht);
    assert!(bericht.ist_vollstaendig());

    assert!(matches!(gepostet.unwrap_err(), ModerationError::KeineIdentitaet));
    assert_eq!(db.count_by_ip("10.0.0.1").await.unwrap(), 0);

    // Auch das nachgereichte Foto ist wieder weg
    let fotos = dir.path().join("kommentare");
    let uebrig = std::fs::read_dir(&fotos).map(|d| d.count()).unwrap_or(0);
    assert_eq!(uebrig, 0);
}

#[tokio::test]
async fn test_unbekannter_benutzer() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let gateway = ModerationGateway::neu(db, speicher);

    let err = gateway.delete_user(BenutzerId::new()).await.unwrap_err();
    assert!(matches!(err, ModerationError::BenutzerNichtGefunden(_)));

    let err = gateway.block_user(BenutzerId::new(), "Spam").await.unwrap_err();
    assert!(matches!(err, ModerationError::BenutzerNichtGefunden(_)));
}

#[tokio::test]
async fn test_sperren_und_entsperren() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let benutzer = benutzer_anlegen(&db, "10.0.0.1", "anna").await;
    kommentar_mit_foto(&db, &speicher, "10.0.0.1", "bleibt", None).await;

    let gateway = ModerationGateway::neu(db.clone(), speicher);

    let gesperrt = gateway.block_user(benutzer.id, "  Spam  ").await.unwrap();
    assert!(gesperrt.is_blocked);
    assert_eq!(gesperrt.block_reason.as_deref(), Some("Spam"));
    // keine rueckwirkende Loeschung
    assert_eq!(db.count_by_ip("10.0.0.1").await.unwrap(), 1);

    let err = crate::sperre_pruefen(db.as_ref(), "10.0.0.1", "mod@example.org")
        .await
        .unwrap_err();
    assert!(err.benutzer_meldung().contains("Spam"));

    let entsperrt = gateway.unblock_user(benutzer.id).await.unwrap();
    assert!(!entsperrt.is_blocked);
    assert!(entsperrt.block_reason.is_none());
    assert!(crate::sperre_pruefen(db.as_ref(), "10.0.0.1", "mod@example.org")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_sperren_ohne_grund() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let benutzer = benutzer_anlegen(&db, "10.0.0.1", "anna").await;
    let gateway = ModerationGateway::neu(db, speicher);

    let gesperrt = gateway.block_user(benutzer.id, "   ").await.unwrap();
    assert!(gesperrt.is_blocked);
    assert!(gesperrt.block_reason.is_none());
}

#[tokio::test]
async fn test_umbenennen_zieht_kommentare_nach() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let benutzer = benutzer_anlegen(&db, "10.0.0.1", "anna").await;
    for body in ["a", "b"] {
        kommentar_mit_foto(&db, &speicher, "10.0.0.1", body, None).await;
    }

    let gateway = ModerationGateway::neu(db.clone(), speicher);
    let bericht = gateway.rename_user(benutzer.id, " Annabell ").await.unwrap();

    assert_eq!(bericht.benutzer.username, "Annabell");
    assert_eq!(bericht.kommentare_aktualisiert, Some(2));
    assert!(bericht.fehler.is_none());
    assert!(db
        .list_by_ip("10.0.0.1")
        .await
        .unwrap()
        .iter()
        .all(|k| k.author_name == "Annabell"));
}

#[tokio::test]
async fn test_umbenennen_validiert_namen() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    let benutzer = benutzer_anlegen(&db, "10.0.0.1", "anna").await;
    let gateway = ModerationGateway::neu(db.clone(), speicher);

    let err = gateway.rename_user(benutzer.id, "x").await.unwrap_err();
    assert!(err.ist_validierung());
    assert_eq!(
        BenutzerRepository::get(db.as_ref(), benutzer.id)
            .await
            .unwrap()
            .username,
        "anna"
    );
}

#[tokio::test]
async fn test_kommentar_und_nachricht_loeschen() {
    let db = test_db().await;
    let (speicher, _dir) = test_speicher();
    benutzer_anlegen(&db, "10.0.0.1", "anna").await;
    let kommentar =
        kommentar_mit_foto(&db, &speicher, "10.0.0.1", "weg", Some("kommentare/x.png")).await;
    let nachricht = NachrichtenRepository::insert(
        db.as_ref(),
        NeueNachricht {
            author_name: "anna",
            body: "hallo",
            reply_to: None,
        },
    )
    .await
    .unwrap();

    let gateway = ModerationGateway::neu(db.clone(), speicher.clone());

    let bericht = gateway.kommentar_loeschen(kommentar.id).await.unwrap();
    assert_eq!(bericht.geloeschte_kommentare, 1);
    assert_eq!(bericht.geloeschte_fotos, 1);
    assert!(speicher.retrieve("kommentare/x.png").await.is_err());

    gateway.nachricht_loeschen(nachricht.id).await.unwrap();
    assert_eq!(db.count().await.unwrap(), 0);

    let err = gateway.nachricht_loeschen(nachricht.id).await.unwrap_err();
    assert!(matches!(err, ModerationError::NichtGefunden(_)));
    let err = gateway.kommentar_loeschen(KommentarId::new()).await.unwrap_err();
    assert!(matches!(err, ModerationError::NichtGefunden(_)));
}

