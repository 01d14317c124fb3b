//! Seitenaufruf gegen eine SQLite-Datei und einen lokalen JSON-Speicher

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use blogchat_chat::{AboZustand, ChatError, KeineBenachrichtigung, OeffnenErgebnis};
use blogchat_client::{BlogChatClient, BlogChatConfig};
use blogchat_core::{FesteUhr, FluechtigerSpeicher};
use blogchat_db::SqliteDb;
use blogchat_moderation::FotoUpload;

const IP: &str = "198.51.100.23";

fn test_config(dir: &tempfile::TempDir) -> BlogChatConfig {
    let mut config = BlogChatConfig::default();
    config.datenbank.url = format!("sqlite://{}", dir.path().join("blogchat.db").display());
    config.lokal.pfad = Some(dir.path().join("lokal.json").display().to_string());
    config.speicher.verzeichnis = dir.path().join("fotos").display().to_string();
    config.speicher.oeffentliche_url = "https://cdn.example/fotos".into();
    config.logging.level = "warn".into();
    config
}

#[tokio::test]
async fn seitenaufruf_chat_und_kommentar() {
    let dir = tempfile::tempdir().unwrap();
    let client = BlogChatClient::starten(test_config(&dir), IP).await.unwrap();

    assert_eq!(client.chat.abo_zustand(), AboZustand::Subscribed);
    assert_eq!(client.db.aktive_abonnements(), 1);

    assert_eq!(client.chat.open().await.unwrap(), OeffnenErgebnis::NameErforderlich);
    client.chat.identitaet_festlegen("Anna").await.unwrap();
    assert!(client.chat.is_open());

    let gesendet = client.chat.send("Hallo Blog").await.unwrap();
    assert_eq!(gesendet.author_name, "Anna");
    assert_eq!(client.chat.projektion().ids(), vec![gesendet.id]);

    let foto = FotoUpload {
        dateiname: "urlaub.png".into(),
        mime_type: "image/png".into(),
        daten: vec![0x89, b'P', b'N', b'G'],
    };
    client
        .kommentare
        .posten("beitrag-1", "Schoene Bilder", Some(&foto))
        .await
        .unwrap();
    let kommentare = client.kommentare.kommentare_laden("beitrag-1").await.unwrap();
    assert_eq!(kommentare.len(), 1);
    assert!(kommentare[0]
        .foto_url
        .as_deref()
        .unwrap()
        .starts_with("https://cdn.example/fotos/kommentare/"));

    client.beenden().await;
    assert_eq!(client.db.aktive_abonnements(), 0);
}

#[tokio::test]
async fn neuer_seitenaufruf_behaelt_name_und_cooldown() {
    let dir = tempfile::tempdir().unwrap();

    {
        let client = BlogChatClient::starten(test_config(&dir), IP).await.unwrap();
        client.chat.identitaet_festlegen("Bruno").await.unwrap();
        client.chat.send("Erste Nachricht").await.unwrap();
        client.beenden().await;
    }

    let client = BlogChatClient::starten(test_config(&dir), IP).await.unwrap();
    assert_eq!(client.chat.identitaet().as_deref(), Some("Bruno"));
    assert_eq!(client.chat.open().await.unwrap(), OeffnenErgebnis::Geoeffnet);
    assert_eq!(client.chat.anzahl_nachrichten(), 1);

    let err = client.chat.send("Gleich nochmal").await.unwrap_err();
    assert!(matches!(err, ChatError::Abkuehlung { .. }));
    client.beenden().await;
}

#[tokio::test]
async fn mit_backend_nutzt_vorgegebene_uhr() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(SqliteDb::in_memory().await.unwrap());
    let uhr = Arc::new(FesteUhr::neu(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()));
    let client = BlogChatClient::mit_backend(
        test_config(&dir),
        db,
        Arc::new(FluechtigerSpeicher::neu()),
        uhr.clone(),
        Arc::new(KeineBenachrichtigung),
        IP,
    );

    client.chat.identitaet_festlegen("Clara").await.unwrap();
    client.chat.send("eins").await.unwrap();
    assert!(client.chat.send("zwei").await.is_err());

    uhr.vorstellen(Duration::seconds(10));
    client.chat.send("zwei").await.unwrap();
    // Ohne starten() kein Abonnement
    assert_eq!(client.chat.abo_zustand(), AboZustand::Unsubscribed);
}
