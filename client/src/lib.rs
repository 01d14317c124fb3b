//! blogchat-client – Seiten-Lebenszyklus
//!
//! Verdrahtet Konfiguration, Logging, Datenbank, Objektspeicher und
//! lokalen Speicher mit Chat, Kommentaren und Moderation. Ein
//! `BlogChatClient` entspricht einem geladenen Blog-Tab.

pub mod config;

pub use config::BlogChatConfig;

use std::sync::Arc;

use anyhow::Context;
use blogchat_chat::{Benachrichtiger, ChatSessionController, LogBenachrichtiger};
use blogchat_core::{DateiSpeicher, FluechtigerSpeicher, LokalerSpeicher, SystemUhr, Uhr};
use blogchat_db::{DiskStorage, SqliteDb};
use blogchat_moderation::{KommentarService, ModerationGateway};
use blogchat_observability::logging_initialisieren;

pub type Chat = ChatSessionController<SqliteDb>;
pub type Kommentare = KommentarService<SqliteDb, DiskStorage>;
pub type Moderation = ModerationGateway<SqliteDb, DiskStorage>;

/// Alle Dienste einer Blog-Seite
pub struct BlogChatClient {
    pub config: BlogChatConfig,
    pub db: Arc<SqliteDb>,
    pub chat: Arc<Chat>,
    pub kommentare: Arc<Kommentare>,
    pub moderation: Arc<Moderation>,
}

impl BlogChatClient {
    /// Seite laden: Logging, Datenbank, Speicher, Dienste, Live-Abonnement
    ///
    /// Scheitert das Abonnement, bleibt die Seite benutzbar; der Chat zeigt
    /// dann nur geladene Nachrichten.
    pub async fn starten(config: BlogChatConfig, ip: &str) -> anyhow::Result<Self> {
        logging_initialisieren(&config.logging.level, &config.logging.format);

        let db = SqliteDb::oeffnen(&config.datenbank_konfig())
            .await
            .with_context(|| format!("Datenbank '{}' nicht erreichbar", config.datenbank.url))?;

        let speicher: Arc<dyn LokalerSpeicher> = match &config.lokal.pfad {
            Some(pfad) => Arc::new(
                DateiSpeicher::oeffnen(pfad)
                    .with_context(|| format!("Lokaler Speicher '{pfad}' nicht lesbar"))?,
            ),
            None => Arc::new(FluechtigerSpeicher::neu()),
        };

        let client = Self::mit_backend(
            config,
            Arc::new(db),
            speicher,
            Arc::new(SystemUhr),
            Arc::new(LogBenachrichtiger),
            ip,
        );

        if let Err(e) = client.chat.starten().await {
            tracing::error!(%e, "Chat-Abonnement fehlgeschlagen, Chat ohne Live-Aktualisierung");
        }

        tracing::info!(
            ip = ip,
            db = %client.config.datenbank.url,
            "Blogchat gestartet"
        );
        Ok(client)
    }

    /// Dienste ueber einem bestehenden Backend aufbauen, ohne Abonnement
    pub fn mit_backend(
        config: BlogChatConfig,
        db: Arc<SqliteDb>,
        speicher: Arc<dyn LokalerSpeicher>,
        uhr: Arc<dyn Uhr>,
        benachrichtiger: Arc<dyn Benachrichtiger>,
        ip: &str,
    ) -> Self {
        let storage = Arc::new(DiskStorage::new(
            &config.speicher.verzeichnis,
            &config.speicher.oeffentliche_url,
        ));

        let chat = ChatSessionController::neu(
            db.clone(),
            speicher.clone(),
            uhr.clone(),
            benachrichtiger,
            config.chat_konfig(),
            ip,
        );
        let kommentare = KommentarService::neu(
            db.clone(),
            storage.clone(),
            speicher,
            uhr,
            config.kommentar_konfig(),
            ip,
        );
        let moderation = ModerationGateway::neu(db.clone(), storage);

        Self {
            config,
            db,
            chat,
            kommentare,
            moderation,
        }
    }

    /// Seite verlassen: Abonnement freigeben
    pub async fn beenden(&self) {
        self.chat.beenden().await;
        tracing::info!("Blogchat beendet");
    }
}
