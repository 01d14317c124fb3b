//! blogchat-chat – Echtzeit-Chat des Blogs
//!
//! Dieses Crate implementiert:
//! - MessageStore: geladene Nachrichten, dedupliziert und zeitlich sortiert
//! - PaginationCursor: neueste Seite und Rueckwaerts-Paginierung
//! - RealtimeSubscriptionManager: genau ein Live-Abonnement pro Sitzung
//! - ChatSessionController: Oeffnen/Schliessen, Identitaet, Senden mit
//!   Cooldown, Antworten, ungelesene Nachrichten
//! - RenderProjector: reine Abbildung auf Anzeigeanweisungen
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use blogchat_chat::{ChatKonfig, ChatSessionController, LogBenachrichtiger};
//! use blogchat_core::{FluechtigerSpeicher, SystemUhr};
//! use blogchat_db::SqliteDb;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!     let chat = ChatSessionController::neu(
//!         db,
//!         Arc::new(FluechtigerSpeicher::neu()),
//!         Arc::new(SystemUhr),
//!         Arc::new(LogBenachrichtiger),
//!         ChatKonfig::default(),
//!         "203.0.113.7",
//!     );
//!     chat.starten().await.unwrap();
//!     chat.open().await.unwrap();
//! }
//! ```

pub mod benachrichtigung;
pub mod error;
pub mod pagination;
pub mod realtime;
pub mod render;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use benachrichtigung::{
    Benachrichtiger, Benachrichtigung, KeineBenachrichtigung, LogBenachrichtiger,
};
pub use error::{ChatError, ChatResult};
pub use pagination::{LadeErgebnis, PaginationCursor, PaginationWindow};
pub use realtime::{AboZustand, EreignisSenke, RealtimeSubscriptionManager};
pub use render::{Projektion, RenderAnweisung, RenderProjector, ScrollZiel};
pub use session::{Ansicht, ChatSession, ChatSessionController, OeffnenErgebnis};
pub use store::MessageStore;
pub use types::{AntwortSnapshot, ChatKonfig, ChatNachricht};
