//! blogchat-moderation – Moderation und Kommentare
//!
//! - `sperre`: wer darf schreiben (gemeinsame Regel fuer Chat und Kommentare)
//! - `gateway`: Admin-Operationen (Sperren, Kaskaden-Loeschung, Umbenennen)
//! - `kommentare`: Kommentare posten mit Cooldown und Foto-Upload
//! - `foto`: Pruefung und Speicherpfade fuer Foto-Uploads

pub mod error;
pub mod foto;
pub mod gateway;
pub mod kommentare;
pub mod name;
pub mod sperre;

#[cfg(test)]
mod tests;

pub use error::{ModerationError, ModerationResult, STANDARD_KONTAKT};
pub use foto::{FotoUpload, MAX_FOTO_BYTES};
pub use gateway::{FotoFehler, KaskadenBericht, ModerationGateway, UmbenennungsBericht};
pub use kommentare::{KommentarAnsicht, KommentarKonfig, KommentarService};
pub use name::{name_validieren, NAME_MAX_ZEICHEN, NAME_MIN_ZEICHEN};
pub use sperre::{posting_erlaubt, sperre_pruefen};
