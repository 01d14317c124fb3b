//! Blogchat-Konfiguration
//!
//! Wird beim Seitenaufruf aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass Blogchat ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};

use blogchat_chat::ChatKonfig;
use blogchat_core::{cooldown::STANDARD_COOLDOWN_SECS, Cooldown};
use blogchat_db::DatabaseConfig;
use blogchat_moderation::{KommentarKonfig, MAX_FOTO_BYTES, STANDARD_KONTAKT};

/// Vollstaendige Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogChatConfig {
    pub chat: ChatEinstellungen,
    pub kommentare: KommentarEinstellungen,
    /// Objektspeicher fuer Fotos
    pub speicher: SpeicherEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    /// Lokaler Schluessel-Wert-Speicher des Geraets
    pub lokal: LokalEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Chat-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEinstellungen {
    /// Mindestabstand zwischen zwei Nachrichten in Sekunden
    pub cooldown_secs: i64,
    /// Nachrichten pro Seite (neueste und aeltere)
    pub seitengroesse: i64,
    pub max_nachrichtenlaenge: usize,
    /// Laenge des Textauszugs in Antworten
    pub antwort_vorschau_zeichen: usize,
}

impl Default for ChatEinstellungen {
    fn default() -> Self {
        Self {
            cooldown_secs: STANDARD_COOLDOWN_SECS,
            seitengroesse: 99,
            max_nachrichtenlaenge: 500,
            antwort_vorschau_zeichen: 50,
        }
    }
}

/// Kommentar-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KommentarEinstellungen {
    pub cooldown_secs: i64,
    pub max_laenge: usize,
    /// Kontaktkanal fuer gesperrte Benutzer
    pub kontakt: String,
}

impl Default for KommentarEinstellungen {
    fn default() -> Self {
        Self {
            cooldown_secs: STANDARD_COOLDOWN_SECS,
            max_laenge: 2000,
            kontakt: STANDARD_KONTAKT.into(),
        }
    }
}

/// Objektspeicher-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeicherEinstellungen {
    /// Basisverzeichnis der Blobs
    pub verzeichnis: String,
    /// URL-Praefix, unter dem die Blobs oeffentlich erreichbar sind
    pub oeffentliche_url: String,
    pub max_foto_bytes: usize,
}

impl Default for SpeicherEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: "data/fotos".into(),
            oeffentliche_url: "/fotos".into(),
            max_foto_bytes: MAX_FOTO_BYTES,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    pub url: String,
    pub max_verbindungen: u32,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
        }
    }
}

/// Lokaler Speicher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LokalEinstellungen {
    /// JSON-Datei; ohne Pfad wird nur im Speicher gehalten
    pub pfad: Option<String>,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter: "trace", "debug", "info", "warn", "error" oder Direktiven
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl BlogChatConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn chat_konfig(&self) -> ChatKonfig {
        ChatKonfig {
            cooldown: Cooldown::sekunden(self.chat.cooldown_secs),
            seitengroesse: self.chat.seitengroesse,
            max_nachrichtenlaenge: self.chat.max_nachrichtenlaenge,
            antwort_vorschau_zeichen: self.chat.antwort_vorschau_zeichen,
            kontakt: self.kommentare.kontakt.clone(),
        }
    }

    pub fn kommentar_konfig(&self) -> KommentarKonfig {
        KommentarKonfig {
            cooldown: Cooldown::sekunden(self.kommentare.cooldown_secs),
            max_laenge: self.kommentare.max_laenge,
            max_foto_bytes: self.speicher.max_foto_bytes,
            kontakt: self.kommentare.kontakt.clone(),
        }
    }

    pub fn datenbank_konfig(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = BlogChatConfig::default();
        assert_eq!(cfg.chat.cooldown_secs, 10);
        assert_eq!(cfg.chat.seitengroesse, 99);
        assert_eq!(cfg.chat.max_nachrichtenlaenge, 500);
        assert_eq!(cfg.kommentare.cooldown_secs, 10);
        assert_eq!(cfg.speicher.max_foto_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.lokal.pfad.is_none());
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [chat]
            cooldown_secs = 30

            [kommentare]
            kontakt = "moderation@example.org"

            [lokal]
            pfad = "/tmp/blogchat.json"
        "#;
        let cfg: BlogChatConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.chat.cooldown_secs, 30);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.chat.seitengroesse, 99);
        assert_eq!(cfg.kommentare.max_laenge, 2000);
        assert_eq!(cfg.lokal.pfad.as_deref(), Some("/tmp/blogchat.json"));

        let chat = cfg.chat_konfig();
        assert_eq!(chat.cooldown.dauer().num_seconds(), 30);
        assert_eq!(chat.kontakt, "moderation@example.org");
        assert_eq!(cfg.kommentar_konfig().cooldown.dauer().num_seconds(), 10);
    }

    #[test]
    fn fehlende_datei_ergibt_standard() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("gibtsnicht.toml");
        let cfg = BlogChatConfig::laden(pfad.to_str().unwrap()).unwrap();
        assert_eq!(cfg.chat.cooldown_secs, 10);
    }

    #[test]
    fn kaputte_datei_meldet_pfad() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("blogchat.toml");
        std::fs::write(&pfad, "[chat\ncooldown_secs = ").unwrap();

        let err = BlogChatConfig::laden(pfad.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("blogchat.toml"));
    }
}
