//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor der Konfiguration):
//! - `BC_LOG_LEVEL`: Filter-Ausdruck (`info`, `blogchat_chat=debug,warn`, ...)
//! - `BC_LOG_FORMAT`: `text` oder `json`
//!
//! Die Initialisierung ist idempotent: jeder Seitenaufruf darf sie erneut
//! anstossen, nur der erste Aufruf installiert den Subscriber.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as tfmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "BC_LOG_LEVEL";
/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "BC_LOG_FORMAT";

const STANDARD_LEVEL: &str = "info";

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(format!("Unbekanntes Log-Format: '{andere}' (erlaubt: text, json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Initialisiert das Logging-System.
///
/// `BC_LOG_LEVEL` / `BC_LOG_FORMAT` ueberschreiben `level` / `format`.
/// Ungueltige Werte fallen auf `info` / `text` zurueck. Gibt `false` zurueck
/// wenn bereits ein Subscriber installiert war.
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let (filter, format) = wirksame_einstellung(
        level,
        format,
        std::env::var(ENV_LOG_LEVEL).ok(),
        std::env::var(ENV_LOG_FORMAT).ok(),
    );

    let installiert = match format {
        LogFormat::Json => tfmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init()
            .is_ok(),
        LogFormat::Text => tfmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok(),
    };

    if installiert {
        tracing::debug!(%format, "Logging initialisiert");
    }
    installiert
}

/// Filter und Format nach Vorrang: Umgebung, dann Konfiguration, dann Standard
fn wirksame_einstellung(
    level: &str,
    format: &str,
    env_level: Option<String>,
    env_format: Option<String>,
) -> (EnvFilter, LogFormat) {
    let filter = env_level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(STANDARD_LEVEL));

    let format = env_format
        .and_then(|f| f.parse().ok())
        .or_else(|| format.parse().ok())
        .unwrap_or_default();

    (filter, format)
}
