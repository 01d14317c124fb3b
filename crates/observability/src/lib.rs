//! # blogchat-observability
//!
//! Structured Logging via tracing-subscriber (Text oder JSON), gesteuert
//! ueber Konfiguration und die Umgebungsvariablen `BC_LOG_LEVEL` und
//! `BC_LOG_FORMAT`.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
