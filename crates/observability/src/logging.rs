//! Structured Logging via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei:
//! - `CC_LOG_LEVEL`: EnvFilter-Direktive, z.B. `debug` oder `chimecast_signaling=trace`
//! - `CC_LOG_FORMAT`: `text` oder `json`

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter};

/// sqlx loggt jede Abfrage auf `info`
const LEISE_DIREKTIVEN: &[&str] = &["sqlx=warn"];

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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
            anders => Err(format!("Unbekanntes Log-Format '{anders}'")),
        }
    }
}

fn filter_bauen(level: &str) -> EnvFilter {
    let basis = EnvFilter::try_from_env("CC_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    LEISE_DIREKTIVEN
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(basis, EnvFilter::add_directive)
}

/// Initialisiert das Logging-System genau einmal pro Prozess.
///
/// Ungueltige Werte fallen auf `info` bzw. `text` zurueck.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = filter_bauen(level);
    let format = std::env::var("CC_LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse().ok())
        .or_else(|| format.parse().ok())
        .unwrap_or_default();

    match format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        LogFormat::Text => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Prueft ein Log-Level aus der Konfigurationsdatei
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Prueft ein Log-Format aus der Konfigurationsdatei
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_pruefen() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level}");
        }
        // Gross-/Kleinschreibung zaehlt
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_parsen() {
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("JSON".parse::<LogFormat>().is_err());
        assert!(!log_format_gueltig("xml"));
    }

    #[test]
    fn filter_enthaelt_leise_direktiven() {
        let filter = filter_bauen("debug").to_string();
        assert!(filter.contains("sqlx=warn"), "{filter}");
    }
}
