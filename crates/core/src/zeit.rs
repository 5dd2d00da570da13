//! Zeitquelle
//!
//! Sessions pruefen ihr Ablaufdatum gegen eine `Uhr`. Im Betrieb ist das
//! die Systemzeit, in Tests eine `ManuelleUhr`, die sich gezielt
//! vorstellen laesst.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Liefert die aktuelle Zeit
pub trait Uhr: Send + Sync {
    fn jetzt(&self) -> DateTime<Utc>;
}

/// Systemzeit (`Utc::now()`)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUhr;

impl Uhr for SystemUhr {
    fn jetzt(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Von Hand gestellte Uhr
#[derive(Debug)]
pub struct ManuelleUhr {
    zeit: Mutex<DateTime<Utc>>,
}

impl ManuelleUhr {
    pub fn neu(start: DateTime<Utc>) -> Self {
        Self {
            zeit: Mutex::new(start),
        }
    }

    /// Stellt die Uhr um `dauer` vor
    pub fn vorstellen(&self, dauer: Duration) {
        let mut zeit = self.zeit.lock();
        *zeit += dauer;
    }
}

impl Uhr for ManuelleUhr {
    fn jetzt(&self) -> DateTime<Utc> {
        *self.zeit.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manuelle_uhr_vorstellen() {
        let start = Utc::now();
        let uhr = ManuelleUhr::neu(start);
        assert_eq!(uhr.jetzt(), start);

        uhr.vorstellen(Duration::minutes(5));
        assert_eq!(uhr.jetzt(), start + Duration::minutes(5));
    }
}
