//! Passwoerter der Chimecast-Konten
//!
//! In `benutzer.password_hash` steht der vollstaendige PHC-String. Da
//! Algorithmus, Kosten und Salt darin kodiert sind, prueft die Anmeldung
//! auch Hashes, die mit frueheren Kosten-Einstellungen erzeugt wurden.

use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AuthError;

/// Speicherbedarf pro Hash in KiB (64 MiB)
const SPEICHER_KIB: u32 = 64 * 1024;
const ITERATIONEN: u32 = 3;
const PARALLELITAET: u32 = 1;

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(SPEICHER_KIB, ITERATIONEN, PARALLELITAET, None)
        .map_err(|e| AuthError::PasswortHashing(format!("Kosten-Parameter: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Erzeugt den zu speichernden PHC-String fuer ein neues Konto
pub fn passwort_hashen(passwort: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(passwort.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Prueft ein Login-Passwort gegen den gespeicherten Hash
///
/// `Ok(false)` bei falschem Passwort; ein nicht lesbarer Hash im Datensatz
/// ist dagegen ein Fehler.
pub fn passwort_verifizieren(passwort: &str, gespeichert: &str) -> Result<bool, AuthError> {
    let hash = PasswordHash::new(gespeichert).map_err(|e| {
        tracing::error!(fehler = %e, "Gespeicherter Passwort-Hash nicht lesbar");
        AuthError::PasswortHashing(format!("Hash nicht lesbar: {e}"))
    })?;

    match hasher()?.verify_password(passwort.as_bytes(), &hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrierung_und_anmeldung() {
        let hash = passwort_hashen("konferenz-2024!").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"), "{hash}");
        assert!(hash.contains("m=65536,t=3,p=1"), "{hash}");

        assert!(passwort_verifizieren("konferenz-2024!", &hash).unwrap());
        assert!(!passwort_verifizieren("konferenz-2025!", &hash).unwrap());
        // Gross-/Kleinschreibung zaehlt
        assert!(!passwort_verifizieren("KONFERENZ-2024!", &hash).unwrap());
    }

    #[test]
    fn unicode_passwort() {
        let hash = passwort_hashen("Grüße aus Köln 🎧").unwrap();
        assert!(passwort_verifizieren("Grüße aus Köln 🎧", &hash).unwrap());
        assert!(!passwort_verifizieren("Grusse aus Koln", &hash).unwrap());
    }

    #[test]
    fn zwei_konten_gleiches_passwort() {
        let alice = passwort_hashen("geheim").unwrap();
        let bob = passwort_hashen("geheim").unwrap();
        assert_ne!(alice, bob, "Salt muss pro Konto neu sein");
        assert!(passwort_verifizieren("geheim", &alice).unwrap());
        assert!(passwort_verifizieren("geheim", &bob).unwrap());
    }

    #[test]
    fn hash_mit_anderen_kosten_bleibt_gueltig() {
        let salt = SaltString::generate(&mut OsRng);
        let guenstig = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(8 * 1024, 1, 1, None).unwrap(),
        );
        let alt = guenstig
            .hash_password(b"altes-konto", &salt)
            .unwrap()
            .to_string();

        assert!(passwort_verifizieren("altes-konto", &alt).unwrap());
    }

    #[test]
    fn beschaedigter_datensatz_ist_fehler() {
        let err = passwort_verifizieren("egal", "klartext-statt-hash").unwrap_err();
        assert!(matches!(err, AuthError::PasswortHashing(_)));
    }
}
