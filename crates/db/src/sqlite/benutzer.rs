//! SQLite-Implementierung des BenutzerRepository

use async_trait::async_trait;
use chimecast_core::UserId;
use chrono::Utc;
use sqlx::Row;

use crate::error::{ist_unique_meldung, DbError, DbResult};
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::BenutzerRepository;
use crate::sqlite::{pool::SqliteDb, uuid_parsen, zeit_parsen};

#[async_trait]
impl BenutzerRepository for SqliteDb {
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = UserId::new();
        let jetzt = Utc::now();

        sqlx::query(
            "INSERT INTO users (username, id, email, name, hashed_password, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(daten.username)
        .bind(id.inner().to_string())
        .bind(daten.email)
        .bind(daten.name)
        .bind(daten.password_hash)
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_meldung(&e.to_string()) {
                DbError::Eindeutigkeit(format!(
                    "Benutzername '{}' oder E-Mail bereits vergeben",
                    daten.username
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(BenutzerRecord {
            id,
            username: daten.username.to_string(),
            email: daten.email.to_string(),
            name: daten.name.to_string(),
            password_hash: daten.password_hash.to_string(),
            created_at: jetzt,
        })
    }

    async fn laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT username, id, email, name, hashed_password, created_at
             FROM users WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn laden_nach_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT username, id, email, name, hashed_password, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(BenutzerRecord {
        id: UserId(uuid_parsen(&id)?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("hashed_password")?,
        created_at: zeit_parsen(&created_at)?,
    })
}
