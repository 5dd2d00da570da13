//! SQLite-Implementierung des Raum-Verzeichnisses

use async_trait::async_trait;
use chimecast_core::{RoomId, UserId};
use sqlx::Row;

use crate::error::{ist_unique_meldung, DbError, DbResult};
use crate::models::{RaumRecord, RaumStatus};
use crate::repository::{raeume_sortieren, RaumVerzeichnis};
use crate::sqlite::{pool::SqliteDb, uuid_parsen, zeit_parsen};

#[async_trait]
impl RaumVerzeichnis for SqliteDb {
    async fn raum_erstellen(&self, raum: &RaumRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO rooms (id, name, host_id, created_at, status)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(raum.id.inner().to_string())
        .bind(&raum.name)
        .bind(raum.host_id.inner().to_string())
        .bind(raum.created_at.to_rfc3339())
        .bind(raum.status.als_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_meldung(&e.to_string()) {
                DbError::Eindeutigkeit(format!("Raum {} existiert bereits", raum.id))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tracing::debug!(raum_id = %raum.id, host_id = %raum.host_id, "Raum gespeichert");
        Ok(())
    }

    async fn raum_laden(&self, id: RoomId) -> DbResult<Option<RaumRecord>> {
        let row = sqlx::query(
            "SELECT id, name, host_id, created_at, status FROM rooms WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_raum(&r)).transpose()
    }

    async fn raum_existiert(&self, id: RoomId) -> DbResult<bool> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE id = ?")
            .bind(id.inner().to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl > 0)
    }

    async fn raeume_auflisten(&self) -> DbResult<Vec<RaumRecord>> {
        let rows = sqlx::query("SELECT id, name, host_id, created_at, status FROM rooms")
            .fetch_all(&self.pool)
            .await?;

        // Zeitstempel liegen als Text vor, daher wird in Rust sortiert statt
        // per ORDER BY auf dem String
        let mut raeume = rows
            .iter()
            .map(row_to_raum)
            .collect::<DbResult<Vec<_>>>()?;
        raeume_sortieren(&mut raeume);
        Ok(raeume)
    }
}

fn row_to_raum(row: &sqlx::sqlite::SqliteRow) -> DbResult<RaumRecord> {
    let id: String = row.try_get("id")?;
    let host_id: String = row.try_get("host_id")?;
    let created_at: String = row.try_get("created_at")?;
    let status: i64 = row.try_get("status")?;

    Ok(RaumRecord {
        id: RoomId(uuid_parsen(&id)?),
        name: row.try_get("name")?,
        host_id: UserId(uuid_parsen(&host_id)?),
        created_at: zeit_parsen(&created_at)?,
        status: RaumStatus::aus_i64(status),
    })
}
