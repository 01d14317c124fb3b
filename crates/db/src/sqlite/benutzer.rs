//! SQLite-Implementierung des BenutzerRepository

use sqlx::Row;

use blogchat_core::BenutzerId;

use crate::error::{DbError, DbResult};
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::BenutzerRepository;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{id_parsen, zeit_formatieren, zeit_parsen};

const SPALTEN: &str = "id, ip_address, username, is_blocked, block_reason, created_at, updated_at";

impl BenutzerRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = BenutzerId::new();
        let now = self.zeitstempel();
        let now_str = zeit_formatieren(&now);

        sqlx::query(
            "INSERT INTO benutzer (id, ip_address, username, is_blocked, block_reason, created_at, updated_at)
             VALUES (?, ?, ?, 0, NULL, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.ip_address)
        .bind(data.username)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let e = DbError::from(e);
            if e.ist_eindeutigkeit() {
                DbError::Eindeutigkeit(format!("Benutzer fuer IP {}", data.ip_address))
            } else {
                e
            }
        })?;

        Ok(BenutzerRecord {
            id,
            ip_address: data.ip_address.to_string(),
            username: data.username.to_string(),
            is_blocked: false,
            block_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: BenutzerId) -> DbResult<BenutzerRecord> {
        let sql = format!("SELECT {SPALTEN} FROM benutzer WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Benutzer {id}")))?;
        row_to_benutzer(&row)
    }

    async fn get_by_ip(&self, ip: &str) -> DbResult<BenutzerRecord> {
        let sql = format!("SELECT {SPALTEN} FROM benutzer WHERE ip_address = ?");
        let row = sqlx::query(&sql)
            .bind(ip)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Benutzer fuer IP {ip}")))?;
        row_to_benutzer(&row)
    }

    async fn update_block(
        &self,
        id: BenutzerId,
        is_blocked: bool,
        reason: Option<&str>,
    ) -> DbResult<BenutzerRecord> {
        let now_str = zeit_formatieren(&self.zeitstempel());

        let affected = sqlx::query(
            "UPDATE benutzer SET is_blocked = ?, block_reason = ?, updated_at = ? WHERE id = ?",
        )
        .bind(is_blocked)
        .bind(reason)
        .bind(&now_str)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }

        BenutzerRepository::get(self, id).await
    }

    async fn rename(&self, id: BenutzerId, username: &str) -> DbResult<BenutzerRecord> {
        let now_str = zeit_formatieren(&self.zeitstempel());

        let affected = sqlx::query("UPDATE benutzer SET username = ?, updated_at = ? WHERE id = ?")
            .bind(username)
            .bind(&now_str)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }

        BenutzerRepository::get(self, id).await
    }

    async fn delete(&self, id: BenutzerId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM benutzer WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let id_str: String = row.try_get("id")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(BenutzerRecord {
        id: id_parsen(&id_str)?,
        ip_address: row.try_get("ip_address")?,
        username: row.try_get("username")?,
        is_blocked: row.try_get("is_blocked")?,
        block_reason: row.try_get("block_reason")?,
        created_at: zeit_parsen(&created_at_str)?,
        updated_at: zeit_parsen(&updated_at_str)?,
    })
}
