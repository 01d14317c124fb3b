//! SQLite-Implementierung des KommentarRepository

use sqlx::Row;

use blogchat_core::{KommentarId, RealtimeEreignis};

use crate::error::{DbError, DbResult};
use crate::models::{KommentarRecord, NeuerKommentar, RELATION_KOMMENTARE};
use crate::repository::KommentarRepository;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{id_parsen, zeit_formatieren, zeit_parsen};

const SPALTEN: &str = "id, post_id, ip_address, author_name, body, photo_path, created_at";

impl SqliteDb {
    async fn kommentare_abfragen(&self, filter: &str, wert: &str) -> DbResult<Vec<KommentarRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM kommentare WHERE {filter} = ? ORDER BY created_at ASC");
        let rows = sqlx::query(&sql).bind(wert).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_kommentar).collect()
    }
}

impl KommentarRepository for SqliteDb {
    async fn insert(&self, data: NeuerKommentar<'_>) -> DbResult<KommentarRecord> {
        let id = KommentarId::new();
        let now = self.zeitstempel();

        // Ohne Benutzerzeile zur IP wird nichts eingefuegt; ein geloeschter
        // Benutzer kann so keine Kommentare mehr hinterlassen
        let affected = sqlx::query(
            "INSERT INTO kommentare (id, post_id, ip_address, author_name, body, photo_path, created_at)
             SELECT ?, ?, ?, ?, ?, ?, ?
             WHERE EXISTS (SELECT 1 FROM benutzer WHERE ip_address = ?)",
        )
        .bind(id.to_string())
        .bind(data.post_id)
        .bind(data.ip_address)
        .bind(data.author_name)
        .bind(data.body)
        .bind(data.photo_path)
        .bind(zeit_formatieren(&now))
        .bind(data.ip_address)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!(
                "Benutzer fuer IP {}",
                data.ip_address
            )));
        }

        let record = KommentarRecord {
            id,
            post_id: data.post_id.to_string(),
            ip_address: data.ip_address.to_string(),
            author_name: data.author_name.to_string(),
            body: data.body.to_string(),
            photo_path: data.photo_path.map(str::to_string),
            created_at: now,
        };

        self.ereignis_senden(RealtimeEreignis::insert(
            RELATION_KOMMENTARE,
            serde_json::to_value(&record)?,
        ));

        Ok(record)
    }

    async fn get(&self, id: KommentarId) -> DbResult<Option<KommentarRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM kommentare WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_kommentar(&r)).transpose()
    }

    async fn list_by_post(&self, post_id: &str) -> DbResult<Vec<KommentarRecord>> {
        self.kommentare_abfragen("post_id", post_id).await
    }

    async fn list_by_ip(&self, ip: &str) -> DbResult<Vec<KommentarRecord>> {
        self.kommentare_abfragen("ip_address", ip).await
    }

    async fn delete(&self, id: KommentarId) -> DbResult<bool> {
        let sql = format!("DELETE FROM kommentare WHERE id = ? RETURNING {SPALTEN}");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(false);
        };
        let alt = row_to_kommentar(&row)?;
        self.ereignis_senden(RealtimeEreignis::delete(
            RELATION_KOMMENTARE,
            serde_json::to_value(&alt)?,
        ));
        Ok(true)
    }

    async fn delete_by_ip(&self, ip: &str) -> DbResult<Vec<KommentarRecord>> {
        let sql = format!("DELETE FROM kommentare WHERE ip_address = ? RETURNING {SPALTEN}");
        let rows = sqlx::query(&sql).bind(ip).fetch_all(&self.pool).await?;
        let alte = rows
            .iter()
            .map(row_to_kommentar)
            .collect::<DbResult<Vec<_>>>()?;

        for alt in &alte {
            self.ereignis_senden(RealtimeEreignis::delete(
                RELATION_KOMMENTARE,
                serde_json::to_value(alt)?,
            ));
        }

        Ok(alte)
    }

    async fn update_author_by_ip(&self, ip: &str, author_name: &str) -> DbResult<u64> {
        let affected = sqlx::query("UPDATE kommentare SET author_name = ? WHERE ip_address = ?")
            .bind(author_name)
            .bind(ip)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected > 0 {
            for neu in self.list_by_ip(ip).await? {
                self.ereignis_senden(RealtimeEreignis::update(
                    RELATION_KOMMENTARE,
                    serde_json::to_value(&neu)?,
                    None,
                ));
            }
        }

        Ok(affected)
    }

    async fn count_by_ip(&self, ip: &str) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS anzahl FROM kommentare WHERE ip_address = ?")
            .bind(ip)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("anzahl")?)
    }
}

fn row_to_kommentar(row: &sqlx::sqlite::SqliteRow) -> DbResult<KommentarRecord> {
    let id_str: String = row.try_get("id")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(KommentarRecord {
        id: id_parsen(&id_str)?,
        post_id: row.try_get("post_id")?,
        ip_address: row.try_get("ip_address")?,
        author_name: row.try_get("author_name")?,
        body: row.try_get("body")?,
        photo_path: row.try_get("photo_path")?,
        created_at: zeit_parsen(&created_at_str)?,
    })
}
