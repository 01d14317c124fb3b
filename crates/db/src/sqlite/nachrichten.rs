//! SQLite-Implementierung des NachrichtenRepository

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::Row;

use blogchat_core::{NachrichtId, RealtimeEreignis};

use crate::error::DbResult;
use crate::models::{AntwortSnapshot, NachrichtRecord, NeueNachricht, RELATION_NACHRICHTEN};
use crate::repository::NachrichtenRepository;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{id_parsen, zeit_formatieren, zeit_parsen};

const SPALTEN: &str =
    "id, author_name, body, created_at, reply_to_id, reply_to_author, reply_to_snippet";

impl NachrichtenRepository for SqliteDb {
    async fn insert(&self, data: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let id = NachrichtId::new();
        let now = self.zeitstempel();

        sqlx::query(
            "INSERT INTO nachrichten
             (id, author_name, body, created_at, reply_to_id, reply_to_author, reply_to_snippet)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.author_name)
        .bind(data.body)
        .bind(zeit_formatieren(&now))
        .bind(data.reply_to.map(|r| r.id.to_string()))
        .bind(data.reply_to.map(|r| r.author_name.as_str()))
        .bind(data.reply_to.map(|r| r.body_snippet.as_str()))
        .execute(&self.pool)
        .await?;

        let record = NachrichtRecord {
            id,
            author_name: data.author_name.to_string(),
            body: data.body.to_string(),
            created_at: now,
            reply_to: data.reply_to.cloned(),
        };

        self.ereignis_senden(RealtimeEreignis::insert(
            RELATION_NACHRICHTEN,
            serde_json::to_value(&record)?,
        ));

        Ok(record)
    }

    async fn neueste(&self, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM nachrichten ORDER BY created_at DESC LIMIT ?");
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_nachricht).collect()
    }

    async fn aelter_als(&self, vor: DateTime<Utc>, limit: i64) -> DbResult<Vec<NachrichtRecord>> {
        let sql = format!(
            "SELECT {SPALTEN} FROM nachrichten
             WHERE created_at < ?
             ORDER BY created_at DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(zeit_formatieren(&vor))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_nachricht).collect()
    }

    async fn delete(&self, id: NachrichtId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM nachrichten WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected > 0 {
            self.ereignis_senden(RealtimeEreignis::delete(
                RELATION_NACHRICHTEN,
                json!({ "id": id }),
            ));
        }

        Ok(affected > 0)
    }

    async fn count(&self) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS anzahl FROM nachrichten")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("anzahl")?)
    }
}

fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    let id_str: String = row.try_get("id")?;
    let created_at_str: String = row.try_get("created_at")?;

    let reply_id: Option<String> = row.try_get("reply_to_id")?;
    let reply_to = match reply_id {
        Some(reply_id) => Some(AntwortSnapshot {
            id: id_parsen(&reply_id)?,
            author_name: row
                .try_get::<Option<String>, _>("reply_to_author")?
                .unwrap_or_default(),
            body_snippet: row
                .try_get::<Option<String>, _>("reply_to_snippet")?
                .unwrap_or_default(),
        }),
        None => None,
    };

    Ok(NachrichtRecord {
        id: id_parsen(&id_str)?,
        author_name: row.try_get("author_name")?,
        body: row.try_get("body")?,
        created_at: zeit_parsen(&created_at_str)?,
        reply_to,
    })
}
