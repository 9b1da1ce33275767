use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use log::{debug, error, info};
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::Request;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::structs::{Note, NoteDraft};

const SEED_COUNT: i64 = 10;

// AUTOINCREMENT keeps SQLite from handing out the rowid of a deleted note again.
const CREATE_NOTES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(250) NOT NULL,
        body TEXT NULL,
        created DATETIME NULL,
        keywords TEXT NULL
    )
"#;

// DATETIME has numeric affinity, so a client value like "20240101" comes back
// as an integer unless it is cast.
const SELECT_NOTES: &str = r#"
    SELECT id, title, body, CAST(created AS TEXT) AS created, keywords
    FROM Notes
"#;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl<'r> Responder<'r, 'static> for StoreError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        error!("{} {} failed: {}", request.method(), request.uri(), self);
        Response::build().status(Status::InternalServerError).ok()
    }
}

/// Handle to the notes database. Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct NoteStore {
    pool: SqlitePool,
}

impl NoteStore {
    /// Opens (creating if needed) the database at `url` and makes sure the
    /// `Notes` table exists.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let store = NoteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(CREATE_NOTES_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM Notes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Fills an empty table with ten dated test notes. Returns how many rows
    /// were written.
    pub async fn seed_if_empty(&self) -> StoreResult<u64> {
        if self.count().await? > 0 {
            return Ok(0);
        }

        info!("Generating test data...");
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for i in 1..=SEED_COUNT {
            let created = (now - Duration::days(i)).to_rfc3339_opts(SecondsFormat::Millis, true);
            sqlx::query("INSERT INTO Notes (title, body, created, keywords) VALUES (?1, ?2, ?3, ?4)")
                .bind(format!("Note {}", i))
                .bind(format!("This is a test note. {}/{}", i, SEED_COUNT))
                .bind(created)
                .bind("Test")
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!("Done generating test data.");

        Ok(SEED_COUNT as u64)
    }

    pub async fn list(&self) -> StoreResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(SELECT_NOTES)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(&format!("{} WHERE id = ?1", SELECT_NOTES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    pub async fn create(&self, draft: NoteDraft) -> StoreResult<Note> {
        let id = sqlx::query(
            r#"
            INSERT INTO Notes ( title, body, created, keywords )
            VALUES ( ?1, ?2, ?3, ?4 )
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.created)
        .bind(&draft.keywords)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(draft.into_note(id))
    }

    /// Overwrites every column of note `note.id`. Returns whether a row matched.
    pub async fn update(&self, note: &Note) -> StoreResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE Notes
            SET title = ?1, body = ?2, created = ?3, keywords = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&note.title)
        .bind(&note.body)
        .bind(&note.created)
        .bind(&note.keywords)
        .bind(note.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Returns whether a row matched.
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM Notes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Writes every stored note to the debug log.
    pub async fn log_contents(&self) -> StoreResult<()> {
        let now = Utc::now();
        for note in self.list().await? {
            debug!(
                "{} : {} : {} : {} : {}",
                note.id,
                note.title,
                note.body.as_deref().unwrap_or(""),
                describe_age(note.created.as_deref(), now),
                note.keywords.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_created(created: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(created) {
        return Some(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(created, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| DateTime::<Utc>::from_naive_utc_and_offset(time, Utc))
}

/// Renders `created` relative to `now`, e.g. "3 days ago". Unparseable
/// values are returned as-is.
pub fn describe_age(created: Option<&str>, now: DateTime<Utc>) -> String {
    let raw = match created {
        Some(raw) => raw,
        None => return "-".to_string(),
    };
    let time = match parse_created(raw) {
        Some(time) => time,
        None => return raw.to_string(),
    };

    match (now - time).num_days() {
        0 => "today".to_string(),
        1 => "a day ago".to_string(),
        -1 => "in a day".to_string(),
        days if days > 0 => format!("{} days ago", days),
        days => format!("in {} days", -days),
    }
}
