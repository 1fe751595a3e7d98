//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split read/write pools:
//! raw queries, private Row structs, reads on the reader pool and every write on the
//! single-connection writer pool.

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::chat::repository::{ChatRepository, Exchange};
use parley_types::chat::{MessageRole, Session, StoredMessage};
use parley_types::error::RepositoryError;
use sqlx::{Row, SqliteConnection};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    session_id: String,
    title: String,
    created_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        Ok(Session {
            session_id: self.session_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct MessageRow {
    id: i64,
    session_id: String,
    role: String,
    content: String,
    timestamp: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(StoredMessage {
            id: self.id,
            session_id: self.session_id,
            role,
            content: self.content,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

fn map_rows<T>(
    rows: &[sqlx::sqlite::SqliteRow],
    convert: impl Fn(&sqlx::sqlite::SqliteRow) -> Result<T, RepositoryError>,
) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(convert).collect()
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, RepositoryError> {
    SessionRow::from_row(row)
        .map_err(map_sqlx_error)?
        .into_session()
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredMessage, RepositoryError> {
    MessageRow::from_row(row)
        .map_err(map_sqlx_error)?
        .into_message()
}

async fn insert_session(
    conn: &mut SqliteConnection,
    session: &Session,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO sessions (session_id, title, created_at) VALUES (?, ?, ?)")
        .bind(&session.session_id)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return RepositoryError::DuplicateSession(session.session_id.clone());
                }
            }
            map_sqlx_error(e)
        })?;

    Ok(())
}

async fn insert_message(
    conn: &mut SqliteConnection,
    session_id: &str,
    role: MessageRole,
    content: &str,
    timestamp: DateTime<Utc>,
) -> Result<StoredMessage, RepositoryError> {
    if role == MessageRole::System {
        return Err(RepositoryError::Query(
            "system messages are not persisted".to_string(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO messages (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(role.to_string())
    .bind(content)
    .bind(format_datetime(&timestamp))
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(StoredMessage {
        id: result.last_insert_rowid(),
        session_id: session_id.to_string(),
        role,
        content: content.to_string(),
        timestamp,
    })
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &Session) -> Result<Session, RepositoryError> {
        let mut conn = self.pool.writer.acquire().await.map_err(map_sqlx_error)?;
        insert_session(&mut conn, session).await?;
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM sessions ORDER BY created_at ASC, session_id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        map_rows(&rows, session_from_row)
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<StoredMessage, RepositoryError> {
        let mut conn = self.pool.writer.acquire().await.map_err(map_sqlx_error)?;
        insert_message(&mut conn, session_id, role, content, timestamp).await
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE session_id = ? ORDER BY id ASC")
            .bind(session_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        map_rows(&rows, message_from_row)
    }

    async fn get_recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE session_id = ? ORDER BY id DESC LIMIT ?
               ) ORDER BY id ASC"#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        map_rows(&rows, message_from_row)
    }

    async fn record_exchange(
        &self,
        exchange: &Exchange<'_>,
    ) -> Result<(StoredMessage, StoredMessage), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        if let Some(session) = exchange.new_session {
            insert_session(&mut tx, session).await?;
        }

        let user = insert_message(
            &mut tx,
            exchange.session_id,
            MessageRole::User,
            exchange.user_message,
            Utc::now(),
        )
        .await?;

        let assistant = insert_message(
            &mut tx,
            exchange.session_id,
            MessageRole::Assistant,
            exchange.assistant_reply,
            Utc::now(),
        )
        .await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok((user, assistant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_session(id: &str) -> Session {
        Session {
            session_id: id.to_string(),
            title: format!("Title for {id}"),
            created_at: Utc::now(),
        }
    }

    async fn count(pool: &DatabasePool, table: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let repo = SqliteChatRepository::new(test_pool().await);

        let session = make_session("s1");
        let created = repo.create_session(&session).await.unwrap();
        assert_eq!(created.session_id, "s1");

        let found = repo.get_session("s1").await.unwrap().unwrap();
        assert_eq!(found.title, "Title for s1");
        assert_eq!(
            found.created_at.timestamp_micros(),
            session.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_none() {
        let repo = SqliteChatRepository::new(test_pool().await);
        assert!(repo.get_session("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_session_keeps_original_title() {
        let repo = SqliteChatRepository::new(test_pool().await);

        repo.create_session(&make_session("s1")).await.unwrap();

        let mut second = make_session("s1");
        second.title = "Overwritten".to_string();
        let err = repo.create_session(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateSession(id) if id == "s1"));

        let found = repo.get_session("s1").await.unwrap().unwrap();
        assert_eq!(found.title, "Title for s1");
    }

    #[tokio::test]
    async fn test_list_sessions_ordered_by_created_at() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let now = Utc::now();

        for (id, offset) in [("late", 20), ("early", 0), ("middle", 10)] {
            let session = Session {
                created_at: now + Duration::seconds(offset),
                ..make_session(id)
            };
            repo.create_session(&session).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_append_and_get_history_in_order() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.create_session(&make_session("s1")).await.unwrap();

        let m1 = repo
            .append_message("s1", MessageRole::User, "Hello", Utc::now())
            .await
            .unwrap();
        let m2 = repo
            .append_message("s1", MessageRole::Assistant, "Hi there!", Utc::now())
            .await
            .unwrap();
        assert!(m1.id < m2.id);

        let history = repo.get_history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, m1.id);
        assert_eq!(history[0].content, "Hello");
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, "Hi there!");
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_is_empty() {
        let repo = SqliteChatRepository::new(test_pool().await);
        assert!(repo.get_history("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_rejected() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let err = repo
            .append_message("ghost", MessageRole::User, "boo", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_system_messages_not_persisted() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        repo.create_session(&make_session("s1")).await.unwrap();

        let err = repo
            .append_message("s1", MessageRole::System, "be terse", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
        assert_eq!(count(&pool, "messages").await, 0);
    }

    #[tokio::test]
    async fn test_recent_messages_returns_tail_oldest_first() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.create_session(&make_session("s1")).await.unwrap();
        repo.create_session(&make_session("other")).await.unwrap();

        for i in 0..8 {
            let role = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            repo.append_message("s1", role, &format!("m{i}"), Utc::now())
                .await
                .unwrap();
            repo.append_message("other", MessageRole::User, "noise", Utc::now())
                .await
                .unwrap();
        }

        let recent = repo.get_recent_messages("s1", 5).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6", "m7"]);

        let all = repo.get_recent_messages("s1", 50).await.unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_record_exchange_creates_session_and_messages() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let session = make_session("s1");

        let (user, assistant) = repo
            .record_exchange(&Exchange {
                new_session: Some(&session),
                session_id: "s1",
                user_message: "hello",
                assistant_reply: "hi!",
            })
            .await
            .unwrap();

        assert!(user.id < assistant.id);
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(assistant.content, "hi!");
        assert_eq!(count(&pool, "sessions").await, 1);
        assert_eq!(count(&pool, "messages").await, 2);
    }

    #[tokio::test]
    async fn test_record_exchange_stamps_each_message_on_insert() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session("s1");

        let before = Utc::now();
        let (user, assistant) = repo
            .record_exchange(&Exchange {
                new_session: Some(&session),
                session_id: "s1",
                user_message: "hello",
                assistant_reply: "hi!",
            })
            .await
            .unwrap();
        let after = Utc::now();

        assert!(before <= user.timestamp);
        assert!(user.timestamp <= assistant.timestamp);
        assert!(assistant.timestamp <= after);

        let stored = repo.get_history("s1").await.unwrap();
        assert!(stored[0].timestamp <= stored[1].timestamp);
    }

    #[tokio::test]
    async fn test_record_exchange_rolls_back_on_duplicate_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let session = make_session("s1");
        repo.create_session(&session).await.unwrap();

        let err = repo
            .record_exchange(&Exchange {
                new_session: Some(&session),
                session_id: "s1",
                user_message: "hello",
                assistant_reply: "hi!",
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateSession(_)));
        assert_eq!(count(&pool, "messages").await, 0);
    }

    #[tokio::test]
    async fn test_record_exchange_for_existing_session() {
        let repo = SqliteChatRepository::new(test_pool().await);
        repo.create_session(&make_session("s1")).await.unwrap();

        for (user, reply) in [("hello", "reply1"), ("again", "reply2")] {
            repo.record_exchange(&Exchange {
                new_session: None,
                session_id: "s1",
                user_message: user,
                assistant_reply: reply,
            })
            .await
            .unwrap();
        }

        let contents: Vec<String> = repo
            .get_history("s1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["hello", "reply1", "again", "reply2"]);
    }

    #[test]
    fn test_datetime_format_is_fixed_width() {
        let a = format_datetime(&DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let b = format_datetime(&DateTime::from_timestamp(1_700_000_000, 123_456_000).unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_datetime(&b).unwrap().timestamp_subsec_micros(), 123_456);
    }
}
