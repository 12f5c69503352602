//! services/api/src/adapters/sql.rs
//!
//! SQL shared by the primary and the external Postgres stores. Both databases
//! hold the same three tables with the same columns, so reads and upserts are
//! issued from here with identical statements.

use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{Profile, ReadingSession, RecordKind, SyncRow, UserBook};
use reading_tracker_core::ports::{PortError, PortResult};
use reading_tracker_core::sync::ConflictPolicy;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

//=========================================================================================
// Column Lists and Statements
//=========================================================================================

const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "username",
    "email",
    "favorite_genres",
    "reading_goal",
    "preferred_reading_time",
    "created_at",
    "updated_at",
];

const USER_BOOK_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "book_id",
    "title",
    "authors",
    "description",
    "cover_url",
    "page_count",
    "published_date",
    "categories",
    "status",
    "rating",
    "notes",
    "thoughts",
    "tags",
    "progress",
    "time_spent_minutes",
    "date_added",
    "date_started",
    "date_finished",
    "created_at",
    "updated_at",
];

const READING_SESSION_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "user_book_id",
    "duration_minutes",
    "pages_read",
    "notes",
    "session_date",
    "created_at",
];

/// Columns an upsert never rewrites on conflict.
const KEY_COLUMNS: &[&str] = &["id", "user_id", "created_at"];

pub fn columns(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Profiles => PROFILE_COLUMNS,
        RecordKind::UserBooks => USER_BOOK_COLUMNS,
        RecordKind::ReadingSessions => READING_SESSION_COLUMNS,
    }
}

pub fn mutable_columns(kind: RecordKind) -> Vec<&'static str> {
    columns(kind)
        .iter()
        .copied()
        .filter(|col| !KEY_COLUMNS.contains(col))
        .collect()
}

pub fn select_statement(kind: RecordKind) -> String {
    format!(
        "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        columns(kind).join(", "),
        kind.table_name()
    )
}

pub fn upsert_statement(kind: RecordKind, policy: ConflictPolicy) -> String {
    let cols = columns(kind);
    let placeholders = (1..=cols.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({}) {}",
        kind.table_name(),
        cols.join(", "),
        placeholders,
        policy.conflict_clause(&mutable_columns(kind))
    )
}

/// Mirror tables for the external store. Same columns as the primary schema,
/// without foreign keys so tables can be provisioned in any order.
pub const MIRROR_SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS profiles (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        username TEXT,
        email TEXT,
        favorite_genres TEXT[] NOT NULL DEFAULT '{}',
        reading_goal INTEGER,
        preferred_reading_time TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_books (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        book_id TEXT NOT NULL,
        title TEXT NOT NULL,
        authors TEXT[] NOT NULL DEFAULT '{}',
        description TEXT,
        cover_url TEXT,
        page_count INTEGER,
        published_date TEXT,
        categories TEXT[] NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'unread',
        rating SMALLINT,
        notes TEXT,
        thoughts TEXT,
        tags TEXT[] NOT NULL DEFAULT '{}',
        progress INTEGER,
        time_spent_minutes INTEGER NOT NULL DEFAULT 0,
        date_added TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        date_started TIMESTAMPTZ,
        date_finished TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reading_sessions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        user_book_id UUID NOT NULL,
        duration_minutes INTEGER NOT NULL,
        pages_read INTEGER,
        notes TEXT,
        session_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS user_books_user_id_idx ON user_books (user_id)",
    "CREATE INDEX IF NOT EXISTS reading_sessions_user_id_idx ON reading_sessions (user_id)",
];

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    user_id: Uuid,
    username: Option<String>,
    email: Option<String>,
    favorite_genres: Vec<String>,
    reading_goal: Option<i32>,
    preferred_reading_time: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            favorite_genres: self.favorite_genres,
            reading_goal: self.reading_goal,
            preferred_reading_time: self.preferred_reading_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserBookRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: String,
    title: String,
    authors: Vec<String>,
    description: Option<String>,
    cover_url: Option<String>,
    page_count: Option<i32>,
    published_date: Option<String>,
    categories: Vec<String>,
    status: String,
    rating: Option<i16>,
    notes: Option<String>,
    thoughts: Option<String>,
    tags: Vec<String>,
    progress: Option<i32>,
    time_spent_minutes: i32,
    date_added: DateTime<Utc>,
    date_started: Option<DateTime<Utc>>,
    date_finished: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserBookRecord {
    fn to_domain(self) -> PortResult<UserBook> {
        let status = self
            .status
            .parse()
            .map_err(|e| PortError::Unexpected(format!("user_book {}: {}", self.id, e)))?;
        Ok(UserBook {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            title: self.title,
            authors: self.authors,
            description: self.description,
            cover_url: self.cover_url,
            page_count: self.page_count,
            published_date: self.published_date,
            categories: self.categories,
            status,
            rating: self.rating,
            notes: self.notes,
            thoughts: self.thoughts,
            tags: self.tags,
            progress: self.progress,
            time_spent_minutes: self.time_spent_minutes,
            date_added: self.date_added,
            date_started: self.date_started,
            date_finished: self.date_finished,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ReadingSessionRecord {
    id: Uuid,
    user_id: Uuid,
    user_book_id: Uuid,
    duration_minutes: i32,
    pages_read: Option<i32>,
    notes: Option<String>,
    session_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}
impl ReadingSessionRecord {
    fn to_domain(self) -> ReadingSession {
        ReadingSession {
            id: self.id,
            user_id: self.user_id,
            user_book_id: self.user_book_id,
            duration_minutes: self.duration_minutes,
            pages_read: self.pages_read,
            notes: self.notes,
            session_date: self.session_date,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// Queries
//=========================================================================================

/// Reads every row of `kind` owned by `user_id`.
pub async fn fetch_rows(pool: &PgPool, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>> {
    let sql = select_statement(kind);
    let rows: Vec<SyncRow> = match kind {
        RecordKind::Profiles => sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into_iter()
            .map(|r| SyncRow::Profile(r.to_domain()))
            .collect(),
        RecordKind::UserBooks => sqlx::query_as::<_, UserBookRecord>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into_iter()
            .map(|r| r.to_domain().map(SyncRow::UserBook))
            .collect::<PortResult<Vec<_>>>()?,
        RecordKind::ReadingSessions => sqlx::query_as::<_, ReadingSessionRecord>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into_iter()
            .map(|r| SyncRow::ReadingSession(r.to_domain()))
            .collect(),
    };
    Ok(rows)
}

/// Upserts one row keyed by `id`. Returns `false` if the conflict policy left
/// the stored row unchanged.
pub async fn upsert_row(pool: &PgPool, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool> {
    let sql = upsert_statement(row.kind(), policy);
    let result = bind_row(sqlx::query(&sql), row)
        .execute(pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok(result.rows_affected() > 0)
}

/// Binds the row's values in the order given by [`columns`].
fn bind_row<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q SyncRow,
) -> Query<'q, Postgres, PgArguments> {
    match row {
        SyncRow::Profile(p) => query
            .bind(p.id)
            .bind(p.user_id)
            .bind(&p.username)
            .bind(&p.email)
            .bind(&p.favorite_genres)
            .bind(p.reading_goal)
            .bind(&p.preferred_reading_time)
            .bind(p.created_at)
            .bind(p.updated_at),
        SyncRow::UserBook(b) => query
            .bind(b.id)
            .bind(b.user_id)
            .bind(&b.book_id)
            .bind(&b.title)
            .bind(&b.authors)
            .bind(&b.description)
            .bind(&b.cover_url)
            .bind(b.page_count)
            .bind(&b.published_date)
            .bind(&b.categories)
            .bind(b.status.as_str())
            .bind(b.rating)
            .bind(&b.notes)
            .bind(&b.thoughts)
            .bind(&b.tags)
            .bind(b.progress)
            .bind(b.time_spent_minutes)
            .bind(b.date_added)
            .bind(b.date_started)
            .bind(b.date_finished)
            .bind(b.created_at)
            .bind(b.updated_at),
        SyncRow::ReadingSession(s) => query
            .bind(s.id)
            .bind(s.user_id)
            .bind(s.user_book_id)
            .bind(s.duration_minutes)
            .bind(s.pages_read)
            .bind(&s.notes)
            .bind(s.session_date)
            .bind(s.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_everything_but_the_key_columns() {
        let sql = upsert_statement(RecordKind::ReadingSessions, ConflictPolicy::OverwriteMutable);
        assert_eq!(
            sql,
            "INSERT INTO reading_sessions (id, user_id, user_book_id, duration_minutes, pages_read, notes, session_date, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET user_book_id = EXCLUDED.user_book_id, \
             duration_minutes = EXCLUDED.duration_minutes, pages_read = EXCLUDED.pages_read, \
             notes = EXCLUDED.notes, session_date = EXCLUDED.session_date"
        );
    }

    #[test]
    fn keep_existing_renders_do_nothing() {
        let sql = upsert_statement(RecordKind::Profiles, ConflictPolicy::KeepExisting);
        assert!(sql.starts_with("INSERT INTO profiles (id, user_id, username"));
        assert!(sql.ends_with("ON CONFLICT (id) DO NOTHING"));
        assert!(sql.contains("$9)"));
    }

    #[test]
    fn placeholders_match_column_count() {
        for kind in RecordKind::ALL {
            let sql = upsert_statement(kind, ConflictPolicy::OverwriteMutable);
            let n = columns(kind).len();
            assert!(sql.contains(&format!("${n})")));
            assert!(!sql.contains(&format!("${}", n + 1)));
        }
    }

    #[test]
    fn key_columns_are_never_rewritten() {
        for kind in RecordKind::ALL {
            let mutable = mutable_columns(kind);
            for key in KEY_COLUMNS {
                assert!(!mutable.contains(key), "{} rewrites {}", kind, key);
            }
            assert_eq!(mutable.len(), columns(kind).len() - KEY_COLUMNS.len());
        }
    }

    #[test]
    fn select_is_scoped_to_one_user() {
        assert_eq!(
            select_statement(RecordKind::Profiles),
            "SELECT id, user_id, username, email, favorite_genres, reading_goal, \
             preferred_reading_time, created_at, updated_at FROM profiles \
             WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );
    }

    #[test]
    fn mirror_schema_is_idempotent() {
        for ddl in MIRROR_SCHEMA {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
    }
}
