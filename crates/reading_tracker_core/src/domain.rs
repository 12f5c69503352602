//! crates/reading_tracker_core/src/domain.rs
//!
//! Defines the core records of the reading tracker. The same three record kinds
//! live in the primary store and in the external mirror, with identical shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Record Kinds
//=========================================================================================

/// The three tables that take part in a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Profiles,
    UserBooks,
    ReadingSessions,
}

impl RecordKind {
    /// Copy order used by every sync phase.
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Profiles,
        RecordKind::UserBooks,
        RecordKind::ReadingSessions,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::Profiles => "profiles",
            RecordKind::UserBooks => "user_books",
            RecordKind::ReadingSessions => "reading_sessions",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

//=========================================================================================
// Profile
//=========================================================================================

/// One per user: identity fields plus declared reading preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub favorite_genres: Vec<String>,
    /// Yearly reading goal, in books.
    pub reading_goal: Option<i32>,
    /// Free-form label such as "morning" or "night".
    pub preferred_reading_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Shelf Entry
//=========================================================================================

/// Where a user is with a book on their shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    Unread,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::Unread => "unread",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reading status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ReadingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(ReadingStatus::Unread),
            "reading" => Ok(ReadingStatus::Reading),
            "finished" => Ok(ReadingStatus::Finished),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A user's shelf entry for one catalog item ("user_book").
///
/// Catalog metadata is a denormalized snapshot taken when the book was added;
/// the remaining fields are the user's own reading state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBook {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Identifier of the item in the public catalog.
    pub book_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub published_date: Option<String>,
    pub categories: Vec<String>,
    pub status: ReadingStatus,
    pub rating: Option<i16>,
    pub notes: Option<String>,
    pub thoughts: Option<String>,
    pub tags: Vec<String>,
    /// Percentage, 0 to 100.
    pub progress: Option<i32>,
    pub time_spent_minutes: i32,
    pub date_added: DateTime<Utc>,
    pub date_started: Option<DateTime<Utc>>,
    pub date_finished: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Reading Session
//=========================================================================================

/// One timed reading interval logged against a shelf entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub duration_minutes: i32,
    pub pages_read: Option<i32>,
    pub notes: Option<String>,
    pub session_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Record Behaviour Shared by All Kinds
//=========================================================================================

/// Common surface of the three record kinds, used by the conflict policy.
pub trait SyncRecord: Clone {
    fn id(&self) -> Uuid;
    fn user_id(&self) -> Uuid;

    /// Returns `incoming` with this record's key and creation timestamp.
    fn merge_from(&self, incoming: &Self) -> Self;
}

impl SyncRecord for Profile {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn merge_from(&self, incoming: &Self) -> Self {
        Profile {
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            ..incoming.clone()
        }
    }
}

impl SyncRecord for UserBook {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn merge_from(&self, incoming: &Self) -> Self {
        UserBook {
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            ..incoming.clone()
        }
    }
}

impl SyncRecord for ReadingSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn merge_from(&self, incoming: &Self) -> Self {
        ReadingSession {
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            ..incoming.clone()
        }
    }
}

/// A row of any kind, as moved between stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncRow {
    Profile(Profile),
    UserBook(UserBook),
    ReadingSession(ReadingSession),
}

impl SyncRow {
    pub fn kind(&self) -> RecordKind {
        match self {
            SyncRow::Profile(_) => RecordKind::Profiles,
            SyncRow::UserBook(_) => RecordKind::UserBooks,
            SyncRow::ReadingSession(_) => RecordKind::ReadingSessions,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            SyncRow::Profile(r) => r.id,
            SyncRow::UserBook(r) => r.id,
            SyncRow::ReadingSession(r) => r.id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            SyncRow::Profile(r) => r.user_id,
            SyncRow::UserBook(r) => r.user_id,
            SyncRow::ReadingSession(r) => r.user_id,
        }
    }
}

impl From<Profile> for SyncRow {
    fn from(record: Profile) -> Self {
        SyncRow::Profile(record)
    }
}

impl From<UserBook> for SyncRow {
    fn from(record: UserBook) -> Self {
        SyncRow::UserBook(record)
    }
}

impl From<ReadingSession> for SyncRow {
    fn from(record: ReadingSession) -> Self {
        SyncRow::ReadingSession(record)
    }
}

//=========================================================================================
// Chat
//=========================================================================================

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn of the reading-companion chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}
