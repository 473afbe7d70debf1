/// Database row types and the timestamp encoding shared by every table.
/// Rows that never leave the store without conversion live here; the rest
/// map straight into `seans-types` models.
use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use seans_types::models::{Role, UserProfile};
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub role: String,
    pub protected: bool,
    pub blocked_until: Option<DateTime<Utc>>,
    pub blocked_at: Option<DateTime<Utc>>,
    pub muted_until: Option<DateTime<Utc>>,
    pub muted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str = "id, username, email, password, role, protected, \
         blocked_until, blocked_at, muted_until, muted_at, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            role: row.get(4)?,
            protected: row.get(5)?,
            blocked_until: opt_timestamp(row, 6)?,
            blocked_at: opt_timestamp(row, 7)?,
            muted_until: opt_timestamp(row, 8)?,
            muted_at: opt_timestamp(row, 9)?,
            created_at: timestamp(row, 10)?,
        })
    }

    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn user_id(&self) -> Result<Uuid> {
        self.id
            .parse()
            .map_err(|e| anyhow!("Corrupt user id '{}': {}", self.id, e))
    }

    pub fn to_profile(&self) -> Result<UserProfile> {
        Ok(UserProfile {
            id: self.user_id()?,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role(),
            protected: self.protected,
            blocked_until: self.blocked_until,
            blocked_at: self.blocked_at,
            muted_until: self.muted_until,
            muted_at: self.muted_at,
            created_at: self.created_at,
        })
    }
}

/// Input for inserting a user row.
pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub protected: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the registration transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    UsernameTaken,
    EmailTaken,
    InviteRejected,
}

/// Outcome of opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    Opened { cleared_block: bool },
    Blocked { until: DateTime<Utc> },
    UserGone,
}

/// Outcome of posting a user's chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPost {
    Posted { lifted_mute: bool },
    Muted { until: DateTime<Utc> },
    UserGone,
}

pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Timestamps are stored as RFC 3339 UTC with microseconds so they also
/// sort correctly as text.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's datetime('now') form, without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", raw, e))
}

pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: uuid::Error| conversion_error(idx, anyhow!("Corrupt id '{}': {}", raw, e)))
}

pub(crate) fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, anyhow!(e)))
}

fn conversion_error(idx: usize, err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_keep_microseconds_and_sort_as_text() {
        let a = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(5);

        let (sa, sb) = (format_timestamp(a), format_timestamp(b));
        assert!(sa < sb);
        assert_eq!(parse_timestamp(&sb).unwrap(), b);
    }

    #[test]
    fn parses_sqlite_default_format() {
        let ts = parse_timestamp("2026-10-18 08:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 10, 18, 8, 30, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
