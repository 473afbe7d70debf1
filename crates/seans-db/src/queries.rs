use crate::Database;
use crate::models::{
    ChatPost, NewUser, Registration, SessionRow, SessionStart, UserRow, format_timestamp,
    opt_timestamp, parsed, timestamp, uuid,
};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use seans_types::models::{ChatMessage, HelpMessage, HelpStatus, InviteCode, StreamingLogin};
use uuid::Uuid;

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn_mut(|conn| insert_user(conn, user))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users ORDER BY created_at, username", UserRow::COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no user matched.
    pub fn set_password(&self, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE username = ?1",
                params![username, password_hash],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_block(
        &self,
        username: &str,
        until: Option<DateTime<Utc>>,
        at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET blocked_until = ?2, blocked_at = ?3 WHERE username = ?1",
                params![username, until.map(format_timestamp), at.map(format_timestamp)],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_mute(
        &self,
        username: &str,
        until: Option<DateTime<Utc>>,
        at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET muted_until = ?2, muted_at = ?3 WHERE username = ?1",
                params![username, until.map(format_timestamp), at.map(format_timestamp)],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the user; sessions, read markers and streaming logins cascade.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(changed > 0)
        })
    }

    /// Inserts a seed account unless one with the same username exists.
    /// An existing record keeps its password and moderation state but is
    /// always marked protected admin. Returns true when a row was inserted.
    /// Fails when the seed email already belongs to another user.
    pub fn ensure_seed_user(&self, user: &NewUser<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(owner) = query_user(&tx, "email", user.email)? {
                if !owner.username.eq_ignore_ascii_case(user.username) {
                    bail!(
                        "Seed account '{}': email {} already belongs to user '{}'",
                        user.username,
                        user.email,
                        owner.username
                    );
                }
            }

            let inserted = query_user(&tx, "username", user.username)?.is_none();
            if inserted {
                insert_user(&tx, user)?;
            }
            tx.execute(
                "UPDATE users SET role = 'admin', protected = 1 WHERE username = ?1",
                [user.username],
            )?;
            tx.commit()?;
            Ok(inserted)
        })
    }

    /// Sets a block, ends the user's sessions and posts `notice`, all in
    /// one transaction. Returns the number of revoked sessions, or `None`
    /// when the user no longer exists.
    pub fn block_user(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
        notice: &ChatMessage,
    ) -> Result<Option<usize>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE users SET blocked_until = ?2, blocked_at = ?3 WHERE id = ?1",
                params![user_id, format_timestamp(until), format_timestamp(at)],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let revoked = tx.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
            insert_chat(&tx, notice)?;
            tx.commit()?;
            Ok(Some(revoked))
        })
    }

    /// Sets a mute and posts `notice` in one transaction. Returns false when
    /// the user no longer exists.
    pub fn mute_user(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
        notice: &ChatMessage,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE users SET muted_until = ?2, muted_at = ?3 WHERE id = ?1",
                params![user_id, format_timestamp(until), format_timestamp(at)],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            insert_chat(&tx, notice)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Creates a user and consumes an invite code in one transaction.
    /// The invite matches case-insensitively among unused codes.
    pub fn register_with_invite(
        &self,
        user: &NewUser<'_>,
        invite_code: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Registration> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, "username", user.username)?.is_some() {
                return Ok(Registration::UsernameTaken);
            }
            if query_user(&tx, "email", user.email)?.is_some() {
                return Ok(Registration::EmailTaken);
            }

            let code: Option<String> = tx
                .query_row(
                    "SELECT code FROM invite_codes
                     WHERE code = ?1 COLLATE NOCASE AND used = 0
                     ORDER BY created_at LIMIT 1",
                    [invite_code],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(code) = code else {
                return Ok(Registration::InviteRejected);
            };

            tx.execute(
                "UPDATE invite_codes SET used = 1, used_at = ?2 WHERE code = ?1",
                params![code, format_timestamp(used_at)],
            )?;
            insert_user(&tx, user)?;
            tx.commit()?;
            Ok(Registration::Created)
        })
    }

    // -- Sessions --

    /// Opens session `id` unless the user is blocked at `now`. The block is
    /// read under the same lock as the insert, so a block committed first
    /// always wins and a block committed later revokes the new session. An
    /// expired block is cleared and the chat is marked read for the user.
    pub fn open_session(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> Result<SessionStart> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(user) = query_user(&tx, "id", user_id)? else {
                return Ok(SessionStart::UserGone);
            };

            let cleared_block = match user.blocked_until {
                Some(until) if until > now => return Ok(SessionStart::Blocked { until }),
                Some(_) => {
                    tx.execute(
                        "UPDATE users SET blocked_until = NULL, blocked_at = NULL WHERE id = ?1",
                        [user_id],
                    )?;
                    true
                }
                None => false,
            };

            tx.execute(
                "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![id.to_string(), user_id, format_timestamp(now)],
            )?;
            if let Some(latest) = query_latest_chat(&tx)? {
                upsert_chat_read(&tx, user_id, latest.created_at)?;
            }

            tx.commit()?;
            Ok(SessionStart::Opened { cleared_block })
        })
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                    [id.to_string()],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            created_at: timestamp(row, 2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    pub fn delete_sessions_for_user(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
            Ok(changed)
        })
    }

    // -- Invite codes --

    pub fn insert_invite_code(&self, invite: &InviteCode) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO invite_codes (code, created_at, created_by, used, used_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    invite.code,
                    format_timestamp(invite.created_at),
                    invite.created_by,
                    invite.used,
                    invite.used_at.map(format_timestamp)
                ],
            )?;
            Ok(())
        })
    }

    /// Exact (case-sensitive) lookup, used to keep generated codes unique.
    pub fn invite_code_exists(&self, code: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM invite_codes WHERE code = ?1", [code], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_invite_codes(&self) -> Result<Vec<InviteCode>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT code, created_at, created_by, used, used_at
                 FROM invite_codes ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(InviteCode {
                        code: row.get(0)?,
                        created_at: timestamp(row, 1)?,
                        created_by: row.get(2)?,
                        used: row.get(3)?,
                        used_at: opt_timestamp(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_invite_code(&self, code: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM invite_codes WHERE code = ?1", [code])?;
            Ok(changed > 0)
        })
    }

    // -- Chat --

    pub fn insert_chat_message(&self, message: &ChatMessage) -> Result<()> {
        self.with_conn_mut(|conn| insert_chat(conn, message))
    }

    /// Posts `message` for `user_id` unless the user is muted at `now`, and
    /// marks the chat read for them. An expired mute is cleared first and
    /// `unmute_notice` is posted ahead of the message.
    pub fn post_chat_message(
        &self,
        user_id: &str,
        message: &ChatMessage,
        unmute_notice: &ChatMessage,
        now: DateTime<Utc>,
    ) -> Result<ChatPost> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(user) = query_user(&tx, "id", user_id)? else {
                return Ok(ChatPost::UserGone);
            };

            let lifted_mute = match user.muted_until {
                Some(until) if until > now => return Ok(ChatPost::Muted { until }),
                Some(_) => {
                    tx.execute(
                        "UPDATE users SET muted_until = NULL, muted_at = NULL WHERE id = ?1",
                        [user_id],
                    )?;
                    insert_chat(&tx, unmute_notice)?;
                    true
                }
                None => false,
            };

            insert_chat(&tx, message)?;
            upsert_chat_read(&tx, user_id, message.created_at)?;
            tx.commit()?;
            Ok(ChatPost::Posted { lifted_mute })
        })
    }

    /// Messages in posting order. With a limit, the newest `limit` messages
    /// are returned, still oldest first.
    pub fn list_chat_messages(&self, limit: Option<u32>) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author, text, created_at, system FROM (
                    SELECT seq, id, author, text, created_at, system
                    FROM chat_messages ORDER BY seq DESC LIMIT ?1
                 ) ORDER BY seq ASC",
            )?;
            let limit = limit.map(i64::from).unwrap_or(-1);
            let rows = stmt
                .query_map([limit], chat_message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn latest_chat_message(&self) -> Result<Option<ChatMessage>> {
        self.with_conn(query_latest_chat)
    }

    pub fn delete_chat_message(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed =
                conn.execute("DELETE FROM chat_messages WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    pub fn get_chat_read(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT last_read FROM chat_reads WHERE user_id = ?1",
                    [user_id],
                    |row| timestamp(row, 0),
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Moves the user's read marker to the latest message, if any.
    pub fn mark_chat_read(&self, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            if let Some(latest) = query_latest_chat(conn)? {
                upsert_chat_read(conn, user_id, latest.created_at)?;
            }
            Ok(())
        })
    }

    // -- Help desk --

    pub fn insert_help_message(&self, message: &HelpMessage) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO help_messages (id, author, text, created_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.to_string(),
                    message.author,
                    message.text,
                    format_timestamp(message.created_at),
                    message.status.as_str()
                ],
            )?;
            Ok(())
        })
    }

    /// All help messages, or only those written by `author`.
    pub fn list_help_messages(&self, author: Option<&str>) -> Result<Vec<HelpMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author, text, created_at, status FROM help_messages
                 WHERE ?1 IS NULL OR author = ?1 COLLATE NOCASE
                 ORDER BY seq",
            )?;
            let rows = stmt
                .query_map([author], |row| {
                    Ok(HelpMessage {
                        id: uuid(row, 0)?,
                        author: row.get(1)?,
                        text: row.get(2)?,
                        created_at: timestamp(row, 3)?,
                        status: parsed(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_help_status(&self, id: Uuid, status: HelpStatus) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE help_messages SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status.as_str()],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_help_message(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed =
                conn.execute("DELETE FROM help_messages WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    // -- Streaming logins --

    pub fn upsert_streaming_login(&self, user_id: &str, login: &StreamingLogin) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO streaming_logins (user_id, service_id, mode, username, password, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, service_id) DO UPDATE SET
                    mode = excluded.mode,
                    username = excluded.username,
                    password = excluded.password,
                    updated_at = excluded.updated_at",
                params![
                    user_id,
                    login.service_id,
                    login.mode.as_str(),
                    login.username,
                    login.password,
                    format_timestamp(login.updated_at)
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_streaming_logins(&self, user_id: &str) -> Result<Vec<StreamingLogin>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT service_id, mode, username, password, updated_at
                 FROM streaming_logins WHERE user_id = ?1 ORDER BY service_id",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(StreamingLogin {
                        service_id: row.get(0)?,
                        mode: parsed(row, 1)?,
                        username: row.get(2)?,
                        password: row.get(3)?,
                        updated_at: timestamp(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_streaming_login(&self, user_id: &str, service_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM streaming_logins WHERE user_id = ?1 AND service_id = ?2",
                [user_id, service_id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password, role, protected, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.protected,
            format_timestamp(user.created_at)
        ],
    )?;
    Ok(())
}

/// `column` is one of the NOCASE-collated lookup keys or `id`.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", UserRow::COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], UserRow::from_row).optional()?;
    Ok(row)
}

fn insert_chat(conn: &Connection, message: &ChatMessage) -> Result<()> {
    conn.execute(
        "INSERT INTO chat_messages (id, author, text, created_at, system)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.id.to_string(),
            message.author,
            message.text,
            format_timestamp(message.created_at),
            message.system
        ],
    )?;
    Ok(())
}

fn query_latest_chat(conn: &Connection) -> Result<Option<ChatMessage>> {
    let row = conn
        .query_row(
            "SELECT id, author, text, created_at, system
             FROM chat_messages ORDER BY seq DESC LIMIT 1",
            [],
            chat_message_from_row,
        )
        .optional()?;
    Ok(row)
}

fn upsert_chat_read(conn: &Connection, user_id: &str, last_read: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO chat_reads (user_id, last_read) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET last_read = excluded.last_read",
        params![user_id, format_timestamp(last_read)],
    )?;
    Ok(())
}

fn chat_message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: uuid(row, 0)?,
        author: row.get(1)?,
        text: row.get(2)?,
        created_at: timestamp(row, 3)?,
        system: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
