use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL COLLATE NOCASE UNIQUE,
                email           TEXT NOT NULL COLLATE NOCASE UNIQUE,
                password        TEXT NOT NULL,
                role            TEXT NOT NULL DEFAULT 'user',
                protected       INTEGER NOT NULL DEFAULT 0,
                blocked_until   TEXT,
                blocked_at      TEXT,
                muted_until     TEXT,
                muted_at        TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_user ON sessions(user_id);

            CREATE TABLE invite_codes (
                code        TEXT PRIMARY KEY,
                created_at  TEXT NOT NULL,
                created_by  TEXT NOT NULL,
                used        INTEGER NOT NULL DEFAULT 0,
                used_at     TEXT
            );

            CREATE TABLE chat_messages (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT NOT NULL UNIQUE,
                author      TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                system      INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE chat_reads (
                user_id     TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                last_read   TEXT NOT NULL
            );

            CREATE TABLE help_messages (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT NOT NULL UNIQUE,
                author      TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'pending'
            );

            CREATE INDEX idx_help_author ON help_messages(author);

            CREATE TABLE streaming_logins (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                service_id  TEXT NOT NULL,
                mode        TEXT NOT NULL DEFAULT 'account',
                username    TEXT NOT NULL DEFAULT '',
                password    TEXT NOT NULL DEFAULT '',
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, service_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", LATEST_VERSION);
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
    }
}
