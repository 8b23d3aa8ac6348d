use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const DB_FILE: &str = "rankd.sqlite3";
/// Keys of the saved rosters, same names the browser build used for its blobs.
pub const STATE_KEY: &str = "studentRankingSystem";
pub const TERM_STATE_KEY: &str = "studentRankingSystemSuper";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state(
            key TEXT PRIMARY KEY,
            snapshot_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // Stores created before revisions were tracked lack the column. Add and backfill.
    ensure_app_state_revision(&conn)?;

    Ok(conn)
}

#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub value: T,
    pub revision: i64,
    pub updated_at: String,
}

/// Returns `None` when nothing has been saved under `key` yet. A row that no
/// longer parses is an error; the caller decides how to degrade.
pub fn load_snapshot<T: DeserializeOwned>(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<Saved<T>>> {
    let row: Option<(String, i64, String)> = conn
        .query_row(
            "SELECT snapshot_json, revision, updated_at FROM app_state WHERE key = ?",
            [key],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .with_context(|| format!("failed to read saved {}", key))?;

    let Some((json_text, revision, updated_at)) = row else {
        return Ok(None);
    };
    let value: T = serde_json::from_str(&json_text)
        .with_context(|| format!("saved {} is not valid JSON", key))?;
    Ok(Some(Saved {
        value,
        revision,
        updated_at,
    }))
}

/// Upserts the snapshot under `key` and returns its new revision.
pub fn save_snapshot<T: Serialize>(conn: &Connection, key: &str, value: &T) -> anyhow::Result<i64> {
    let json_text = serde_json::to_string(value).context("failed to serialize snapshot")?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO app_state(key, snapshot_json, updated_at, revision)
         VALUES(?, ?, ?, 1)
         ON CONFLICT(key) DO UPDATE SET
           snapshot_json = excluded.snapshot_json,
           updated_at = excluded.updated_at,
           revision = app_state.revision + 1",
        (key, &json_text, &now),
    )
    .with_context(|| format!("failed to save {}", key))?;

    let revision: i64 = conn.query_row(
        "SELECT revision FROM app_state WHERE key = ?",
        [key],
        |r| r.get(0),
    )?;
    Ok(revision)
}

pub fn clear_snapshot(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM app_state WHERE key = ?", [key])
        .with_context(|| format!("failed to clear saved {}", key))?;
    Ok(())
}

fn ensure_app_state_revision(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "app_state", "revision")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE app_state ADD COLUMN revision INTEGER NOT NULL DEFAULT 1",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Roster;
    use crate::term_roster::TermRoster;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn empty_store_loads_nothing() {
        let ws = temp_dir("rankd-db-empty");
        let conn = open_db(&ws).expect("open");
        assert!(load_snapshot::<Roster>(&conn, STATE_KEY)
            .expect("load")
            .is_none());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn save_load_and_clear() {
        let ws = temp_dir("rankd-db-save");
        let conn = open_db(&ws).expect("open");

        let roster = Roster::default().add_student().rename_student(0, "Asha");
        assert_eq!(save_snapshot(&conn, STATE_KEY, &roster).expect("save"), 1);
        assert_eq!(save_snapshot(&conn, STATE_KEY, &roster).expect("save again"), 2);

        let saved: Saved<Roster> = load_snapshot(&conn, STATE_KEY).expect("load").expect("row");
        assert_eq!(saved.value, roster);
        assert_eq!(saved.revision, 2);
        assert!(!saved.updated_at.is_empty());

        clear_snapshot(&conn, STATE_KEY).expect("clear");
        assert!(load_snapshot::<Roster>(&conn, STATE_KEY)
            .expect("load")
            .is_none());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn garbage_row_is_an_error() {
        let ws = temp_dir("rankd-db-garbage");
        let conn = open_db(&ws).expect("open");
        conn.execute(
            "INSERT INTO app_state(key, snapshot_json, updated_at) VALUES(?, 'not json', 'x')",
            [STATE_KEY],
        )
        .expect("insert");
        assert!(load_snapshot::<Roster>(&conn, STATE_KEY).is_err());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn term_roster_has_its_own_row() {
        let ws = temp_dir("rankd-db-term");
        let conn = open_db(&ws).expect("open");

        let roster = Roster::default().add_student();
        let term = TermRoster::default().add_student().add_student();
        save_snapshot(&conn, STATE_KEY, &roster).expect("save roster");
        assert_eq!(save_snapshot(&conn, TERM_STATE_KEY, &term).expect("save term"), 1);

        let saved: Saved<TermRoster> = load_snapshot(&conn, TERM_STATE_KEY)
            .expect("load")
            .expect("row");
        assert_eq!(saved.value, term);

        clear_snapshot(&conn, TERM_STATE_KEY).expect("clear");
        assert!(load_snapshot::<TermRoster>(&conn, TERM_STATE_KEY)
            .expect("load")
            .is_none());
        let kept: Saved<Roster> = load_snapshot(&conn, STATE_KEY).expect("load").expect("row");
        assert_eq!(kept.value, roster);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn reopen_adds_missing_revision_column() {
        let ws = temp_dir("rankd-db-migrate");
        {
            let conn = Connection::open(ws.join(DB_FILE)).expect("open raw");
            conn.execute(
                "CREATE TABLE app_state(
                    key TEXT PRIMARY KEY,
                    snapshot_json TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )
            .expect("create old table");
        }
        let conn = open_db(&ws).expect("open");
        assert!(table_has_column(&conn, "app_state", "revision").expect("columns"));
        let _ = std::fs::remove_dir_all(ws);
    }
}
