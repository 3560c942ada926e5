#![forbid(unsafe_code)]

mod analytics;
mod assignments;
mod available;
mod catalog;
mod error;
mod reorder;
mod requests;
mod views;

pub use error::StoreError;
pub use requests::*;

use courseline_core::ids::{CourseId, LessonId};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;
const DB_FILE_NAME: &str = "courseline.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courses (
          id TEXT PRIMARY KEY,
          title TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'active',
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lessons (
          id TEXT PRIMARY KEY,
          title TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'active',
          total_views INTEGER NOT NULL DEFAULT 0,
          unique_views INTEGER NOT NULL DEFAULT 0,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lesson_assignments (
          course_id TEXT NOT NULL,
          lesson_id TEXT NOT NULL,
          priority INTEGER NOT NULL,
          active INTEGER NOT NULL DEFAULT 1,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY(course_id, lesson_id),
          FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE,
          FOREIGN KEY(lesson_id) REFERENCES lessons(id) ON DELETE CASCADE,
          CHECK(priority > 0),
          CHECK(active IN (0, 1))
        );

        CREATE INDEX IF NOT EXISTS idx_assignments_course_priority
          ON lesson_assignments(course_id, priority);
        CREATE INDEX IF NOT EXISTS idx_assignments_course_active_priority
          ON lesson_assignments(course_id, active, priority);

        CREATE TABLE IF NOT EXISTS view_events (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          lesson_id TEXT NOT NULL,
          user_id TEXT,
          session_id TEXT,
          context_json TEXT,
          viewed_at_ms INTEGER NOT NULL,
          FOREIGN KEY(lesson_id) REFERENCES lessons(id),
          CHECK(user_id IS NOT NULL OR session_id IS NOT NULL)
        );

        CREATE INDEX IF NOT EXISTS idx_views_lesson_time
          ON view_events(lesson_id, viewed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_views_user_time
          ON view_events(user_id, viewed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_views_session_time
          ON view_events(session_id, viewed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_views_lesson_user
          ON view_events(lesson_id, user_id);
        CREATE INDEX IF NOT EXISTS idx_views_lesson_session
          ON view_events(lesson_id, session_id);
        "#,
    )?;

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO meta(key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
            Ok(())
        }
        Some(value) if value == SCHEMA_VERSION.to_string() => Ok(()),
        Some(_) => Err(StoreError::InvalidInput("schema version mismatch")),
    }
}

fn canonicalize_course(value: &str) -> Result<String, StoreError> {
    CourseId::try_new(value)
        .map(CourseId::into_string)
        .map_err(|_| StoreError::InvalidInput("invalid course id"))
}

fn canonicalize_lesson(value: &str) -> Result<String, StoreError> {
    LessonId::try_new(value)
        .map(LessonId::into_string)
        .map_err(|_| StoreError::InvalidInput("invalid lesson id"))
}

fn normalize_non_empty(value: &str, field: &'static str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(field));
    }
    Ok(trimmed.to_string())
}

fn course_exists_conn(conn: &Connection, course_id: &str) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM courses WHERE id=?1",
            params![course_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn lesson_exists_conn(conn: &Connection, lesson_id: &str) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM lessons WHERE id=?1",
            params![lesson_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn ensure_course_exists_conn(conn: &Connection, course_id: &str) -> Result<(), StoreError> {
    if course_exists_conn(conn, course_id)? {
        Ok(())
    } else {
        Err(StoreError::CourseNotFound)
    }
}

fn ensure_lesson_exists_conn(conn: &Connection, lesson_id: &str) -> Result<(), StoreError> {
    if lesson_exists_conn(conn, lesson_id)? {
        Ok(())
    } else {
        Err(StoreError::LessonNotFound)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}
