#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

pub(in crate::store) fn parse_course_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CourseRow> {
    Ok(CourseRow {
        course_id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        created_at_ms: row.get(3)?,
    })
}

pub(in crate::store) fn parse_lesson_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LessonRow> {
    Ok(LessonRow {
        lesson_id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        total_views: row.get(3)?,
        unique_views: row.get(4)?,
        created_at_ms: row.get(5)?,
    })
}

impl SqliteStore {
    /// Registers a course in the catalog. The full course CRUD lives at the
    /// admin boundary; the core only needs the registry row for existence
    /// checks and cascades.
    pub fn course_register(
        &mut self,
        request: RegisterCourseRequest,
    ) -> Result<CourseRow, StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;
        let title = normalize_non_empty(&request.title, "course title must not be empty")?;

        let insert = self.conn.execute(
            "INSERT INTO courses(id, title, status, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![
                course_id,
                title,
                request.status.as_str(),
                request.created_at_ms
            ],
        );
        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                return Err(StoreError::DuplicateCourse);
            }
            return Err(StoreError::Sql(err));
        }

        Ok(CourseRow {
            course_id,
            title,
            status: request.status.as_str().to_string(),
            created_at_ms: request.created_at_ms,
        })
    }

    /// Registers a lesson with zeroed view counters.
    pub fn lesson_register(
        &mut self,
        request: RegisterLessonRequest,
    ) -> Result<LessonRow, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;
        let title = normalize_non_empty(&request.title, "lesson title must not be empty")?;

        let insert = self.conn.execute(
            "INSERT INTO lessons(id, title, status, total_views, unique_views, created_at_ms) \
             VALUES (?1, ?2, ?3, 0, 0, ?4)",
            params![
                lesson_id,
                title,
                request.status.as_str(),
                request.created_at_ms
            ],
        );
        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                return Err(StoreError::DuplicateLesson);
            }
            return Err(StoreError::Sql(err));
        }

        Ok(LessonRow {
            lesson_id,
            title,
            status: request.status.as_str().to_string(),
            total_views: 0,
            unique_views: 0,
            created_at_ms: request.created_at_ms,
        })
    }

    pub fn course_exists(&self, course_id: &str) -> Result<bool, StoreError> {
        let course_id = canonicalize_course(course_id)?;
        course_exists_conn(&self.conn, &course_id)
    }

    pub fn lesson_exists(&self, lesson_id: &str) -> Result<bool, StoreError> {
        let lesson_id = canonicalize_lesson(lesson_id)?;
        lesson_exists_conn(&self.conn, &lesson_id)
    }

    pub fn lesson_get(&self, lesson_id: &str) -> Result<Option<LessonRow>, StoreError> {
        let lesson_id = canonicalize_lesson(lesson_id)?;
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, status, total_views, unique_views, created_at_ms \
                 FROM lessons WHERE id=?1",
                params![lesson_id],
                parse_lesson_row,
            )
            .optional()?)
    }

    pub fn course_get(&self, course_id: &str) -> Result<Option<CourseRow>, StoreError> {
        let course_id = canonicalize_course(course_id)?;
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, status, created_at_ms FROM courses WHERE id=?1",
                params![course_id],
                parse_course_row,
            )
            .optional()?)
    }
}
