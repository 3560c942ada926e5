#![forbid(unsafe_code)]

use super::*;
use courseline_core::model::AvailableSort;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

impl SqliteStore {
    /// Lessons not yet linked to the course: the catalog minus every
    /// assignment under the course, in either state. An inactive link still
    /// counts as assigned and keeps the lesson out of this set.
    pub fn available_lessons(
        &mut self,
        request: AvailableLessonsRequest,
    ) -> Result<AvailableLessonsResult, StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;

        let tx = self.conn.transaction()?;
        ensure_course_exists_conn(&tx, &course_id)?;

        let total_assigned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM lesson_assignments WHERE course_id=?1",
            params![course_id],
            |row| row.get(0),
        )?;

        let order = match request.sort {
            // Unassigned lessons carry no priority; the priority mode keeps
            // the stable catalog order instead.
            AvailableSort::Title | AvailableSort::Priority => "title ASC, id ASC",
            AvailableSort::Recent => "created_at_ms DESC, id ASC",
        };
        let sql = format!(
            "SELECT id, title, status, total_views, unique_views, created_at_ms \
             FROM lessons \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM lesson_assignments a \
                 WHERE a.course_id=? AND a.lesson_id=lessons.id \
             ){status_filter} \
             ORDER BY {order}",
            status_filter = if request.status.is_some() {
                " AND status=?"
            } else {
                ""
            },
        );

        let mut sql_params = vec![Value::Text(course_id)];
        if let Some(status) = request.status {
            sql_params.push(Value::Text(status.as_str().to_string()));
        }

        let mut stmt = tx.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(sql_params))?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(crate::store::catalog::parse_lesson_row(row)?);
        }
        drop(rows);
        drop(stmt);

        tx.commit()?;
        let total_available = lessons.len() as u64;
        Ok(AvailableLessonsResult {
            lessons,
            total_assigned: total_assigned.max(0) as u64,
            total_available,
        })
    }
}
