#![forbid(unsafe_code)]

use super::*;
use courseline_core::model::AssignmentSort;
use rusqlite::{OptionalExtension, Transaction, params};

fn parse_assignment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssignmentRow> {
    Ok(AssignmentRow {
        course_id: row.get(0)?,
        lesson_id: row.get(1)?,
        priority: row.get(2)?,
        active: row.get::<_, i64>(3)? != 0,
        created_at_ms: row.get(4)?,
    })
}

fn assignment_row_tx(
    tx: &Transaction<'_>,
    course_id: &str,
    lesson_id: &str,
) -> Result<Option<AssignmentRow>, StoreError> {
    Ok(tx
        .query_row(
            "SELECT course_id, lesson_id, priority, active, created_at_ms \
             FROM lesson_assignments WHERE course_id=?1 AND lesson_id=?2",
            params![course_id, lesson_id],
            parse_assignment_row,
        )
        .optional()?)
}

fn max_active_priority_tx(tx: &Transaction<'_>, course_id: &str) -> Result<i64, StoreError> {
    let max: Option<i64> = tx.query_row(
        "SELECT MAX(priority) FROM lesson_assignments WHERE course_id=?1 AND active=1",
        params![course_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0))
}

fn next_priority_any_state_tx(tx: &Transaction<'_>, course_id: &str) -> Result<i64, StoreError> {
    let max: Option<i64> = tx.query_row(
        "SELECT MAX(priority) FROM lesson_assignments WHERE course_id=?1",
        params![course_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

/// Resolves a priority collision for the record being inserted or updated.
/// When another active assignment under the course already holds `candidate`,
/// the incoming record is relocated to the end of the active ordering; the
/// existing holder is never moved. Inactive rows never count as collisions.
pub(in crate::store) fn reconcile_priority_tx(
    tx: &Transaction<'_>,
    course_id: &str,
    lesson_id: &str,
    candidate: i64,
) -> Result<i64, StoreError> {
    if candidate <= 0 {
        return Err(StoreError::InvalidInput("priority must be positive"));
    }

    let taken = tx
        .query_row(
            "SELECT 1 FROM lesson_assignments \
             WHERE course_id=?1 AND priority=?2 AND active=1 AND lesson_id<>?3 \
             LIMIT 1",
            params![course_id, candidate, lesson_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if !taken {
        return Ok(candidate);
    }
    Ok(max_active_priority_tx(tx, course_id)? + 1)
}

fn map_assignment_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::DuplicateAssignment;
    }
    StoreError::Sql(err)
}

impl SqliteStore {
    /// Links a lesson into a course's ordering. A pair may exist at most once
    /// across both states; re-assigning an inactive pair is still a duplicate.
    pub fn assign(&mut self, request: AssignRequest) -> Result<AssignmentRow, StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;

        let tx = self.conn.transaction()?;
        ensure_course_exists_conn(&tx, &course_id)?;
        ensure_lesson_exists_conn(&tx, &lesson_id)?;

        if assignment_row_tx(&tx, &course_id, &lesson_id)?.is_some() {
            return Err(StoreError::DuplicateAssignment);
        }

        let priority = match request.priority {
            Some(candidate) => reconcile_priority_tx(&tx, &course_id, &lesson_id, candidate)?,
            None => next_priority_any_state_tx(&tx, &course_id)?,
        };

        let insert = tx.execute(
            "INSERT INTO lesson_assignments(course_id, lesson_id, priority, active, created_at_ms) \
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![course_id, lesson_id, priority, request.created_at_ms],
        );
        if let Err(err) = insert {
            return Err(map_assignment_conflict(err));
        }

        tx.commit()?;
        Ok(AssignmentRow {
            course_id,
            lesson_id,
            priority,
            active: true,
            created_at_ms: request.created_at_ms,
        })
    }

    pub fn course_assignments(
        &self,
        request: ListCourseAssignmentsRequest,
    ) -> Result<Vec<AssignmentRow>, StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;

        let order = match request.sort {
            AssignmentSort::Priority => "priority ASC, created_at_ms DESC, lesson_id ASC",
            AssignmentSort::Recent => "created_at_ms DESC, lesson_id ASC",
        };
        let sql = format!(
            "SELECT course_id, lesson_id, priority, active, created_at_ms \
             FROM lesson_assignments \
             WHERE course_id=?1{active_filter} \
             ORDER BY {order}",
            active_filter = if request.include_inactive {
                ""
            } else {
                " AND active=1"
            },
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![course_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_assignment_row(row)?);
        }
        Ok(out)
    }

    /// Courses referencing a lesson, best-placed first.
    pub fn lesson_assignments(
        &self,
        request: ListLessonAssignmentsRequest,
    ) -> Result<Vec<AssignmentRow>, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;

        let sql = format!(
            "SELECT course_id, lesson_id, priority, active, created_at_ms \
             FROM lesson_assignments \
             WHERE lesson_id=?1{active_filter} \
             ORDER BY priority ASC, created_at_ms DESC, course_id ASC",
            active_filter = if request.include_inactive {
                ""
            } else {
                " AND active=1"
            },
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![lesson_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_assignment_row(row)?);
        }
        Ok(out)
    }

    /// Moves a pair to a new priority, relocating it past the active maximum
    /// when the requested slot is already held by another active assignment.
    pub fn update_priority(
        &mut self,
        request: UpdatePriorityRequest,
    ) -> Result<AssignmentRow, StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;

        let tx = self.conn.transaction()?;
        let Some(current) = assignment_row_tx(&tx, &course_id, &lesson_id)? else {
            return Err(StoreError::AssignmentNotFound);
        };

        let priority = reconcile_priority_tx(&tx, &course_id, &lesson_id, request.priority)?;
        tx.execute(
            "UPDATE lesson_assignments SET priority=?3 WHERE course_id=?1 AND lesson_id=?2",
            params![course_id, lesson_id, priority],
        )?;

        tx.commit()?;
        Ok(AssignmentRow {
            priority,
            ..current
        })
    }

    /// Soft delete / restore. Never touches the stored priority.
    pub fn toggle_assignment(
        &mut self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<AssignmentRow, StoreError> {
        let course_id = canonicalize_course(course_id)?;
        let lesson_id = canonicalize_lesson(lesson_id)?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE lesson_assignments SET active = 1 - active \
             WHERE course_id=?1 AND lesson_id=?2",
            params![course_id, lesson_id],
        )?;
        if updated == 0 {
            return Err(StoreError::AssignmentNotFound);
        }

        let Some(row) = assignment_row_tx(&tx, &course_id, &lesson_id)? else {
            return Err(StoreError::AssignmentNotFound);
        };
        tx.commit()?;
        Ok(row)
    }

    /// Hard delete; the only transition back to the unassigned state.
    pub fn remove_assignment(
        &mut self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<(), StoreError> {
        let course_id = canonicalize_course(course_id)?;
        let lesson_id = canonicalize_lesson(lesson_id)?;

        let deleted = self.conn.execute(
            "DELETE FROM lesson_assignments WHERE course_id=?1 AND lesson_id=?2",
            params![course_id, lesson_id],
        )?;
        if deleted == 0 {
            return Err(StoreError::AssignmentNotFound);
        }
        Ok(())
    }
}
