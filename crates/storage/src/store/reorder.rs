#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;

impl SqliteStore {
    /// Applies a caller-supplied full ordering for one course as a single
    /// transaction. Any failure aborts the batch and every priority keeps
    /// its pre-call value. The reconciler is not involved here.
    pub fn reorder_assignments(&mut self, request: ReorderRequest) -> Result<(), StoreError> {
        let course_id = canonicalize_course(&request.course_id)?;
        if request.items.is_empty() {
            return Err(StoreError::InvalidInput(
                "reorder requires at least one item",
            ));
        }

        let tx = self.conn.transaction()?;
        ensure_course_exists_conn(&tx, &course_id)?;

        for item in &request.items {
            let lesson_id = canonicalize_lesson(&item.lesson_id)?;
            if item.priority <= 0 {
                return Err(StoreError::TransactionAborted {
                    reason: format!("priority for lesson {lesson_id} must be positive"),
                });
            }

            let updated = tx
                .execute(
                    "UPDATE lesson_assignments SET priority=?3 \
                     WHERE course_id=?1 AND lesson_id=?2",
                    params![course_id, lesson_id, item.priority],
                )
                .map_err(|err| StoreError::TransactionAborted {
                    reason: format!("storage failure on lesson {lesson_id}: {err}"),
                })?;
            if updated == 0 {
                return Err(StoreError::TransactionAborted {
                    reason: format!("lesson {lesson_id} is not assigned to course {course_id}"),
                });
            }
        }

        tx.commit()?;
        Ok(())
    }
}
