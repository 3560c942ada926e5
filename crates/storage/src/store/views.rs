#![forbid(unsafe_code)]

use super::*;
use courseline_core::identity::ViewerIdentity;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

const MAX_VIEWS_LIMIT: usize = 500;

fn has_viewed(
    conn: &Connection,
    lesson_id: &str,
    identity: &ViewerIdentity,
) -> Result<bool, StoreError> {
    // OR across whichever identity fields are present: a match on either the
    // user id or the session id means the lesson was already viewed. A NULL
    // parameter can never match a column.
    Ok(conn
        .query_row(
            "SELECT 1 FROM view_events \
             WHERE lesson_id=?1 AND (user_id=?2 OR session_id=?3) \
             LIMIT 1",
            params![lesson_id, identity.user_id(), identity.session_id()],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn bump_counters(conn: &Connection, lesson_id: &str, first_view: bool) -> Result<(), StoreError> {
    let unique_bump: i64 = if first_view { 1 } else { 0 };
    let updated = conn.execute(
        "UPDATE lessons SET total_views = total_views + 1, \
         unique_views = unique_views + ?2 \
         WHERE id=?1",
        params![lesson_id, unique_bump],
    )?;
    if updated == 0 {
        return Err(StoreError::LessonNotFound);
    }
    Ok(())
}

fn append_event(
    conn: &Connection,
    lesson_id: &str,
    request: &RecordViewRequest,
) -> Result<(), StoreError> {
    let context_json = request.context.as_ref().map(|value| value.to_string());
    conn.execute(
        "INSERT INTO view_events(lesson_id, user_id, session_id, context_json, viewed_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            lesson_id,
            request.identity.user_id(),
            request.identity.session_id(),
            context_json,
            request.viewed_at_ms
        ],
    )?;
    Ok(())
}

pub(in crate::store) fn view_event_from_parts(
    seq: i64,
    lesson_id: String,
    user_id: Option<String>,
    session_id: Option<String>,
    context_json: Option<String>,
    viewed_at_ms: i64,
) -> Result<ViewEventRow, StoreError> {
    let context = match context_json {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|_| StoreError::InvalidInput("invalid view context payload"))?,
        ),
        None => None,
    };
    Ok(ViewEventRow {
        seq,
        lesson_id,
        user_id,
        session_id,
        context,
        viewed_at_ms,
    })
}

type RawViewEvent = (i64, String, Option<String>, Option<String>, Option<String>, i64);

pub(in crate::store) fn parse_raw_view_event(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawViewEvent> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

impl SqliteStore {
    /// Dedup probe: has this viewer, by either identity field, already viewed
    /// the lesson?
    pub fn lesson_viewed_by(
        &self,
        lesson_id: &str,
        identity: &ViewerIdentity,
    ) -> Result<bool, StoreError> {
        let lesson_id = canonicalize_lesson(lesson_id)?;
        has_viewed(&self.conn, &lesson_id, identity)
    }

    /// Records one view: bumps the lesson counters and appends the immutable
    /// event row. The two effects are independent statements, deliberately
    /// not one transaction; tracking failures are reported in the outcome and
    /// never propagate to the caller's primary flow.
    pub fn record_view(&mut self, request: RecordViewRequest) -> RecordViewOutcome {
        match self.record_view_inner(&request) {
            Ok(first_view) => RecordViewOutcome {
                recorded: true,
                first_view,
                error: None,
            },
            Err(err) => RecordViewOutcome {
                recorded: false,
                first_view: false,
                error: Some(err.to_string()),
            },
        }
    }

    fn record_view_inner(&mut self, request: &RecordViewRequest) -> Result<bool, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;
        let first_view = !has_viewed(&self.conn, &lesson_id, &request.identity)?;

        // A counter failure does not stop the append, and vice versa.
        let counter_result = bump_counters(&self.conn, &lesson_id, first_view);
        let append_result = append_event(&self.conn, &lesson_id, request);
        counter_result?;
        append_result?;

        Ok(first_view)
    }

    /// Raw event log for a lesson, newest first.
    pub fn lesson_views(
        &self,
        request: LessonViewsRequest,
    ) -> Result<LessonViewsResult, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;
        let limit = request.limit.clamp(0, MAX_VIEWS_LIMIT);
        let query_limit = to_sqlite_i64(limit.saturating_add(1))?;
        let offset = to_sqlite_i64(request.offset)?;

        let mut sql = String::from(
            "SELECT seq, lesson_id, user_id, session_id, context_json, viewed_at_ms \
             FROM view_events WHERE lesson_id=?",
        );
        let mut sql_params = vec![Value::Text(lesson_id)];
        if let Some(from_ms) = request.from_ms {
            sql.push_str(" AND viewed_at_ms>=?");
            sql_params.push(Value::Integer(from_ms));
        }
        if let Some(to_ms) = request.to_ms {
            sql.push_str(" AND viewed_at_ms<=?");
            sql_params.push(Value::Integer(to_ms));
        }
        if !request.include_anonymous {
            sql.push_str(" AND user_id IS NOT NULL");
        }
        sql.push_str(" ORDER BY viewed_at_ms DESC, seq DESC LIMIT ? OFFSET ?");
        sql_params.push(Value::Integer(query_limit));
        sql_params.push(Value::Integer(offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(sql_params))?;
        let mut raw = Vec::<RawViewEvent>::new();
        while let Some(row) = rows.next()? {
            raw.push(parse_raw_view_event(row)?);
        }
        drop(rows);
        drop(stmt);

        let has_more = raw.len() > limit;
        raw.truncate(limit);

        let mut views = Vec::with_capacity(raw.len());
        for (seq, lesson_id, user_id, session_id, context_json, viewed_at_ms) in raw {
            views.push(view_event_from_parts(
                seq,
                lesson_id,
                user_id,
                session_id,
                context_json,
                viewed_at_ms,
            )?);
        }

        Ok(LessonViewsResult { views, has_more })
    }
}
