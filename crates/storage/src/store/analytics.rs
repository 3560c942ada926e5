#![forbid(unsafe_code)]

use super::*;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

const MAX_HISTORY_LIMIT: usize = 100;

fn range_clause(
    sql: &mut String,
    sql_params: &mut Vec<Value>,
    from_ms: Option<i64>,
    to_ms: Option<i64>,
) {
    if let Some(from_ms) = from_ms {
        sql.push_str(" AND viewed_at_ms>=?");
        sql_params.push(Value::Integer(from_ms));
    }
    if let Some(to_ms) = to_ms {
        sql.push_str(" AND viewed_at_ms<=?");
        sql_params.push(Value::Integer(to_ms));
    }
}

impl SqliteStore {
    /// Total and distinct-viewer counts over the event log. Uniqueness folds
    /// each event to a single identity key, the user id when present and the
    /// session id otherwise. This is intentionally a different rule from the
    /// first-view dedup probe.
    pub fn view_summary(&self, request: ViewSummaryRequest) -> Result<ViewSummary, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;

        let mut sql = String::from(
            "SELECT COUNT(*), COUNT(DISTINCT COALESCE(user_id, session_id)) \
             FROM view_events WHERE lesson_id=?",
        );
        let mut sql_params = vec![Value::Text(lesson_id)];
        range_clause(&mut sql, &mut sql_params, request.from_ms, request.to_ms);

        let (total, unique): (i64, i64) = self.conn.query_row(
            &sql,
            params_from_iter(sql_params),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(ViewSummary {
            total_views: total.max(0) as u64,
            unique_viewers: unique.max(0) as u64,
        })
    }

    /// Views bucketed by UTC calendar date, oldest bucket first.
    pub fn daily_breakdown(
        &self,
        request: DailyBreakdownRequest,
    ) -> Result<Vec<DailyViewStat>, StoreError> {
        let lesson_id = canonicalize_lesson(&request.lesson_id)?;

        let mut sql = String::from(
            "SELECT date(viewed_at_ms / 1000, 'unixepoch') AS day, \
             COUNT(*), COUNT(DISTINCT COALESCE(user_id, session_id)) \
             FROM view_events WHERE lesson_id=?",
        );
        let mut sql_params = vec![Value::Text(lesson_id)];
        range_clause(&mut sql, &mut sql_params, request.from_ms, request.to_ms);
        sql.push_str(" GROUP BY day ORDER BY day ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(sql_params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(DailyViewStat {
                date: row.get(0)?,
                views: row.get::<_, i64>(1)?.max(0) as u64,
                unique_users: row.get::<_, i64>(2)?.max(0) as u64,
            });
        }
        Ok(out)
    }

    /// One user's view history, newest first, with page metadata.
    pub fn user_history(&self, request: UserHistoryRequest) -> Result<UserHistoryPage, StoreError> {
        let user_id = normalize_non_empty(&request.user_id, "user_id must not be empty")?;
        let page = request.page.max(1);
        let limit = request.limit.clamp(1, MAX_HISTORY_LIMIT);
        let offset = to_sqlite_i64((page - 1).saturating_mul(limit))?;

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM view_events WHERE user_id=?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT seq, lesson_id, user_id, session_id, context_json, viewed_at_ms \
             FROM view_events WHERE user_id=?1 \
             ORDER BY viewed_at_ms DESC, seq DESC \
             LIMIT ?2 OFFSET ?3",
        )?;
        let mut rows = stmt.query(params![user_id, to_sqlite_i64(limit)?, offset])?;
        let mut raw = Vec::new();
        while let Some(row) = rows.next()? {
            raw.push(crate::store::views::parse_raw_view_event(row)?);
        }
        drop(rows);
        drop(stmt);

        let mut views = Vec::with_capacity(raw.len());
        for (seq, lesson_id, user_id, session_id, context_json, viewed_at_ms) in raw {
            views.push(crate::store::views::view_event_from_parts(
                seq,
                lesson_id,
                user_id,
                session_id,
                context_json,
                viewed_at_ms,
            )?);
        }

        let total = total.max(0) as u64;
        let total_pages = total.div_ceil(limit as u64);
        Ok(UserHistoryPage {
            views,
            total,
            page,
            limit,
            total_pages,
        })
    }
}
