#![forbid(unsafe_code)]

use courseline_core::identity::ViewerIdentity;
use courseline_core::model::{AssignmentSort, AvailableSort, CatalogStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterCourseRequest {
    pub course_id: String,
    pub title: String,
    pub status: CatalogStatus,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterLessonRequest {
    pub lesson_id: String,
    pub title: String,
    pub status: CatalogStatus,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseRow {
    pub course_id: String,
    pub title: String,
    pub status: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRow {
    pub lesson_id: String,
    pub title: String,
    pub status: String,
    pub total_views: i64,
    pub unique_views: i64,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignRequest {
    pub course_id: String,
    pub lesson_id: String,
    /// Requested slot in the course ordering. Omitted: appended after the
    /// highest priority the course has ever handed out.
    pub priority: Option<i64>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentRow {
    pub course_id: String,
    pub lesson_id: String,
    pub priority: i64,
    pub active: bool,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListCourseAssignmentsRequest {
    pub course_id: String,
    pub include_inactive: bool,
    pub sort: AssignmentSort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListLessonAssignmentsRequest {
    pub lesson_id: String,
    pub include_inactive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePriorityRequest {
    pub course_id: String,
    pub lesson_id: String,
    pub priority: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderItem {
    pub lesson_id: String,
    pub priority: i64,
}

/// A full replacement ordering for one course. Applied all-or-nothing; the
/// caller is trusted to supply internally consistent priorities and the
/// reconciler is not consulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderRequest {
    pub course_id: String,
    pub items: Vec<ReorderItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailableLessonsRequest {
    pub course_id: String,
    pub status: Option<CatalogStatus>,
    pub sort: AvailableSort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailableLessonsResult {
    pub lessons: Vec<LessonRow>,
    /// Assignments under the course in any state, active or not.
    pub total_assigned: u64,
    /// Size of the returned set, after the status filter.
    pub total_available: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordViewRequest {
    pub lesson_id: String,
    pub identity: ViewerIdentity,
    /// Free-form request context (referrer, client, ...) kept with the event.
    pub context: Option<serde_json::Value>,
    pub viewed_at_ms: i64,
}

/// Result value of `record_view`. Tracking is telemetry: failures are folded
/// in here and never returned as an `Err` to the caller's primary flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordViewOutcome {
    pub recorded: bool,
    pub first_view: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonViewsRequest {
    pub lesson_id: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub include_anonymous: bool,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewEventRow {
    pub seq: i64,
    pub lesson_id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub context: Option<serde_json::Value>,
    pub viewed_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LessonViewsResult {
    pub views: Vec<ViewEventRow>,
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSummaryRequest {
    pub lesson_id: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSummary {
    pub total_views: u64,
    /// Distinct identity keys: the user id when the event has one, else the
    /// session id. Not the same folding as first-view dedup.
    pub unique_viewers: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyBreakdownRequest {
    pub lesson_id: String,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyViewStat {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub views: u64,
    pub unique_users: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserHistoryRequest {
    pub user_id: String,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserHistoryPage {
    pub views: Vec<ViewEventRow>,
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub total_pages: u64,
}
