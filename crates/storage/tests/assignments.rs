#![forbid(unsafe_code)]

use courseline_core::model::{AssignmentSort, CatalogStatus};
use courseline_storage::{
    AssignRequest, ListCourseAssignmentsRequest, ListLessonAssignmentsRequest,
    RegisterCourseRequest, RegisterLessonRequest, SqliteStore, StoreError, UpdatePriorityRequest,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("courseline_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn seeded_store(test_name: &str, lessons: &[&str]) -> SqliteStore {
    let mut store = SqliteStore::open(temp_dir(test_name)).expect("open store");
    store
        .course_register(RegisterCourseRequest {
            course_id: "crs-1".to_string(),
            title: "Algebra I".to_string(),
            status: CatalogStatus::Active,
            created_at_ms: 1,
        })
        .expect("register course");
    for (index, lesson_id) in lessons.iter().enumerate() {
        store
            .lesson_register(RegisterLessonRequest {
                lesson_id: lesson_id.to_string(),
                title: format!("Lesson {lesson_id}"),
                status: CatalogStatus::Active,
                created_at_ms: 10 + index as i64,
            })
            .expect("register lesson");
    }
    store
}

fn assign(store: &mut SqliteStore, lesson_id: &str, priority: Option<i64>, created_at_ms: i64) {
    store
        .assign(AssignRequest {
            course_id: "crs-1".to_string(),
            lesson_id: lesson_id.to_string(),
            priority,
            created_at_ms,
        })
        .expect("assign lesson");
}

fn listed(store: &SqliteStore, include_inactive: bool) -> Vec<(String, i64, bool)> {
    store
        .course_assignments(ListCourseAssignmentsRequest {
            course_id: "crs-1".to_string(),
            include_inactive,
            sort: AssignmentSort::Priority,
        })
        .expect("list assignments")
        .into_iter()
        .map(|row| (row.lesson_id, row.priority, row.active))
        .collect()
}

#[test]
fn omitted_priority_appends_to_the_ordering() {
    let mut store = seeded_store("default_priorities", &["lsn-1", "lsn-2"]);

    assign(&mut store, "lsn-1", None, 100);
    assign(&mut store, "lsn-2", None, 101);

    assert_eq!(
        listed(&store, false),
        vec![
            ("lsn-1".to_string(), 1, true),
            ("lsn-2".to_string(), 2, true),
        ]
    );
}

#[test]
fn pair_is_unique_across_states_until_removed() {
    let mut store = seeded_store("pair_uniqueness", &["lsn-1"]);
    assign(&mut store, "lsn-1", None, 100);

    let again = store.assign(AssignRequest {
        course_id: "crs-1".to_string(),
        lesson_id: "lsn-1".to_string(),
        priority: None,
        created_at_ms: 101,
    });
    assert!(matches!(again, Err(StoreError::DuplicateAssignment)));

    store
        .toggle_assignment("crs-1", "lsn-1")
        .expect("deactivate");
    let inactive_again = store.assign(AssignRequest {
        course_id: "crs-1".to_string(),
        lesson_id: "lsn-1".to_string(),
        priority: None,
        created_at_ms: 102,
    });
    assert!(matches!(
        inactive_again,
        Err(StoreError::DuplicateAssignment)
    ));

    store
        .remove_assignment("crs-1", "lsn-1")
        .expect("hard delete");
    assign(&mut store, "lsn-1", None, 103);
    assert_eq!(listed(&store, true).len(), 1);
}

#[test]
fn collision_relocates_the_newcomer_not_the_holder() {
    let mut store = seeded_store("collision_newcomer", &["lsn-1", "lsn-2", "lsn-3"]);
    assign(&mut store, "lsn-1", Some(1), 100);
    assign(&mut store, "lsn-2", Some(2), 101);

    let row = store
        .assign(AssignRequest {
            course_id: "crs-1".to_string(),
            lesson_id: "lsn-3".to_string(),
            priority: Some(1),
            created_at_ms: 102,
        })
        .expect("colliding assign succeeds");
    assert_eq!(row.priority, 3);

    assert_eq!(
        listed(&store, false),
        vec![
            ("lsn-1".to_string(), 1, true),
            ("lsn-2".to_string(), 2, true),
            ("lsn-3".to_string(), 3, true),
        ]
    );
}

#[test]
fn inactive_rows_never_count_as_collisions() {
    let mut store = seeded_store("inactive_no_collision", &["lsn-1", "lsn-2"]);
    assign(&mut store, "lsn-1", Some(1), 100);
    store
        .toggle_assignment("crs-1", "lsn-1")
        .expect("deactivate holder");

    let row = store
        .assign(AssignRequest {
            course_id: "crs-1".to_string(),
            lesson_id: "lsn-2".to_string(),
            priority: Some(1),
            created_at_ms: 101,
        })
        .expect("assign into freed slot");
    assert_eq!(row.priority, 1);
}

#[test]
fn toggle_round_trips_and_preserves_priority() {
    let mut store = seeded_store("toggle_round_trip", &["lsn-1"]);
    assign(&mut store, "lsn-1", Some(5), 100);

    let off = store.toggle_assignment("crs-1", "lsn-1").expect("toggle off");
    assert!(!off.active);
    assert_eq!(off.priority, 5);

    let on = store.toggle_assignment("crs-1", "lsn-1").expect("toggle on");
    assert!(on.active);
    assert_eq!(on.priority, 5);
}

#[test]
fn update_priority_reconciles_and_self_update_is_a_noop() {
    let mut store = seeded_store("update_reconcile", &["lsn-1", "lsn-2"]);
    assign(&mut store, "lsn-1", Some(1), 100);
    assign(&mut store, "lsn-2", Some(2), 101);

    let moved = store
        .update_priority(UpdatePriorityRequest {
            course_id: "crs-1".to_string(),
            lesson_id: "lsn-2".to_string(),
            priority: 1,
        })
        .expect("update into held slot");
    assert_eq!(moved.priority, 3);

    let unchanged = store
        .update_priority(UpdatePriorityRequest {
            course_id: "crs-1".to_string(),
            lesson_id: "lsn-1".to_string(),
            priority: 1,
        })
        .expect("self update");
    assert_eq!(unchanged.priority, 1);
}

#[test]
fn listings_filter_inactive_and_honor_sorts() {
    let mut store = seeded_store("listing_sorts", &["lsn-1", "lsn-2", "lsn-3"]);
    assign(&mut store, "lsn-1", Some(2), 100);
    assign(&mut store, "lsn-2", Some(1), 200);
    assign(&mut store, "lsn-3", Some(3), 300);
    store
        .toggle_assignment("crs-1", "lsn-3")
        .expect("deactivate lsn-3");

    let active_only = listed(&store, false);
    assert_eq!(
        active_only,
        vec![
            ("lsn-2".to_string(), 1, true),
            ("lsn-1".to_string(), 2, true),
        ]
    );

    let with_inactive = listed(&store, true);
    assert_eq!(with_inactive.len(), 3);
    assert_eq!(with_inactive[2], ("lsn-3".to_string(), 3, false));

    let recent = store
        .course_assignments(ListCourseAssignmentsRequest {
            course_id: "crs-1".to_string(),
            include_inactive: true,
            sort: AssignmentSort::Recent,
        })
        .expect("recent sort");
    let recent_ids: Vec<&str> = recent.iter().map(|row| row.lesson_id.as_str()).collect();
    assert_eq!(recent_ids, vec!["lsn-3", "lsn-2", "lsn-1"]);
}

#[test]
fn lesson_side_listing_orders_by_priority() {
    let mut store = seeded_store("lesson_side", &["lsn-1"]);
    store
        .course_register(RegisterCourseRequest {
            course_id: "crs-2".to_string(),
            title: "Algebra II".to_string(),
            status: CatalogStatus::Active,
            created_at_ms: 2,
        })
        .expect("register second course");

    assign(&mut store, "lsn-1", Some(4), 100);
    store
        .assign(AssignRequest {
            course_id: "crs-2".to_string(),
            lesson_id: "lsn-1".to_string(),
            priority: Some(1),
            created_at_ms: 101,
        })
        .expect("assign in second course");

    let rows = store
        .lesson_assignments(ListLessonAssignmentsRequest {
            lesson_id: "lsn-1".to_string(),
            include_inactive: false,
        })
        .expect("list courses for lesson");
    let course_ids: Vec<&str> = rows.iter().map(|row| row.course_id.as_str()).collect();
    assert_eq!(course_ids, vec!["crs-2", "crs-1"]);
}

#[test]
fn missing_entities_surface_typed_errors() {
    let mut store = seeded_store("typed_errors", &["lsn-1"]);

    let no_course = store.assign(AssignRequest {
        course_id: "crs-missing".to_string(),
        lesson_id: "lsn-1".to_string(),
        priority: None,
        created_at_ms: 100,
    });
    assert!(matches!(no_course, Err(StoreError::CourseNotFound)));

    let no_lesson = store.assign(AssignRequest {
        course_id: "crs-1".to_string(),
        lesson_id: "lsn-missing".to_string(),
        priority: None,
        created_at_ms: 100,
    });
    assert!(matches!(no_lesson, Err(StoreError::LessonNotFound)));

    assert!(matches!(
        store.update_priority(UpdatePriorityRequest {
            course_id: "crs-1".to_string(),
            lesson_id: "lsn-1".to_string(),
            priority: 2,
        }),
        Err(StoreError::AssignmentNotFound)
    ));
    assert!(matches!(
        store.toggle_assignment("crs-1", "lsn-1"),
        Err(StoreError::AssignmentNotFound)
    ));
    assert!(matches!(
        store.remove_assignment("crs-1", "lsn-1"),
        Err(StoreError::AssignmentNotFound)
    ));

    let bad_priority = store.assign(AssignRequest {
        course_id: "crs-1".to_string(),
        lesson_id: "lsn-1".to_string(),
        priority: Some(0),
        created_at_ms: 100,
    });
    assert!(matches!(bad_priority, Err(StoreError::InvalidInput(_))));
}
