//! Enroll / CompleteLesson over the in-memory record store.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;

use coursepath_core::catalog::Tier;
use coursepath_core::error::CoreError;
use coursepath_core::status::NodeStatus;
use coursepath_core::xp::ENROLLMENT_BONUS_XP;
use coursepath_db::store::{MemoryRecordStore, RecordStore, StoreError, VersionedRecord};

use common::{free_repo, memory_store, record_tier_repo, repo_with_tier};

fn status_of(graph: &coursepath_db::repositories::CourseGraph, node_id: &str) -> NodeStatus {
    graph
        .nodes
        .iter()
        .find(|n| n.node.id == node_id)
        .map(|n| n.status)
        .unwrap_or_else(|| panic!("node {node_id} missing"))
}

// ---------------------------------------------------------------------------
// Enroll
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_enroll_creates_profile_and_grants_bonus() {
    let store = memory_store();
    let repo = free_repo(store.clone());

    let outcome = repo.enroll(1, "python-basics").await.unwrap();
    assert_eq!(outcome.xp_gained, ENROLLMENT_BONUS_XP);
    assert_eq!(outcome.enrollment.progress, 0);

    let profile = repo.get_profile(1).await.unwrap();
    assert_eq!(profile.xp, ENROLLMENT_BONUS_XP);
    assert_eq!(profile.enrolled_course_ids, vec!["python-basics"]);
    assert!(profile.consistency_issues().is_empty());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn repeated_enroll_is_a_conflict_and_bonus_is_granted_once() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();

    assert_matches!(
        repo.enroll(1, "python-basics").await,
        Err(CoreError::AlreadyEnrolled { .. })
    );
    let profile = repo.get_profile(1).await.unwrap();
    assert_eq!(profile.xp, ENROLLMENT_BONUS_XP);
    assert_eq!(profile.enrolled_course_ids.len(), 1);
}

#[tokio::test]
async fn concurrent_enrolls_grant_bonus_exactly_once() {
    let repo = Arc::new(free_repo(memory_store()));

    let attempts = (0..8).map(|_| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move { repo.enroll(7, "python-basics").await })
    });
    let results = futures::future::join_all(attempts).await;

    let ok = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(CoreError::AlreadyEnrolled { .. }))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);

    let profile = repo.get_profile(7).await.unwrap();
    assert_eq!(profile.xp, ENROLLMENT_BONUS_XP);
    assert_eq!(profile.enrolled_course_ids, vec!["python-basics"]);
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let store = memory_store();
    let repo = free_repo(store.clone());
    assert_matches!(
        repo.enroll(1, "cobol-101").await,
        Err(CoreError::NotFound { entity: "Course", .. })
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn list_only_enrollment_still_blocks_enroll() {
    let store = memory_store();
    store
        .insert_raw("user:1", json!({"enrolledCourseIds": ["python-basics"]}))
        .await;
    let repo = free_repo(store);
    assert_matches!(
        repo.enroll(1, "python-basics").await,
        Err(CoreError::AlreadyEnrolled { .. })
    );
}

// ---------------------------------------------------------------------------
// CompleteLesson
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_lesson_completion_advances_progress_and_unlocks_next() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();

    let graph = repo.course_graph(1, "python-basics").await.unwrap();
    assert_eq!(graph.progress, 0);
    assert_eq!(status_of(&graph, "variables"), NodeStatus::Current);
    assert_eq!(status_of(&graph, "control-flow"), NodeStatus::Locked);

    let outcome = repo
        .complete_lesson(1, "python-basics", "variables", Some(100))
        .await
        .unwrap();
    assert_eq!(outcome.enrollment.progress, 25);
    assert_eq!(outcome.xp_gained, 100);
    assert_eq!(outcome.total_xp, ENROLLMENT_BONUS_XP + 100);

    let graph = repo.course_graph(1, "python-basics").await.unwrap();
    assert_eq!(status_of(&graph, "variables"), NodeStatus::Completed);
    assert_eq!(status_of(&graph, "control-flow"), NodeStatus::Current);
}

#[tokio::test]
async fn repeated_completion_grants_xp_once() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();
    repo.complete_lesson(1, "python-basics", "variables", None)
        .await
        .unwrap();

    assert_matches!(
        repo.complete_lesson(1, "python-basics", "variables", None).await,
        Err(CoreError::AlreadyCompleted { .. })
    );
    let profile = repo.get_profile(1).await.unwrap();
    assert_eq!(profile.xp, ENROLLMENT_BONUS_XP + 100);
}

#[tokio::test]
async fn concurrent_completions_grant_xp_once() {
    let repo = Arc::new(free_repo(memory_store()));
    repo.enroll(3, "python-basics").await.unwrap();

    let attempts = (0..6).map(|_| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move {
            repo.complete_lesson(3, "python-basics", "variables", None)
                .await
        })
    });
    let results = futures::future::join_all(attempts).await;
    let ok = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(ok, 1);

    let profile = repo.get_profile(3).await.unwrap();
    assert_eq!(profile.xp, ENROLLMENT_BONUS_XP + 100);
    let enrollment = profile.enrollment("python-basics").unwrap();
    assert_eq!(enrollment.completed_lessons.len(), 1);
}

#[tokio::test]
async fn completion_without_enrollment_leaves_store_untouched() {
    let store = memory_store();
    let repo = free_repo(store.clone());
    assert_matches!(
        repo.complete_lesson(1, "python-basics", "variables", None).await,
        Err(CoreError::NotEnrolled { .. })
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unknown_lesson_is_not_found() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();
    assert_matches!(
        repo.complete_lesson(1, "python-basics", "decorators", None).await,
        Err(CoreError::NotFound { entity: "Lesson", .. })
    );
}

#[tokio::test]
async fn locked_node_is_refused_before_any_write() {
    let store = memory_store();
    let repo = free_repo(store.clone());
    repo.enroll(1, "python-basics").await.unwrap();
    let before = store.get("user:1").await.unwrap().unwrap();

    assert_matches!(
        repo.complete_lesson(1, "python-basics", "functions", None).await,
        Err(CoreError::NodeLocked { node_id }) if node_id == "functions"
    );
    assert_eq!(store.get("user:1").await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn branching_node_needs_both_prerequisites() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "typescript-fundamentals").await.unwrap();
    for lesson in ["intro", "history"] {
        repo.complete_lesson(1, "typescript-fundamentals", lesson, None)
            .await
            .unwrap();
    }

    let graph = repo.course_graph(1, "typescript-fundamentals").await.unwrap();
    assert_eq!(status_of(&graph, "types"), NodeStatus::Current);
    assert_eq!(status_of(&graph, "generics"), NodeStatus::Locked);
    assert_matches!(
        repo.complete_lesson(1, "typescript-fundamentals", "generics", None)
            .await,
        Err(CoreError::NodeLocked { .. })
    );

    repo.complete_lesson(1, "typescript-fundamentals", "types", None)
        .await
        .unwrap();
    let graph = repo.course_graph(1, "typescript-fundamentals").await.unwrap();
    assert_eq!(status_of(&graph, "generics"), NodeStatus::Current);
}

#[tokio::test]
async fn aliased_node_ids_share_one_completion() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "typescript-fundamentals").await.unwrap();
    for lesson in ["intro", "history", "types", "generics"] {
        repo.complete_lesson(1, "typescript-fundamentals", lesson, None)
            .await
            .unwrap();
    }

    let outcome = repo
        .complete_lesson(1, "typescript-fundamentals", "ts-project", None)
        .await
        .unwrap();
    assert_eq!(outcome.xp_gained, 300);
    let last = outcome.enrollment.completed_lessons.last().unwrap();
    assert_eq!(last.lesson_id, "typescript-project");

    assert_matches!(
        repo.complete_lesson(1, "typescript-fundamentals", "typescript-project", None)
            .await,
        Err(CoreError::AlreadyCompleted { .. })
    );
    let graph = repo.course_graph(1, "typescript-fundamentals").await.unwrap();
    assert_eq!(status_of(&graph, "ts-project"), NodeStatus::Completed);
    assert_eq!(status_of(&graph, "final-quiz"), NodeStatus::Current);
}

#[tokio::test]
async fn catalog_xp_overrides_client_claim() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();
    let outcome = repo
        .complete_lesson(1, "python-basics", "variables", Some(9_999))
        .await
        .unwrap();
    assert_eq!(outcome.xp_gained, 100);
}

#[tokio::test]
async fn finishing_every_lesson_completes_the_course() {
    let repo = free_repo(memory_store());
    repo.enroll(1, "python-basics").await.unwrap();

    let lessons = ["variables", "control-flow", "functions", "python-quiz"];
    let mut last = None;
    for (k, lesson) in lessons.iter().enumerate() {
        let outcome = repo
            .complete_lesson(1, "python-basics", lesson, None)
            .await
            .unwrap();
        assert_eq!(outcome.course_completed, k == lessons.len() - 1);
        last = Some(outcome);
    }
    let last = last.unwrap();
    assert_eq!(last.enrollment.progress, 100);
    assert_eq!(last.total_xp, ENROLLMENT_BONUS_XP + 100 + 100 + 150 + 200);

    let courses = repo.user_courses(1).await.unwrap();
    assert_eq!(courses.completed_course_ids, vec!["python-basics"]);
    assert_eq!(courses.enrolled_course_ids, vec!["python-basics"]);
}

// ---------------------------------------------------------------------------
// Tier gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lower_tier_cannot_enroll_or_view_graph() {
    let store = memory_store();
    let repo = repo_with_tier(store.clone(), Tier::Free);
    assert_matches!(
        repo.enroll(1, "rust-async").await,
        Err(CoreError::TierRequired {
            required: Tier::Pro,
            current: Tier::Free
        })
    );
    assert_matches!(
        repo.course_graph(1, "rust-async").await,
        Err(CoreError::TierRequired { .. })
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn tier_from_record_unlocks_paid_course() {
    let store = memory_store();
    store
        .insert_raw("user:5", json!({"id": 5, "subscriptionTier": "pro"}))
        .await;
    let repo = record_tier_repo(store);

    repo.enroll(5, "rust-async").await.unwrap();
    assert_matches!(
        repo.enroll(5, "systems-design").await,
        Err(CoreError::TierRequired {
            required: Tier::Enterprise,
            ..
        })
    );
    assert_matches!(
        repo.enroll(6, "rust-async").await,
        Err(CoreError::TierRequired { .. })
    );
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn legacy_record_is_normalized_on_write() {
    let store = memory_store();
    store
        .insert_raw(
            "user:1",
            json!({
                "xp": 150,
                "enrolledCourseIds": ["python-basics"],
                "enrollments": [{
                    "courseId": "python-basics",
                    "enrolledAt": "2026-01-05T10:00:00Z",
                    "progress": 25,
                    "completedLessons": ["variables"]
                }]
            }),
        )
        .await;
    let repo = free_repo(store.clone());

    let outcome = repo
        .complete_lesson(1, "python-basics", "control-flow", None)
        .await
        .unwrap();
    assert_eq!(outcome.enrollment.progress, 50);
    assert_eq!(outcome.total_xp, 250);

    let stored = store.get("user:1").await.unwrap().unwrap().body;
    let completed = &stored["enrollments"]["python-basics"]["completedLessons"];
    assert_eq!(completed[0]["lessonId"], "variables");
    assert_eq!(completed[0]["completedAt"], "2026-01-05T10:00:00Z");
    assert_eq!(completed[1]["lessonId"], "control-flow");
    assert_eq!(stored["id"], 1);
}

#[tokio::test]
async fn record_of_another_user_is_a_storage_error() {
    let store = memory_store();
    store.insert_raw("user:1", json!({"id": 2})).await;
    let repo = free_repo(store);
    assert_matches!(repo.get_profile(1).await, Err(CoreError::Storage(_)));
    assert_matches!(
        repo.enroll(1, "python-basics").await,
        Err(CoreError::Storage(_))
    );
}

#[tokio::test]
async fn inflated_stored_progress_is_recomputed_on_read() {
    let store = memory_store();
    store
        .insert_raw(
            "user:1",
            json!({
                "enrolledCourseIds": ["python-basics"],
                "enrollments": {
                    "python-basics": {
                        "courseId": "python-basics",
                        "progress": 100,
                        "completedLessons": ["variables", "variables", "variables", "variables"]
                    }
                }
            }),
        )
        .await;
    let repo = free_repo(store.clone());

    let courses = repo.user_courses(1).await.unwrap();
    assert_eq!(courses.enrollments["python-basics"].progress, 25);
    assert!(courses.completed_course_ids.is_empty());

    let graph = repo.course_graph(1, "python-basics").await.unwrap();
    assert_eq!(graph.progress, 25);
    assert_eq!(status_of(&graph, "control-flow"), NodeStatus::Current);

    let mut last = None;
    for lesson in ["control-flow", "functions", "python-quiz"] {
        last = Some(repo.complete_lesson(1, "python-basics", lesson, None).await.unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.enrollment.progress, 100);
    assert!(last.course_completed);

    let stored = store.get("user:1").await.unwrap().unwrap().body;
    assert_eq!(stored["enrollments"]["python-basics"]["progress"], 100);
}

#[tokio::test]
async fn listed_course_without_enrollment_is_repaired() {
    let store = memory_store();
    store
        .insert_raw(
            "user:1",
            json!({"enrolledCourseIds": ["python-basics", "python-basics"]}),
        )
        .await;
    let repo = free_repo(store.clone());

    let outcome = repo
        .complete_lesson(1, "python-basics", "variables", None)
        .await
        .unwrap();
    assert_eq!(outcome.enrollment.progress, 25);

    let stored = store.get("user:1").await.unwrap().unwrap().body;
    assert_eq!(stored["enrolledCourseIds"], json!(["python-basics"]));
    assert_eq!(
        stored["enrollments"]["python-basics"]["completedLessons"][0]["lessonId"],
        "variables"
    );
}

#[tokio::test]
async fn profile_level_is_derived_from_xp() {
    let store = memory_store();
    store
        .insert_raw("user:1", json!({"xp": 2500, "level": 1}))
        .await;
    let repo = free_repo(store);
    let summary = repo.profile_summary(1).await.unwrap();
    assert_eq!(summary.level, 3);
}

/// Lets another writer slip in between the first read and write.
struct RacingStore {
    inner: MemoryRecordStore,
    raced: AtomicBool,
}

#[async_trait]
impl RecordStore for RacingStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: serde_json::Value,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.inner.insert_raw(key, json!({"xp": 999})).await;
        }
        self.inner.put(key, body, expected_version).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn lost_version_race_is_reported_not_retried() {
    let store = Arc::new(RacingStore {
        inner: MemoryRecordStore::new(),
        raced: AtomicBool::new(false),
    });
    let repo = free_repo(store.clone());

    assert_matches!(
        repo.enroll(1, "python-basics").await,
        Err(CoreError::StaleRecord { key }) if key == "user:1"
    );
    // The other writer's record survives intact.
    let profile = repo.get_profile(1).await.unwrap();
    assert_eq!(profile.xp, 999);
    assert!(profile.enrollments.is_empty());

    // A fresh attempt reads the new version and succeeds.
    repo.enroll(1, "python-basics").await.unwrap();
    assert_eq!(repo.get_profile(1).await.unwrap().xp, 999 + ENROLLMENT_BONUS_XP);
}
