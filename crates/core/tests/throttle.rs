mod common;

use workpool_core::model::{Artifact, NewTask, NewWorker, TaskStatus, WorkerStatus};
use workpool_core::store;

fn task(priority: i64) -> NewTask {
    NewTask {
        repo: "acme/widgets".into(),
        title: "t".into(),
        description: None,
        estimate_points: 1,
        priority,
        required_skills: vec![],
        area: None,
        tier: 0,
    }
}

/// spec §9 Open Question (3): `max_open_prs` gates *new* assignments only.
/// It is not a standing invariant, so once a task is leased the worker can
/// keep reporting `pr_opened` on further tasks leased the same way and push
/// the repo's open-PR count past its throttle without the core rejecting
/// any of it — the throttle only ever stopped the *matcher* from leasing.
#[tokio::test]
async fn worker_reported_transitions_can_exceed_max_open_prs_after_the_fact() {
    let pool = common::setup_pool().await;
    store::upsert_repo(&pool, "acme/widgets", 1, false).await.unwrap();

    let worker = store::insert_worker(
        &pool,
        &NewWorker {
            name: "flo".into(),
            handle: None,
            skills: vec![],
            capacity_points: 100,
            max_concurrent_tasks: 100,
        },
        "hash",
    )
    .await
    .unwrap();
    store::update_worker_heartbeat(&pool, &worker.worker_id, WorkerStatus::Idle, None)
        .await
        .unwrap();

    // Lease three tasks directly at the store layer (bypassing the
    // matcher's throttle check entirely, just as a matcher cycle would if
    // it ran three times before any of them reached pr_opened) and drive
    // each to pr_opened through the worker-facing status update, which
    // never consults `count_open_prs`.
    let mut opened_ids = Vec::new();
    for i in 0..3 {
        let created = store::insert_task(&pool, &task(10 - i)).await.unwrap();
        assert!(store::lease_task(&pool, &created.task_id, &worker.worker_id, 1800)
            .await
            .unwrap());
        store::update_task_status(&pool, &created.task_id, TaskStatus::InProgress, None, None)
            .await
            .unwrap();
        let opened = store::update_task_status(
            &pool,
            &created.task_id,
            TaskStatus::PrOpened,
            None,
            Some(&Artifact {
                pr_url: Some(format!("https://example.com/pr/{i}")),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(opened.status(), Some(TaskStatus::PrOpened));
        opened_ids.push(opened.task_id);
    }

    let open_prs = store::count_open_prs(&pool, "acme/widgets").await.unwrap();
    assert_eq!(open_prs, 3, "repo exceeded max_open_prs=1 without the core rejecting anything");

    // The throttle does bite on the next *matcher* assignment, though: a
    // brand new ready task stays ready.
    let config = common::test_config();
    let fresh = store::insert_task(&pool, &task(1)).await.unwrap();
    workpool_core::matcher::run_matching_cycle(&pool, &config)
        .await
        .unwrap();
    let still_ready = store::get_task(&pool, &fresh.task_id).await.unwrap().unwrap();
    assert_eq!(still_ready.status(), Some(TaskStatus::Ready));
}
