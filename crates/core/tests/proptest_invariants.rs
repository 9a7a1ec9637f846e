mod common;

use proptest::prelude::*;
use workpool_core::model::{NewTask, NewWorker, WorkerStatus};
use workpool_core::store;

/// A task never ends up leased to a worker that couldn't actually take it:
/// no missing required skill, no capacity overrun. Runs one matching cycle
/// over a randomly generated roster and checks every resulting lease.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn leases_never_violate_skills_or_capacity(
        worker_skills in prop::collection::vec("[a-c]", 0..3),
        worker_capacity in 1i64..20,
        worker_slots in 1i64..4,
        task_points in 1i64..10,
        task_skills in prop::collection::vec("[a-c]", 0..2),
        task_priority in 0i64..10,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let pool = common::setup_pool().await;
            let config = common::test_config();
            store::upsert_repo(&pool, "r", 100, false).await.unwrap();

            let worker = store::insert_worker(
                &pool,
                &NewWorker {
                    name: "w".into(),
                    handle: None,
                    skills: worker_skills,
                    capacity_points: worker_capacity,
                    max_concurrent_tasks: worker_slots,
                },
                "hash",
            )
            .await
            .unwrap();
            store::update_worker_heartbeat(&pool, &worker.worker_id, WorkerStatus::Idle, None)
                .await
                .unwrap();

            let task = store::insert_task(
                &pool,
                &NewTask {
                    repo: "r".into(),
                    title: "t".into(),
                    description: None,
                    estimate_points: task_points,
                    priority: task_priority,
                    required_skills: task_skills.clone(),
                    area: None,
                    tier: 1,
                },
            )
            .await
            .unwrap();

            workpool_core::matcher::run_matching_cycle(&pool, &config)
                .await
                .unwrap();

            let row = store::get_task(&pool, &task.task_id).await.unwrap().unwrap();

            if let Some(assigned_id) = &row.assigned_worker_id {
                prop_assert_eq!(assigned_id, &worker.worker_id);
                prop_assert!(row.required_skills().is_subset(&worker.skills()));
                prop_assert!(task_points <= worker_capacity);
            } else {
                let missing_skill = !row.required_skills().is_subset(&worker.skills());
                let over_capacity = task_points > worker_capacity;
                prop_assert!(missing_skill || over_capacity);
            }
            Ok(())
        })?;
    }
}
