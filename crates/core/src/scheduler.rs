use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::errors::{CoreError, CoreResult};
use crate::model::{Artifact, CycleStats, NewTask, Repo, Task, Worker, WorkerStatus};
use crate::session::{self, Registration};
use crate::statemachine;
use crate::store;

/// Single exclusive writer over the store. Every public method holds the
/// pool lock for the whole duration of its logical operation.
pub struct Scheduler {
    pool: Mutex<SqlitePool>,
    config: Config,
}

impl Scheduler {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool: Mutex::new(pool),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers a worker, then runs a cycle (spec §6 lists `register_worker`
    /// among the mutations that trigger a synchronous cycle after commit).
    /// In practice this is a no-op until the worker's first heartbeat makes
    /// it eligible, but it keeps the driver's triggering behavior uniform
    /// across every inbound mutation §6 names.
    pub async fn register_worker(
        &self,
        name: String,
        handle: Option<String>,
        skills: Vec<String>,
        capacity_points: i64,
        max_concurrent_tasks: i64,
    ) -> CoreResult<Registration> {
        crate::validate::new_worker(&crate::model::NewWorker {
            name: name.clone(),
            handle: handle.clone(),
            skills: skills.clone(),
            capacity_points,
            max_concurrent_tasks,
        })?;

        let registration = {
            let pool = self.pool.lock().await;
            session::register_worker(
                &pool,
                name,
                handle,
                skills,
                capacity_points,
                max_concurrent_tasks,
            )
            .await?
        };
        self.run_cycle().await?;
        Ok(registration)
    }

    /// Records a heartbeat, then runs a cycle: a worker going online (or
    /// changing status away from `paused`) is exactly the kind of mutation
    /// spec §4.6 calls out by name as needing an immediate synchronous
    /// cycle rather than waiting for the timer-driven driver.
    pub async fn heartbeat(
        &self,
        token: Option<&str>,
        status: WorkerStatus,
        note: Option<&str>,
    ) -> CoreResult<Worker> {
        let updated = {
            let pool = self.pool.lock().await;
            let worker = session::authenticate_worker(&pool, token).await?;
            session::heartbeat(&pool, &worker, status, note).await?;
            store::worker_by_id(&pool, &worker.worker_id)
                .await?
                .ok_or(CoreError::NotFound)?
        };
        self.run_cycle().await?;
        Ok(updated)
    }

    /// Upserts repo policy, then runs a cycle: raising `max_open_prs` or
    /// flipping `area_locks_enabled` can immediately free up assignments
    /// that were previously throttled or area-locked (spec §6).
    pub async fn upsert_repo(
        &self,
        repo: &str,
        max_open_prs: i64,
        area_locks_enabled: bool,
    ) -> CoreResult<Repo> {
        crate::validate::repo_key(repo)?;
        crate::validate::max_open_prs(max_open_prs)?;

        let updated = {
            let pool = self.pool.lock().await;
            store::upsert_repo(&pool, repo, max_open_prs, area_locks_enabled).await?
        };
        self.run_cycle().await?;
        Ok(updated)
    }

    pub async fn list_repos(&self) -> CoreResult<Vec<Repo>> {
        let pool = self.pool.lock().await;
        store::list_repos(&pool).await
    }

    pub async fn create_task(&self, new: NewTask) -> CoreResult<Task> {
        crate::validate::new_task(&new)?;

        let task = {
            let pool = self.pool.lock().await;
            if store::get_repo(&pool, &new.repo).await?.is_none() {
                return Err(CoreError::BadRequest(format!(
                    "unknown repo: {}",
                    new.repo
                )));
            }
            let new = NewTask {
                required_skills: crate::model::normalize_skills(new.required_skills.clone()),
                ..new
            };
            let task = store::insert_task(&pool, &new).await?;
            store::log_event(
                &pool,
                "task.create",
                None,
                Some(&task.repo),
                Some(&task.task_id),
                serde_json::json!({ "title": task.title }),
            )
            .await?;
            task
        };

        self.run_cycle().await?;
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str) -> CoreResult<Task> {
        let pool = self.pool.lock().await;
        store::get_task(&pool, task_id).await?.ok_or(CoreError::NotFound)
    }

    pub async fn list_tasks_for_worker(&self, token: Option<&str>) -> CoreResult<Vec<Task>> {
        let pool = self.pool.lock().await;
        let worker = session::authenticate_worker(&pool, token).await?;
        store::list_tasks_for_worker(&pool, &worker.worker_id).await
    }

    /// Worker-driven status update (spec §4.4/§4.6). Validates ownership and
    /// the transition table, persists, then triggers a synchronous cycle so
    /// newly freed capacity is reassigned immediately.
    pub async fn update_task_status(
        &self,
        token: Option<&str>,
        task_id: &str,
        new_status: crate::model::TaskStatus,
        message: Option<&str>,
        artifact: Option<Artifact>,
    ) -> CoreResult<Task> {
        let updated = {
            let pool = self.pool.lock().await;
            let worker = session::authenticate_worker(&pool, token).await?;
            let task = store::get_task(&pool, task_id).await?.ok_or(CoreError::NotFound)?;

            if task.assigned_worker_id.as_deref() != Some(worker.worker_id.as_str()) {
                return Err(CoreError::Forbidden);
            }

            let current = task.status().ok_or_else(|| {
                CoreError::BadRequest(format!("task {task_id} has unrecognized status"))
            })?;

            if !statemachine::is_allowed(current, new_status) {
                return Err(CoreError::BadRequest(format!(
                    "transition {} -> {} is not allowed",
                    current.as_str(),
                    new_status.as_str()
                )));
            }

            let updated =
                store::update_task_status(&pool, task_id, new_status, message, artifact.as_ref())
                    .await?;

            store::log_event(
                &pool,
                "task.status",
                Some(&worker.worker_id),
                Some(&updated.repo),
                Some(task_id),
                serde_json::json!({
                    "from": current.as_str(),
                    "to": new_status.as_str(),
                }),
            )
            .await?;

            updated
        };

        self.run_cycle().await?;
        Ok(updated)
    }

    /// Aggregate task counts by status, optionally scoped to one repo
    /// (spec §6 `counts_by_status`).
    pub async fn counts_by_status(&self, repo: Option<&str>) -> CoreResult<Vec<(String, i64)>> {
        let pool = self.pool.lock().await;
        store::counts_by_status(&pool, repo).await
    }

    /// Count of workers currently online (spec §6 derived `workers_online`).
    pub async fn workers_online(&self) -> CoreResult<i64> {
        let pool = self.pool.lock().await;
        store::workers_online_count(&pool, crate::clock::utc_now(), self.config.heartbeat_ttl_seconds)
            .await
    }

    /// Runs one matching cycle now, synchronously. Called both by the
    /// background driver on its interval and inline after mutations that
    /// can free or create work (spec §4.6).
    pub async fn run_cycle(&self) -> CoreResult<CycleStats> {
        let pool = self.pool.lock().await;
        crate::matcher::run_matching_cycle(&pool, &self.config).await
    }
}
