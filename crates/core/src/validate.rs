//! Field-bound checks from the data model (spec §3), surfaced as
//! `CoreError::BadRequest` per spec §7 ("violated field bounds from the
//! data model"). Pure validation, no I/O.

use crate::errors::{CoreError, CoreResult};
use crate::model::{NewTask, NewWorker};

fn bad(msg: impl Into<String>) -> CoreError {
    CoreError::BadRequest(msg.into())
}

pub fn new_worker(w: &NewWorker) -> CoreResult<()> {
    if w.name.trim().is_empty() {
        return Err(bad("worker name must not be empty"));
    }
    if !(1..=100).contains(&w.capacity_points) {
        return Err(bad("capacity_points must be in 1..=100"));
    }
    if !(1..=20).contains(&w.max_concurrent_tasks) {
        return Err(bad("max_concurrent_tasks must be in 1..=20"));
    }
    Ok(())
}

pub fn repo_key(repo: &str) -> CoreResult<()> {
    if repo.is_empty() || repo.len() > 200 {
        return Err(bad("repo key must be 1..=200 chars"));
    }
    Ok(())
}

pub fn max_open_prs(n: i64) -> CoreResult<()> {
    if n < 0 {
        return Err(bad("max_open_prs must be >= 0"));
    }
    Ok(())
}

pub fn new_task(t: &NewTask) -> CoreResult<()> {
    repo_key(&t.repo)?;
    if t.title.trim().is_empty() || t.title.len() > 300 {
        return Err(bad("title must be 1..=300 chars"));
    }
    if !(1..=100).contains(&t.estimate_points) {
        return Err(bad("estimate_points must be in 1..=100"));
    }
    if !(0..=1000).contains(&t.priority) {
        return Err(bad("priority must be in 0..=1000"));
    }
    if !(0..=3).contains(&t.tier) {
        return Err(bad("tier must be in 0..=3"));
    }
    if let Some(area) = &t.area {
        if area.len() > 120 {
            return Err(bad("area must be at most 120 chars"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(capacity_points: i64, max_concurrent_tasks: i64) -> NewWorker {
        NewWorker {
            name: "w".into(),
            handle: None,
            skills: vec![],
            capacity_points,
            max_concurrent_tasks,
        }
    }

    #[test]
    fn capacity_points_out_of_range_is_rejected() {
        assert!(new_worker(&worker(0, 1)).is_err());
        assert!(new_worker(&worker(101, 1)).is_err());
        assert!(new_worker(&worker(1, 1)).is_ok());
    }

    #[test]
    fn max_concurrent_tasks_out_of_range_is_rejected() {
        assert!(new_worker(&worker(5, 0)).is_err());
        assert!(new_worker(&worker(5, 21)).is_err());
    }

    #[test]
    fn repo_key_length_is_bounded() {
        assert!(repo_key("").is_err());
        assert!(repo_key(&"a".repeat(201)).is_err());
        assert!(repo_key("demo/repo").is_ok());
    }
}
