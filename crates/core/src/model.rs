use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeSet;

/// Normalizes a skill tag the way the matcher compares them: trimmed,
/// lowercased. Empty tags are dropped by callers before they reach here.
pub fn normalize_skill(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_skills<I: IntoIterator<Item = S>, S: AsRef<str>>(raw: I) -> Vec<String> {
    raw.into_iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Working,
    Paused,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Paused => "paused",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "working" => Self::Working,
            "paused" => Self::Paused,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Ready,
    Leased,
    InProgress,
    Blocked,
    PrOpened,
    Merged,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Leased => "leased",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::PrOpened => "pr_opened",
            Self::Merged => "merged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "ready" => Self::Ready,
            "leased" => Self::Leased,
            "in_progress" => Self::InProgress,
            "blocked" => Self::Blocked,
            "pr_opened" => Self::PrOpened,
            "merged" => Self::Merged,
            _ => return None,
        })
    }
}

/// Worker-supplied structured evidence of completion (spec §3 `artifact`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub pr_url: Option<String>,
    pub commit_sha: Option<String>,
    pub patch_url: Option<String>,
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Repo {
    pub repo: String,
    pub max_open_prs: i64,
    pub area_locks_enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Worker {
    pub worker_id: String,
    pub name: String,
    pub handle: Option<String>,
    pub skills_json: Json<Vec<String>>,
    pub capacity_points: i64,
    pub max_concurrent_tasks: i64,
    pub status: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub token_hash: String,
    pub reputation: f64,
    pub created_at: DateTime<Utc>,
}

impl Worker {
    pub fn skills(&self) -> BTreeSet<String> {
        self.skills_json.0.iter().cloned().collect()
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_str(&self.status)
    }

    pub fn is_online(&self, now: DateTime<Utc>, heartbeat_ttl_seconds: i64) -> bool {
        match self.last_heartbeat {
            Some(hb) => (now - hb).num_seconds() <= heartbeat_ttl_seconds,
            None => false,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub task_id: String,
    pub repo: String,
    pub title: String,
    pub description: Option<String>,
    pub estimate_points: i64,
    pub priority: i64,
    pub required_skills_json: Json<Vec<String>>,
    pub area: Option<String>,
    pub tier: i64,
    pub status: String,
    pub assigned_worker_id: Option<String>,
    pub leased_at: Option<DateTime<Utc>>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub artifact_json: Option<Json<Artifact>>,
    pub attempt: i64,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn required_skills(&self) -> BTreeSet<String> {
        self.required_skills_json.0.iter().cloned().collect()
    }

    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::from_str(&self.status)
    }

    pub fn artifact(&self) -> Artifact {
        self.artifact_json
            .as_ref()
            .map(|j| j.0.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub ts: DateTime<Utc>,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub actor_worker_id: Option<String>,
    pub repo: Option<String>,
    pub task_id: Option<String>,
    pub details_json: Json<serde_json::Value>,
}

/// Parameters for inserting a new worker (spec §6 `register_worker`).
#[derive(Debug, Clone)]
pub struct NewWorker {
    pub name: String,
    pub handle: Option<String>,
    pub skills: Vec<String>,
    pub capacity_points: i64,
    pub max_concurrent_tasks: i64,
}

/// Parameters for inserting a new task (spec §6 `create_task`).
#[derive(Debug, Clone)]
pub struct NewTask {
    pub repo: String,
    pub title: String,
    pub description: Option<String>,
    pub estimate_points: i64,
    pub priority: i64,
    pub required_skills: Vec<String>,
    pub area: Option<String>,
    pub tier: i64,
}

/// Per-cycle totals returned by the matcher (spec §4.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub requeued: u64,
    pub assigned: u64,
    pub skipped_throttle: u64,
    pub skipped_area_lock: u64,
    pub skipped_no_worker: u64,
}
