use crate::model::TaskStatus;

/// Worker-driven transitions allowed on a task. Leasing (`ready -> leased`)
/// and lease expiry (`leased -> ready`) are matcher/lease-manager moves, not
/// worker-driven, and are not part of this table.
const ALLOWED_TRANSITIONS: &[(TaskStatus, TaskStatus)] = &[
    (TaskStatus::Leased, TaskStatus::InProgress),
    (TaskStatus::Leased, TaskStatus::Blocked),
    (TaskStatus::InProgress, TaskStatus::Blocked),
    (TaskStatus::InProgress, TaskStatus::PrOpened),
    (TaskStatus::Blocked, TaskStatus::InProgress),
    (TaskStatus::Blocked, TaskStatus::PrOpened),
    (TaskStatus::PrOpened, TaskStatus::Merged),
    (TaskStatus::PrOpened, TaskStatus::InProgress),
];

/// Whether a worker may move a task directly from `from` to `to`. Strict:
/// any pair not in the table is rejected, including same-state no-ops.
pub fn is_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    ALLOWED_TRANSITIONS.contains(&(from, to))
}
