//! Per-role aggregation over a task set.

use super::types::{RoleStat, RoleStats, Task};

/// Fold every (task, role) pair into per-role count and hours.
///
/// Duplicate roles inside one task each count. The emoji kept for a role
/// is the last non-empty label seen for that name.
pub fn aggregate_roles(tasks: &[Task]) -> RoleStats {
    let mut stats = RoleStats::new();
    for task in tasks {
        let hours = task.duration_hours();
        for role in task.effective_roles() {
            let stat = stats.entry(role.name.clone()).or_insert_with(|| RoleStat {
                count: 0,
                total_duration: 0.0,
                emoji: None,
            });
            stat.count += 1;
            stat.total_duration += hours;
            if let Some(emoji) = role.emoji.as_ref().filter(|e| !e.is_empty()) {
                stat.emoji = Some(emoji.clone());
            }
        }
    }
    stats
}

/// Sum of every task's duration in hours.
pub fn total_hours(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::duration_hours).sum()
}
