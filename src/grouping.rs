use crate::models::{Priority, Task};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub struct PriorityGroup {
    pub priority: Priority,
    pub tasks: Vec<Task>,
}

/// Splits tasks into one bucket per priority, in `Priority::ALL` order.
/// Every bucket is present even when empty. Inside a bucket tasks are sorted
/// by `time`; untimed tasks go last and keep their input order.
pub fn group_by_priority(tasks: &[Task]) -> Vec<PriorityGroup> {
    Priority::ALL
        .iter()
        .map(|&priority| {
            let mut bucket: Vec<Task> = tasks
                .iter()
                .filter(|task| task.priority == priority)
                .cloned()
                .collect();
            // sort_by is stable
            bucket.sort_by(compare_time);
            PriorityGroup {
                priority,
                tasks: bucket,
            }
        })
        .collect()
}

pub fn flatten(groups: &[PriorityGroup]) -> Vec<Task> {
    groups
        .iter()
        .flat_map(|group| group.tasks.iter().cloned())
        .collect()
}

// "HH:00" sorts lexicographically in time order
fn compare_time(a: &Task, b: &Task) -> Ordering {
    match (&a.time, &b.time) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
