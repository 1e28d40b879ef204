use crate::config::{DEFAULT_END_HOUR, DEFAULT_START_HOUR};
use crate::models::Task;
use std::collections::HashSet;

/// Half-open range of hourly slots, `[start_hour, end_hour)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for SlotWindow {
    fn default() -> Self {
        SlotWindow {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl SlotWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        SlotWindow {
            start_hour,
            end_hour,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = String> {
        (self.start_hour..self.end_hour).map(format_slot)
    }
}

pub fn format_slot(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// First slot in the window not already taken by a task, or `None` when
/// every slot is booked. Input order does not matter.
pub fn next_available_slot(existing: &[Task], window: SlotWindow) -> Option<String> {
    let used: HashSet<&str> = existing
        .iter()
        .filter_map(|task| task.time.as_deref())
        .collect();

    window.slots().find(|slot| !used.contains(slot.as_str()))
}
