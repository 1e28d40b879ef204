use crate::models::Task;
use crate::storage::{KeyValueStore, LAST_CLEAR_DATE_KEY, TASKS_KEY};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, PartialEq, Eq)]
pub struct ResetDecision {
    pub should_reset: bool,
    pub new_last_date: String,
}

/// Decides whether today's first access must wipe the task list. A missing
/// or unparsable stored date counts as a different day.
pub fn reset_if_new_day(last_date: Option<&str>, today: NaiveDate) -> ResetDecision {
    let stored = last_date.and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok());
    ResetDecision {
        should_reset: stored != Some(today),
        new_last_date: today.format(DATE_FORMAT).to_string(),
    }
}

/// Durable mirror of the day's task list.
pub struct DailyStore<S> {
    store: S,
    checked: bool,
}

impl<S: KeyValueStore> DailyStore<S> {
    pub fn new(store: S) -> Self {
        DailyStore {
            store,
            checked: false,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted tasks. The first call also performs the daily
    /// reset check; storage problems degrade to an empty list.
    pub fn initialize(&mut self, today: NaiveDate) -> Vec<Task> {
        if !self.checked {
            match self.store.get(LAST_CLEAR_DATE_KEY) {
                Ok(last) => {
                    self.checked = true;
                    if self.reset_if_needed(last, today) {
                        return Vec::new();
                    }
                }
                // Unknown date: keep the stored list and retry the check next time
                Err(err) => warn!("Failed to read last clear date, skipping reset: {}", err),
            }
        }

        self.load()
    }

    fn reset_if_needed(&mut self, last: Option<String>, today: NaiveDate) -> bool {
        let decision = reset_if_new_day(last.as_deref(), today);
        if !decision.should_reset {
            return false;
        }

        info!(
            "New day {}, clearing tasks (last cleared {:?})",
            decision.new_last_date, last
        );
        // The date is only recorded once the wipe is durable
        if !self.write_tasks(&[]) {
            return true;
        }
        if let Err(err) = self
            .store
            .set(LAST_CLEAR_DATE_KEY, &decision.new_last_date)
        {
            error!("Failed to record clear date: {}", err);
        }
        true
    }

    fn load(&self) -> Vec<Task> {
        let raw = match self.store.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("Failed to read stored tasks: {}", err);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!("Loaded {} stored tasks", tasks.len());
                tasks
            }
            Err(err) => {
                warn!("Ignoring malformed stored tasks: {}", err);
                Vec::new()
            }
        }
    }

    /// Overwrites the stored list. Failures are logged, never returned.
    pub fn persist(&mut self, tasks: &[Task]) {
        self.write_tasks(tasks);
    }

    fn write_tasks(&mut self, tasks: &[Task]) -> bool {
        let json = match serde_json::to_string(tasks) {
            Ok(json) => json,
            Err(err) => {
                error!("Failed to serialize tasks: {}", err);
                return false;
            }
        };

        match self.store.set(TASKS_KEY, json.as_str()) {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to save tasks: {}", err);
                false
            }
        }
    }
}
