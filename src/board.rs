use crate::api::PriorityClassifier;
use crate::daily::DailyStore;
use crate::error::TaskError;
use crate::grouping::{group_by_priority, PriorityGroup};
use crate::models::{Task, TaskFields};
use crate::slots::{next_available_slot, SlotWindow};
use crate::storage::KeyValueStore;
use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

/// The day's task list plus its durable mirror. Every mutation is persisted
/// before it returns.
pub struct TaskBoard<S> {
    tasks: Vec<Task>,
    daily: DailyStore<S>,
    window: SlotWindow,
}

impl<S: KeyValueStore> TaskBoard<S> {
    pub fn new(store: S, window: SlotWindow) -> Self {
        TaskBoard {
            tasks: Vec::new(),
            daily: DailyStore::new(store),
            window,
        }
    }

    pub fn initialize(&mut self, today: NaiveDate) -> &[Task] {
        self.tasks = self.daily.initialize(today);
        info!("Board ready with {} tasks", self.tasks.len());
        &self.tasks
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn groups(&self) -> Vec<PriorityGroup> {
        group_by_priority(&self.tasks)
    }

    pub async fn add_task(
        &mut self,
        fields: TaskFields,
        classifier: &PriorityClassifier,
    ) -> Result<Task, TaskError> {
        let fields = fields.normalized();
        if fields.title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }

        let priority = classifier.classify(&fields).await;
        let time = next_available_slot(&self.tasks, self.window);
        if time.is_none() {
            debug!("All slots booked, {:?} gets no time", fields.title);
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description,
            deadline: fields.deadline,
            category: fields.category,
            priority,
            time,
        };
        self.tasks.push(task.clone());
        self.daily.persist(&self.tasks);
        Ok(task)
    }

    /// Replaces the editable fields and priority of a task. Its id and
    /// time slot are kept.
    pub async fn edit_task(
        &mut self,
        id: &str,
        fields: TaskFields,
        classifier: &PriorityClassifier,
    ) -> Result<Task, TaskError> {
        let fields = fields.normalized();
        if fields.title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if self.get(id).is_none() {
            return Err(TaskError::NotFound(id.to_string()));
        }

        let priority = classifier.classify(&fields).await;

        // Looked up again after the await
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        *task = Task {
            id: task.id.clone(),
            title: fields.title,
            description: fields.description,
            deadline: fields.deadline,
            category: fields.category,
            priority,
            time: task.time.clone(),
        };
        let updated = task.clone();

        self.daily.persist(&self.tasks);
        Ok(updated)
    }

    /// Returns whether a task was removed.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            self.daily.persist(&self.tasks);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClassifierConfig;
    use crate::models::Priority;
    use crate::storage::memory::MemoryStore;
    use crate::storage::{FileStore, LAST_CLEAR_DATE_KEY, TASKS_KEY};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn offline() -> PriorityClassifier {
        PriorityClassifier::new(ClassifierConfig {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: None,
            fallback: Priority::Medium,
        })
    }

    async fn answering(priority: &str) -> (MockServer, PriorityClassifier) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": format!(r#"{{"priority":"{}"}}"#, priority) }] }
                }]
            })))
            .mount(&server)
            .await;
        let classifier = PriorityClassifier::new(ClassifierConfig {
            api_key: Some("secret".to_string()),
            model: "gemini-2.5-flash".to_string(),
            base_url: server.uri(),
            timeout: None,
            fallback: Priority::Medium,
        });
        (server, classifier)
    }

    fn board() -> TaskBoard<MemoryStore> {
        let mut board = TaskBoard::new(MemoryStore::default(), SlotWindow::default());
        board.initialize(today());
        board
    }

    fn stored(board: &TaskBoard<MemoryStore>) -> Vec<Task> {
        let raw = board.daily.store().values.get(TASKS_KEY).cloned().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_add_delete_readd_slots() {
        let classifier = offline();
        let mut board = board();
        let tomorrow = today().succ_opt().unwrap();

        let first = board
            .add_task(TaskFields::new("Submit report").with_deadline(tomorrow), &classifier)
            .await
            .unwrap();
        assert_eq!(first.time.as_deref(), Some("17:00"));
        assert_eq!(first.priority, Priority::Medium);
        assert_eq!(first.deadline, Some(tomorrow));

        let second = board
            .add_task(TaskFields::new("Cook dinner"), &classifier)
            .await
            .unwrap();
        assert_eq!(second.time.as_deref(), Some("18:00"));
        assert_ne!(first.id, second.id);

        assert!(board.delete_task(&first.id));
        let third = board
            .add_task(TaskFields::new("Read"), &classifier)
            .await
            .unwrap();
        assert_eq!(third.time.as_deref(), Some("17:00"));

        assert_eq!(stored(&board), board.tasks().to_vec());
    }

    #[tokio::test]
    async fn test_sixth_task_gets_no_slot() {
        let classifier = offline();
        let mut board = board();
        for i in 0..5 {
            board
                .add_task(TaskFields::new(format!("task {}", i)), &classifier)
                .await
                .unwrap();
        }
        let extra = board
            .add_task(TaskFields::new("one too many"), &classifier)
            .await
            .unwrap();
        assert_eq!(extra.time, None);
        assert_eq!(board.tasks().len(), 6);
    }

    #[tokio::test]
    async fn test_empty_title_rejected_before_classifying() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let classifier = PriorityClassifier::new(ClassifierConfig {
            api_key: Some("secret".to_string()),
            model: "m".to_string(),
            base_url: server.uri(),
            timeout: None,
            fallback: Priority::Medium,
        });

        let mut board = board();
        let err = board
            .add_task(TaskFields::new("   "), &classifier)
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::EmptyTitle);
        assert!(board.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_classified_priority_is_stored() {
        let (_server, classifier) = answering("High").await;
        let mut board = board();
        let task = board
            .add_task(TaskFields::new("Pay rent").with_category("bills"), &classifier)
            .await
            .unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(board.groups()[0].tasks, vec![task]);
    }

    #[tokio::test]
    async fn test_edit_keeps_id_and_time() {
        let mut board = board();
        let original = board
            .add_task(TaskFields::new("Draft email"), &offline())
            .await
            .unwrap();

        let (_server, classifier) = answering("Low").await;
        let edited = board
            .edit_task(
                &original.id,
                TaskFields::new("Draft newsletter").with_description("monthly"),
                &classifier,
            )
            .await
            .unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.time, original.time);
        assert_eq!(edited.title, "Draft newsletter");
        assert_eq!(edited.description.as_deref(), Some("monthly"));
        assert_eq!(edited.priority, Priority::Low);
        assert_eq!(board.tasks(), &[edited.clone()]);
        assert_eq!(stored(&board), vec![edited]);
    }

    #[tokio::test]
    async fn test_edit_missing_task_is_not_found() {
        let mut board = board();
        board
            .add_task(TaskFields::new("Stay"), &offline())
            .await
            .unwrap();
        let before = board.tasks().to_vec();

        let err = board
            .edit_task("gone", TaskFields::new("New title"), &offline())
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::NotFound("gone".to_string()));
        assert_eq!(board.tasks(), before.as_slice());
    }

    #[tokio::test]
    async fn test_edit_rejects_empty_title() {
        let mut board = board();
        let task = board
            .add_task(TaskFields::new("Stay"), &offline())
            .await
            .unwrap();
        let err = board
            .edit_task(&task.id, TaskFields::new(""), &offline())
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::EmptyTitle);
        assert_eq!(board.get(&task.id).unwrap().title, "Stay");
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut board = board();
        assert!(!board.delete_task("nope"));
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_memory_authoritative() {
        let mut store = MemoryStore::default();
        store.fail_writes = true;
        let mut board = TaskBoard::new(store, SlotWindow::default());
        board.initialize(today());

        let task = board
            .add_task(TaskFields::new("Still here"), &offline())
            .await
            .unwrap();
        assert_eq!(board.tasks(), &[task]);
    }

    #[tokio::test]
    async fn test_file_backed_session_survives_restart() {
        let dir = TempDir::new().unwrap();
        let mut board = TaskBoard::new(FileStore::new(dir.path()), SlotWindow::default());
        board.initialize(today());
        let task = board
            .add_task(TaskFields::new("Persisted"), &offline())
            .await
            .unwrap();

        let mut same_day = TaskBoard::new(FileStore::new(dir.path()), SlotWindow::default());
        assert_eq!(same_day.initialize(today()), &[task]);

        let mut next_day = TaskBoard::new(FileStore::new(dir.path()), SlotWindow::default());
        assert!(next_day.initialize(today().succ_opt().unwrap()).is_empty());
        let stamp = std::fs::read_to_string(dir.path().join(LAST_CLEAR_DATE_KEY)).unwrap();
        assert_eq!(stamp, "2024-05-02");
    }
}
