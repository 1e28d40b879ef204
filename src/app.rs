use crate::api::PriorityClassifier;
use crate::board::TaskBoard;
use crate::grouping::{flatten, PriorityGroup};
use crate::models::{Task, TaskFields};
use crate::parser::{category_token, parse_task_input};
use crate::storage::KeyValueStore;
use crossterm::event::{KeyCode, KeyEvent};
use tracing::{error, info};

pub struct App<S> {
    pub board: TaskBoard<S>,
    pub classifier: PriorityClassifier,
    pub selected: Option<usize>,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub form: TaskForm,
    pub busy: bool,
    pub show_setup_guide: bool,
    pub status_message: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Debug, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
}

/// Contents of the add/edit popup. `editing` holds the id of the task
/// being edited, `None` when adding.
#[derive(Debug, Default)]
pub struct TaskForm {
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub submit_requested: bool,
}

impl TaskForm {
    fn clear(&mut self) {
        *self = TaskForm::default();
    }

    fn from_task(task: &Task) -> Self {
        let mut title = task.title.clone();
        if let Some(deadline) = task.deadline {
            title.push_str(&format!(" @{}", deadline.format("%Y-%m-%d")));
        }
        if let Some(category) = &task.category {
            title.push(' ');
            title.push_str(&category_token(category));
        }
        TaskForm {
            editing: Some(task.id.clone()),
            title,
            description: task.description.clone().unwrap_or_default(),
            submit_requested: false,
        }
    }

    fn to_fields(&self) -> TaskFields {
        let parsed = parse_task_input(&self.title);
        TaskFields {
            title: parsed.title,
            description: Some(self.description.clone()),
            deadline: parsed.deadline,
            category: parsed.category,
        }
        .normalized()
    }
}

impl<S: KeyValueStore> App<S> {
    pub fn new(board: TaskBoard<S>, classifier: PriorityClassifier) -> App<S> {
        let selected = if board.tasks().is_empty() {
            None
        } else {
            Some(0)
        };
        App {
            board,
            classifier,
            selected,
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            form: TaskForm::default(),
            busy: false,
            show_setup_guide: false,
            status_message: None,
        }
    }

    pub fn groups(&self) -> Vec<PriorityGroup> {
        self.board.groups()
    }

    /// Tasks in on-screen order.
    pub fn visible_tasks(&self) -> Vec<Task> {
        flatten(&self.groups())
    }

    pub fn selected_task(&self) -> Option<Task> {
        let index = self.selected?;
        self.visible_tasks().into_iter().nth(index)
    }

    pub fn next(&mut self) {
        let len = self.board.tasks().len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(i) if i + 1 >= len => Some(0),
            Some(i) => Some(i + 1),
            None => Some(0),
        };
    }

    pub fn previous(&mut self) {
        let len = self.board.tasks().len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(0) | None => Some(len - 1),
            Some(i) => Some(i - 1),
        };
    }

    fn select_id(&mut self, id: &str) {
        self.selected = self.visible_tasks().iter().position(|t| t.id == id);
    }

    fn clamp_selection(&mut self) {
        let len = self.board.tasks().len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
    }

    pub fn delete_selected(&mut self) {
        if let Some(task) = self.selected_task() {
            if self.board.delete_task(&task.id) {
                info!("Deleted task {}", task.id);
                self.status_message = Some(format!("Deleted \"{}\"", task.title));
            }
            self.clamp_selection();
        }
    }

    /// True once a submitted form is waiting for classification.
    pub fn has_pending_submit(&self) -> bool {
        self.form.submit_requested
    }

    /// Runs the pending add/edit. Awaits the classifier, so the caller
    /// draws the busy overlay first and reads no input meanwhile.
    pub async fn submit_form(&mut self) {
        if !self.form.submit_requested {
            return;
        }
        self.form.submit_requested = false;

        let fields = self.form.to_fields();
        let result = match self.form.editing.clone() {
            Some(id) => self.board.edit_task(&id, fields, &self.classifier).await,
            None => self.board.add_task(fields, &self.classifier).await,
        };
        self.busy = false;

        match result {
            Ok(task) => {
                self.status_message = Some(match &task.time {
                    Some(time) => format!("\"{}\" is {} priority at {}", task.title, task.priority, time),
                    None => format!("\"{}\" is {} priority (no free slot)", task.title, task.priority),
                });
                self.select_id(&task.id);
            }
            Err(err) => {
                error!("Task submission failed: {}", err);
                self.status_message = Some(format!("Error: {}", err));
            }
        }

        self.form.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if self.show_setup_guide {
            self.show_setup_guide = false;
            return false;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('?') => self.show_setup_guide = true,
                KeyCode::Char('a') => {
                    self.form.clear();
                    self.active_input = ActiveInput::Title;
                    self.input_mode = InputMode::Editing;
                    self.status_message = None;
                }
                KeyCode::Char('e') => {
                    if let Some(task) = self.selected_task() {
                        self.form = TaskForm::from_task(&task);
                        self.active_input = ActiveInput::Title;
                        self.input_mode = InputMode::Editing;
                        self.status_message = None;
                    }
                }
                KeyCode::Char('d') => self.delete_selected(),
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => {
                    if parse_task_input(&self.form.title).title.is_empty() {
                        self.status_message = Some("Task title cannot be empty.".to_string());
                    } else {
                        self.form.submit_requested = true;
                        self.busy = true;
                    }
                }
                KeyCode::Esc => {
                    self.form.clear();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::Insert => match key.code {
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Title => self.form.title.push(c),
                    ActiveInput::Description => self.form.description.push(c),
                },
                KeyCode::Backspace => match self.active_input {
                    ActiveInput::Title => {
                        self.form.title.pop();
                    }
                    ActiveInput::Description => {
                        self.form.description.pop();
                    }
                },
                KeyCode::Esc => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },
        }
        false
    }
}
