use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Variant order gives High > Medium > Low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Display order for grouped views.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

impl fmt::Display for UnknownPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown priority {:?}", self.0)
    }
}

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

// Task as stored under the `tasks` key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// The user-editable part of a task. Id, priority and time are never
/// supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub category: Option<String>,
}

impl TaskFields {
    pub fn new(title: impl Into<String>) -> Self {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Trims every text field; blank optional fields become `None`.
    pub fn normalized(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        TaskFields {
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            deadline: self.deadline,
            category: non_blank(self.category),
        }
    }
}

#[cfg(test)]
impl TaskFields {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_parse_is_exact() {
        assert_eq!("High".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("Low".parse::<Priority>(), Ok(Priority::Low));
        assert!("high".parse::<Priority>().is_err());
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_task_json_omits_absent_fields() {
        let task = Task {
            id: "abc".to_string(),
            title: "Call mom".to_string(),
            description: None,
            deadline: None,
            category: None,
            priority: Priority::Medium,
            time: Some("17:00".to_string()),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"id":"abc","title":"Call mom","priority":"Medium","time":"17:00"}"#
        );
    }

    #[test]
    fn test_task_json_reads_deadline() {
        let json = r#"{"id":"1","title":"Report","deadline":"2024-05-02","priority":"High"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.time, None);
    }

    #[test]
    fn test_task_json_rejects_free_text_priority() {
        let json = r#"{"id":"1","title":"Report","priority":"Whenever"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_normalized_drops_blank_fields() {
        let fields = TaskFields::new("  Buy milk ")
            .with_description("   ")
            .with_category(" home ")
            .normalized();
        assert_eq!(fields.title, "Buy milk");
        assert_eq!(fields.description, None);
        assert_eq!(fields.category, Some("home".to_string()));
    }
}
