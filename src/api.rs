use crate::config::Config;
use crate::error::ClassifyError;
use crate::models::{Priority, TaskFields};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    /// Returned whenever the service cannot give an answer.
    pub fallback: Priority,
}

impl From<&Config> for ClassifierConfig {
    fn from(config: &Config) -> Self {
        ClassifierConfig {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
            fallback: config.default_priority,
        }
    }
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PriorityReply {
    priority: String,
}

pub struct PriorityClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl PriorityClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        if config.api_key.is_none() {
            warn!(
                "API key not set. AI prioritization is disabled; tasks default to {} priority.",
                config.fallback
            );
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|err| {
            warn!("Falling back to default HTTP client: {}", err);
            Client::new()
        });

        PriorityClassifier { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Always resolves to a priority. One request at most; any failure
    /// yields the configured fallback.
    pub async fn classify(&self, task: &TaskFields) -> Priority {
        let api_key = match &self.config.api_key {
            Some(key) => key,
            None => return self.config.fallback,
        };

        let reply = match self.request_priority(api_key, task).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("Error getting task priority: {}", err);
                return self.config.fallback;
            }
        };

        match reply.priority.parse::<Priority>() {
            Ok(priority) => {
                debug!("Classified {:?} as {}", task.title, priority);
                priority
            }
            Err(err) => {
                warn!(
                    "Service returned an invalid priority: {}. Defaulting to {}.",
                    err, self.config.fallback
                );
                self.config.fallback
            }
        }
    }

    async fn request_priority(
        &self,
        api_key: &str,
        task: &TaskFields,
    ) -> Result<PriorityReply, ClassifyError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body(task))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ClassifyError::Status { status, body });
        }

        let response = res.json::<GenerateResponse>().await?;
        let text = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or(ClassifyError::EmptyResponse)?;

        Ok(serde_json::from_str(text.trim())?)
    }
}

pub fn build_prompt(task: &TaskFields) -> String {
    let description = task
        .description
        .as_deref()
        .unwrap_or("No description provided.");
    let deadline = task
        .deadline
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "No deadline specified.".to_string());
    let category = task.category.as_deref().unwrap_or("No category specified.");

    format!(
        "Analyze the following task and determine its priority level (High, Medium, or Low).\n\
         Consider the title, description, and deadline.\n\
         - High priority is for urgent, important tasks, especially with a close deadline.\n\
         - Medium priority is for important but not immediately urgent tasks.\n\
         - Low priority is for tasks that are not time-sensitive or critical.\n\
         \n\
         Task Details:\n\
         - Title: {}\n\
         - Description: {}\n\
         - Deadline: {}\n\
         - Category: {}\n\
         \n\
         Respond ONLY with the determined priority in the specified JSON format.",
        task.title, description, deadline, category
    )
}

fn request_body(task: &TaskFields) -> Value {
    let allowed: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();

    json!({
        "contents": [{
            "parts": [{ "text": build_prompt(task) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "priority": {
                        "type": "STRING",
                        "enum": allowed,
                        "description": "The priority of the task."
                    }
                },
                "required": ["priority"]
            }
        }
    })
}
