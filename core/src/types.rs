//! Domain DTOs for the task/user API.
//!
//! # Design
//! The backend speaks camelCase JSON with server-assigned integer ids.
//! Records (`Task`, `User`) are point-in-time copies of server state; the
//! client only ever sends the id-less `New*` shapes or the `*Patch` shapes.
//! `Task.user` and `User.tasks` are read-only joins filled in by the server
//! and never appear in an outgoing payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Workflow state of a task, carried on the wire as its integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskStatusError {
    #[error("unknown task status code {0}")]
    UnknownCode(u8),

    #[error("unknown task status {0:?}")]
    UnknownName(String),
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn code(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for TaskStatus {
    type Error = TaskStatusError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TaskStatus::Pending),
            1 => Ok(TaskStatus::InProgress),
            2 => Ok(TaskStatus::Completed),
            other => Err(TaskStatusError::UnknownCode(other)),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = TaskStatusError;

    /// Accepts the integer code or a name: `pending`, `in-progress`,
    /// `in_progress`, `inprogress`, `completed` (any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return TaskStatus::try_from(code);
        }
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "inprogress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(TaskStatusError::UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub status: TaskStatus,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Request payload for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Partial task update. Only the fields present are sent; the server leaves
/// the others unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }
}

/// A user as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

impl User {
    /// Number of tasks in the server-provided aggregate, zero when absent.
    pub fn task_count(&self) -> usize {
        self.tasks.as_ref().map_or(0, Vec::len)
    }
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial user update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self == &UserPatch::default()
    }
}

/// Login request body.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_integer_code() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "1");
        let status: TaskStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn status_rejects_unknown_code() {
        let result: Result<TaskStatus, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }

    #[test]
    fn status_parses_names_and_codes() {
        assert_eq!("pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("In Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("COMPLETED".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("1".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!(matches!(
            "done".parse::<TaskStatus>(),
            Err(TaskStatusError::UnknownName(_))
        ));
    }

    #[test]
    fn status_labels() {
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn task_uses_camel_case_and_reads_joined_user() {
        let json = r#"{
            "id": 3,
            "name": "Write report",
            "description": null,
            "status": 1,
            "email": "a@b.com",
            "userId": 9,
            "user": {"id": 9, "name": "Ana", "email": "ana@b.com"}
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.user_id, Some(9));
        assert_eq!(task.user.as_ref().map(|u| u.name.as_str()), Some("Ana"));
    }

    #[test]
    fn new_task_omits_absent_user_id() {
        let input = NewTask {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["status"], 0);
        assert_eq!(body["description"], "");
        assert!(body.get("userId").is_none());
        assert!(body.get("id").is_none());
    }

    #[test]
    fn task_patch_serializes_only_present_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            user_id: Some(4),
            ..Default::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({"status": 2, "userId": 4}));
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn user_task_count_defaults_to_zero() {
        let user: User = serde_json::from_str(r#"{"id":1,"name":"Ana","email":"ana@b.com"}"#).unwrap();
        assert_eq!(user.task_count(), 0);
        assert!(user.tasks.is_none());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("a@b.com"));
    }
}
