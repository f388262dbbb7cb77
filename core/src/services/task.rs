use serde::de::IgnoredAny;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{NewTask, Task, TaskPatch};
use crate::validation::{validate_new_task, validate_task_patch};

const TASKS_PATH: &str = "/api/Task";

#[derive(Debug, Clone)]
pub struct TaskService {
    client: ApiClient,
}

impl TaskService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self) -> Result<Vec<Task>, ApiError> {
        self.client.get(TASKS_PATH).await
    }

    /// Fails with a 404 `Request` error when the id does not exist.
    pub async fn get_by_id(&self, id: i64) -> Result<Task, ApiError> {
        self.client.get(&format!("{TASKS_PATH}/{id}")).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        validate_new_task(task)?;
        self.client.post(TASKS_PATH, task).await
    }

    pub async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task, ApiError> {
        validate_task_patch(patch)?;
        self.client.put(&format!("{TASKS_PATH}/{id}"), patch).await
    }

    /// Any body the server sends back on success is discarded.
    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&format!("{TASKS_PATH}/{id}"))
            .await
            .map(|_| ())
    }
}
