use serde::de::IgnoredAny;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{NewUser, User, UserPatch};
use crate::validation::{validate_new_user, validate_user_patch};

const USERS_PATH: &str = "/api/User";

#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self) -> Result<Vec<User>, ApiError> {
        self.client.get(USERS_PATH).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, ApiError> {
        self.client.get(&format!("{USERS_PATH}/{id}")).await
    }

    /// Also used for self-registration, so it works without a session.
    pub async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        validate_new_user(user)?;
        self.client.post(USERS_PATH, user).await
    }

    pub async fn update(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        validate_user_patch(patch)?;
        self.client.put(&format!("{USERS_PATH}/{id}"), patch).await
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&format!("{USERS_PATH}/{id}"))
            .await
            .map(|_| ())
    }
}
