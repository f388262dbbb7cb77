use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Credentials, LoginResponse};
use crate::validation::validate_credentials;

pub const LOGIN_PATH: &str = "/api/Conta/login";

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// The request never carries an Authorization header, even when a
    /// session is already active.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validate_credentials(&credentials)?;

        let response: LoginResponse = self
            .client
            .post_anonymous(LOGIN_PATH, &credentials)
            .await?;
        Ok(response.token)
    }
}
