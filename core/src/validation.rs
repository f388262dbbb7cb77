//! Local payload checks run before any request is built.
//!
//! Rules match the backend's form contract: names and emails are required,
//! and an email must look like `local@domain.tld` with no whitespace.

use thiserror::Error;

use crate::types::{Credentials, NewTask, NewUser, TaskPatch, UserPatch};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("invalid email address: {value:?}")]
    InvalidEmail { value: String },
}

/// Same acceptance set as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot must have at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ValidationError> {
    required("email", value)?;
    if !is_valid_email(value) {
        return Err(ValidationError::InvalidEmail {
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn validate_new_task(task: &NewTask) -> Result<(), ValidationError> {
    required("name", &task.name)?;
    email(&task.email)
}

pub fn validate_task_patch(patch: &TaskPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        required("name", name)?;
    }
    if let Some(value) = &patch.email {
        email(value)?;
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    required("name", &user.name)?;
    email(&user.email)
}

pub fn validate_user_patch(patch: &UserPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        required("name", name)?;
    }
    if let Some(value) = &patch.email {
        email(value)?;
    }
    Ok(())
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    required("email", &credentials.email)?;
    required("password", &credentials.password)
}
