//! Client-side data access and session layer for the task/user service.
//!
//! # Overview
//! - `SessionStore` holds the bearer token, hydrated once from a durable
//!   slot and written only on login/logout.
//! - `ApiClient` is the only component that talks to the network. It
//!   prefixes the configured base address, attaches `Authorization: Bearer`
//!   when a token is present, and turns responses into `Result<T, ApiError>`.
//! - `AuthService`, `TaskService` and `UserService` are thin typed façades
//!   mapping REST verbs to domain operations.
//!
//! # Design
//! - Request building and response parsing are pure functions on
//!   `ApiClient`; the I/O sits behind the `Transport` trait (`reqwest` in
//!   production, `FakeTransport` in tests).
//! - The session store is injected into the client as `Arc<SessionStore>`
//!   rather than living in a global.
//! - Errors are never swallowed or retried in this layer.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{ApiClient, Auth};
pub use config::{load_config, load_config_from_path, ClientConfig, ConfigError};
pub use error::{ApiError, SessionError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use services::{AuthService, TaskService, UserService};
pub use session::{FileTokenStorage, MemoryTokenStorage, SessionState, SessionStore, TokenStorage};
pub use transport::{FakeTransport, ReqwestTransport};
pub use types::{
    Credentials, LoginResponse, NewTask, NewUser, Task, TaskPatch, TaskStatus, User, UserPatch,
};
pub use validation::ValidationError;
