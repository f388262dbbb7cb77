//! Typed façades over `ApiClient`, one per resource family.
//!
//! # Design
//! Each method maps to exactly one HTTP call with a fixed path and verb.
//! Errors are propagated untouched; presentation decisions belong to the
//! caller. Payloads are validated locally before a request is built, so a
//! `Validation` error guarantees nothing went over the wire.
//!
//! `AuthService::login` returns the token and leaves storing it to the
//! caller, keeping the dependency one-way: caller → service → session.

mod auth;
mod task;
mod user;

pub use auth::AuthService;
pub use task::TaskService;
pub use user::UserService;
