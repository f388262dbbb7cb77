//! `Transport` implementations.

mod fake;
mod reqwest_transport;

pub use fake::FakeTransport;
pub use reqwest_transport::ReqwestTransport;
