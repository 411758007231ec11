//! HTTP surface: router, handlers and the error responder

mod error;
mod routes;
mod server;

pub use error::ApiError;
pub use server::{router, ApiServer, AppState};
