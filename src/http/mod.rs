//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → middleware/access_log.rs (request ID, span, access line, metrics)
//!     → API prefix? ── yes → forward::Forwarder
//!                   └─ no  → response.rs (404)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::RequestId;
pub use server::{AppState, HttpServer};
