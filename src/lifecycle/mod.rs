//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main):
//!     Load config → Validate → Start upstream child → Bind listener → Serve
//!
//! Shutdown:
//!     signals.rs (SIGINT/SIGTERM) → shutdown.rs broadcast
//!         → HTTP server drains
//!         → supervisor.rs terminates the upstream child → Exit
//! ```
//!
//! # Design Decisions
//! - The upstream child is started before the listener, so early requests
//!   race its startup and may get the fallback 500
//! - Child termination has a grace period: forced kill after the deadline

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::{SupervisorError, UpstreamSupervisor};
