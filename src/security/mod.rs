//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (resolve client address, check allow-list)
//!     → 403 with empty body, or pass to routes
//! ```
//!
//! # Design Decisions
//! - Empty allow-list means open access
//! - X-Forwarded-For is trusted unless TRUST_FORWARDED_FOR=false; only safe
//!   behind a proxy that overwrites the header

pub mod access_control;

pub use access_control::{access_control_middleware, AccessGuard};
