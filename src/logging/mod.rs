//! Structured logging setup and the session audit line.

mod format;

pub use format::{AuditEvent, StructuredLogger};
