//! Session record sink: created with raw features, updated with the verdict.

mod encrypted;

pub use encrypted::{SessionRecord, SessionStore};
