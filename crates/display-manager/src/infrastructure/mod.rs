//! Infrastructure layer for the display negotiator.
//!
//! Contains adapters around the application layer: the in-memory scripted
//! backend, TOML settings and topology storage, and logging setup.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `display_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod logging;
pub mod scripted_backend;
pub mod storage;
