//! Storage infrastructure: settings and topology files.
//!
//! - **`config`**   – the negotiator's own settings (`settings.toml`) in the
//!   platform-appropriate config directory, with defaults on first run.
//! - **`topology`** – [`DisplayConfig`](display_core::DisplayConfig) fixtures
//!   stored as TOML, used by the scripted backend and the CLI.
//!
//! Both share [`config::ConfigError`].

pub mod config;
pub mod topology;
