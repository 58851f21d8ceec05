//! Application layer use cases for the display negotiator.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure topology model and layout rules in `display_core`) and the
//! infrastructure (compositor protocols, files, the CLI).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a caller's goal (e.g., "switch
//!   this monitor to 2560x1440 and keep every other monitor where it was").
//! - **Depend on abstractions** (the [`backend::DisplayBackend`] trait) rather
//!   than concrete window-system code, so backends can be swapped and mocked.
//! - **Contain no OS calls, no protocol I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`backend`**       – The two-hook trait every window-system adapter
//!   implements, plus the inert [`backend::NullBackend`].
//! - **`build_target`**  – Pure functions that turn a freshly fetched snapshot
//!   into the target snapshot for an exclusive mode change or a restore.
//! - **`config_manager`** – [`config_manager::DisplayConfigManager`], the
//!   stateful engine: current/saved snapshots, change notification, and the
//!   fetch → build → adjust → apply negotiation sequence.

pub mod backend;
pub mod build_target;
pub mod config_manager;
