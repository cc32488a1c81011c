//! huddle-core: snap store, lock manager, and RAG rollup engine.
//!
//! Daily standup snapshots ("snaps") are recorded against cards inside
//! time-boxed sprints. A traffic-light health signal (RAG) is aggregated
//! bottom-up from snap to card to assignee to sprint to project, and an
//! irreversible daily/slot lock freezes a day's data and feeds summary
//! generation.
//!
//! # Conventions
//!
//! - **Errors**: [`error::CoreError`] with stable machine codes for the
//!   service surface; `anyhow::Result` at the store-opening edge.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Time**: never read the wall clock in business logic; take a
//!   [`clock::Clock`].

pub mod classify;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod freeze;
pub mod model;
pub mod rag;
pub mod service;
pub mod summary;

pub use error::{CoreError, CoreResult, ErrorCode};
pub use service::{CreateSnapRequest, StandupService, UpdateSnapRequest};
