//! # tr-protocol
//!
//! Core protocol definitions and data models for tracerail.
//!
//! This crate defines all shared data structures used for:
//! - The gateway's pipeline configuration and submission bodies
//! - Progress events decoded from the run stream
//! - Per-stage status and the persisted run history
//! - Inter-process communication between TUI and Core
//!
//! ## Modules
//!
//! - [`stage_models`]: Stages, stage statuses and payload types
//! - [`pipeline_models`]: Pipeline configuration and run submission
//! - [`event_models`]: Progress events streamed during a run
//! - [`history_models`]: Run records and the export document
//! - [`config_models`]: Client configuration from config.toml
//! - [`ipc`]: Operations and Events for Core-TUI communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other tracerail crates

pub mod config_models;
pub mod event_models;
pub mod history_models;
pub mod ipc;
pub mod pipeline_models;
pub mod stage_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use event_models::*;
pub use history_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use stage_models::*;
