//! # tr-core
//!
//! Core run tracking for tracerail.
//!
//! This crate provides:
//! - Snake layout of pipeline stages on a wrapped track
//! - Incremental decoding of the gateway's progress stream
//! - The run state machine that views project from
//! - A capacity-bounded, persisted run history ledger
//! - Configuration loading and the gateway HTTP client
//! - The run engine and the core service loop the TUI talks to
//!
//! ## Modules
//!
//! - [`layout`]: Stage grid positions and the connecting track path
//! - [`stream`]: Frame decoder with carry-over buffer
//! - [`state`]: Run state machine and payload previews
//! - [`history`]: Run history store and persistence ports
//! - [`config`]: Configuration loading and management
//! - [`gateway`]: Gateway trait and HTTP implementation
//! - [`engine`]: Run execution and the core service loop

pub mod config;
pub mod engine;
pub mod gateway;
pub mod history;
pub mod layout;
pub mod state;
pub mod stream;
