//! Shared test utilities for the instrumentation libraries.
//!
//! This crate provides:
//! - A recording log sink and a scripted request executor
//! - Proptest generators for argument lists and transport errors
//! - Test fixtures with sample responses and configurations

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{RecordedEvent, RecordingSink, Scripted, ScriptedExecutor, SinkLevel};
