//! Utility functions and helpers for the nutralingo backend.
//!
//! This module provides cross-cutting concerns like structured logging,
//! API key sanitization, and retry logic with backoff for upstream calls.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Retry mechanisms that respect upstream `Retry-After` hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
