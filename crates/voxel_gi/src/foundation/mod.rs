//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the baker:
//! - Math types and operations
//! - Time measurement for stage reporting
//! - Logging utilities

pub mod logging;
pub mod math;
pub mod time;
