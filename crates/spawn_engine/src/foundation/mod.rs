//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types used by key-value fields
//! - Logging utilities

pub mod math;
pub mod logging;
