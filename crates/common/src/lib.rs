//! Common utilities, constants, and resources used across the slotscope codebase.
//!
//! This crate provides shared functionality for the slotscope workspace, including
//! the JSON-RPC adapter used to read contract storage and general utility functions.

/// Constants used throughout the slotscope codebase.
pub mod constants;

/// Error types shared by the common utilities.
pub mod error;

/// Utilities for interacting with Ethereum nodes over JSON-RPC.
pub mod ether;

/// General utility functions and types for common tasks.
pub mod utils;
