/// Environment variable utilities.
pub mod env;

/// Hexadecimal encoding and decoding utilities.
pub mod hex;

/// HTTP request and response handling utilities.
pub mod http;

/// Input/output utilities for file manipulation.
pub mod io;

/// String manipulation and formatting utilities.
pub mod strings;

/// Time manipulation and formatting utilities.
pub mod time;
