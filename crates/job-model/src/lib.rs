//! qtov Job Model
//!
//! Defines the data contracts exchanged with callers:
//! - **Job:** the JSON job description (source video, quote, style, output)
//! - **Style:** caption styling with per-field defaults
//! - **Result:** the one-line JSON result printed on success
//!
//! Parsing and validation live here so that a malformed job is rejected
//! before any media tool is spawned.

pub mod job;
pub mod style;

pub use job::*;
pub use style::*;
