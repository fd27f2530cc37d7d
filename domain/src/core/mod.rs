//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ErrorKind`]: failure classification used by every transport
//! - [`error::ErrorReport`]: a handled failure with its user-facing message
//! - [`string::preview`]: one-line log previews

pub mod error;
pub mod string;
