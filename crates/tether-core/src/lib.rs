//! Tether Core - Outcomes, sinks and promises
//!
//! This crate defines the types shared by every Tether layer:
//! - The outcome container (pending, success, failure, timeout)
//! - Failure causes and the error taxonomy
//! - The two sink shapes (simple callback, result callback)
//! - Settable promises with observers

pub mod error;
pub mod outcome;
pub mod callback;
pub mod promise;

pub use error::*;
pub use outcome::*;
pub use callback::*;
pub use promise::*;
