//! Integration with the TIMOCOM freight exchange: request building, the HTTP client and
//! response post-processing. The exchange's own semantics are treated as opaque.

pub mod client;
pub mod offers;
pub mod problem;
pub mod request;
pub mod sequence;

pub use client::{TimocomClient, TimocomError};
