//! Models Module
//!
//! Response DTOs for the diagnostics API.

mod responses;

pub use responses::*;
