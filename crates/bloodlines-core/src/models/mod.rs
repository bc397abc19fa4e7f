//! Domain models for blood-test tracking.

mod range;
mod record;

pub use range::*;
pub use record::*;
