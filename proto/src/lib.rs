//! Passenger record types shared across the survival prediction workspace.
//!
//! - [`Value`]: the closed set of scalar kinds a record field may hold
//! - [`Record`]: one passenger, an ordered mapping of field names to values
//! - [`Batch`]: the ordered records submitted in one request
//! - [`decode_batch`] / [`encode_batch`]: JSON codec for request and response bodies

pub mod codec;
pub mod record;
pub mod value;

// Re-export commonly used items
pub use codec::{decode_batch, encode_batch, DecodeError};
pub use record::{Batch, Record};
pub use value::Value;
