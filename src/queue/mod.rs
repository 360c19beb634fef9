//! Link queue
//!
//! Validation rules for submitted links and the ordered in-memory store
//! they wait in until the next successful dump.

mod link;
mod store;

pub use link::{Link, ValidationError, BLANK_SENTINEL};
pub use store::LinkQueue;
