//! Document Module
//!
//! The in-memory unit of storage and the rules for laying it out as a row.
//!
//! ## Row Layout
//! ```text
//! row key:  {id}:{table}
//! ┌──────────────────────────────────────────────┐
//! │ column family (default "d")                  │
//! │ ┌────────────────────┬─────────────────────┐ │
//! │ │ data               │ timestamp           │ │
//! │ │ (encoded payload)  │ (i64, 8 bytes, BE)  │ │
//! │ └────────────────────┴─────────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Identifiers must not contain the `:` separator; the id is recovered from a
//! row key by splitting on the first separator.

mod key;
mod model;

pub use key::{
    decode_id, decode_timestamp, encode_key, encode_timestamp, validate_id, IdError, KEY_SEPARATOR,
    TIMESTAMP_WIDTH,
};
pub use model::Document;

/// Column holding the encoded payload
pub const DATA_COLUMN: &str = "data";

/// Column holding the big-endian timestamp
pub const TIMESTAMP_COLUMN: &str = "timestamp";
