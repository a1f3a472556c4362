//! JSON codec for request and response bodies
//!
//! - [`read_json`] / [`decode_json`]: strict, size-limited decoding with a
//!   classified [`DecodeError`]
//! - [`write_json`]: pretty-printed [`Envelope`] responses with header merging
//! - [`StrictJson`]: axum extractor applying [`read_json`] with the configured
//!   body limit

mod decode;
mod encode;
mod extract;

pub use decode::{decode_json, read_json, DecodeError, DEFAULT_MAX_BODY_BYTES};
pub use encode::{to_pretty_bytes, write_json, EncodeError, Envelope};
pub use extract::StrictJson;
