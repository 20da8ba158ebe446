//! DNS wire format: name codec, fixed header, query builder, response parser.
//!
//! Messages are standard RFC 1035 framing: a 12-byte header followed by the
//! question, answer, authority and additional sections. Name compression
//! uses 2-byte pointers whose top two bits are `11`.
pub mod error;
pub mod header;
pub mod message;
pub mod name;

pub use error::WireError;
pub use header::{Header, HEADER_LEN};
pub use message::{build_query, Question, Record, RecordData, Response};

/// The Internet query class.
pub const CLASS_IN: u16 = 1;
