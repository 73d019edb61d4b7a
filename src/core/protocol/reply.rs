// src/core/protocol/reply.rs

//! Defines a simplified value type for decoded request/reply exchanges.

use bytes::Bytes;

/// `Reply` is the decoded form of a synchronous server reply.
///
/// It's used as the return type of the transport's request path. This
/// abstraction is useful because the client layer shouldn't need to worry
/// about the full complexity of the wire protocol; it only needs to interpret
/// already-decoded values for the introspection queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    SimpleString(String),
    BulkString(Bytes),
    Integer(i64),
    Array(Vec<Reply>),
    Null,
    Error(String),
}

impl Reply {
    /// Interprets this reply as a bulk string, if it is one.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Reply::BulkString(b) => Some(b),
            _ => None,
        }
    }

    /// Interprets this reply as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            _ => None,
        }
    }
}
