//! JSON Document Encoding
//!
//! Each direction carries exactly one JSON document. Message boundaries come
//! from stream closure (stdin EOF for the request, process exit for the
//! response), so no length prefix is needed.

use crate::messages::AdapterInput;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol documents
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request violates the protocol bounds
    #[error("invalid adapter input: {0}")]
    InvalidInput(String),

    /// The request could not be serialized
    #[error("failed to encode adapter input: {0}")]
    Encode(#[source] serde_json::Error),

    /// The adapter's stdout is not a JSON document
    #[error("adapter output is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Serialize a request into the bytes written to the adapter's stdin
pub fn encode_request(input: &AdapterInput) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(input).map_err(ProtocolError::Encode)
}

/// Parse the adapter's stdout into an untyped JSON document.
///
/// Shape checks are left to [`crate::OutputValidator`] so that schema
/// violations can be reported separately from unparsable output.
pub fn decode_response(stdout: &[u8]) -> Result<Value, ProtocolError> {
    serde_json::from_slice(stdout).map_err(ProtocolError::Malformed)
}
