#![warn(missing_docs)]
//! tplbench Adapter Protocol
//!
//! JSON protocol spoken between the orchestrator and template-engine adapters.
//! One request document is written to the adapter's stdin, which is then closed;
//! the adapter answers with one response document on stdout and exits 0.
//! Failures are signalled by a non-zero exit code and free-form text on stderr.

mod codec;
mod messages;
mod validator;

pub use codec::{ProtocolError, decode_response, encode_request};
pub use messages::{AdapterInput, AdapterOutput, Lang, RawTimings};
pub use validator::{OutputValidator, SchemaError, ValidationErrors, output_schema};

/// Upper bound for measured iterations per request
pub const MAX_ITERATIONS: u32 = 10_000;

/// Upper bound for unmeasured warmup iterations per request
pub const MAX_WARMUP: u32 = 1_000;
