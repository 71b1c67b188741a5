//! Adapter Output Validation
//!
//! Checks a decoded response against the output JSON Schema before anything
//! trusts it. Every violation is collected (not just the first) and reported as
//! `<json-pointer>: <message>` so adapter authors can fix them in one pass.
//!
//! The schema is compiled once at startup and the validator is shared by reference.

use crate::messages::{AdapterOutput, Lang};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Semantic version: `MAJOR.MINOR.PATCH[-prerelease][+build]`
const SEMVER_PATTERN: &str = r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$";

/// Every schema violation found in one adapter response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    /// Individual violations, formatted as `<pointer>: <message>`
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// The output schema failed to compile
#[derive(Debug, Clone, Error)]
#[error("adapter output schema is invalid: {0}")]
pub struct SchemaError(String);

/// JSON Schema (draft 2020-12) every adapter response must satisfy
pub fn output_schema() -> Value {
    let langs: Vec<&str> = Lang::ALL.iter().map(|l| l.as_str()).collect();
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "AdapterOutput",
        "type": "object",
        "required": ["library", "version", "lang", "timings"],
        "properties": {
            "library": { "type": "string", "pattern": "\\S" },
            "version": { "type": "string", "pattern": SEMVER_PATTERN },
            "lang": { "enum": langs },
            "runtime_version": { "type": ["string", "null"] },
            "rendered_output": { "type": ["string", "null"] },
            "timings": {
                "type": "object",
                "required": ["parse_ms", "render_ms"],
                "properties": {
                    "parse_ms": { "$ref": "#/$defs/samples" },
                    "render_ms": { "$ref": "#/$defs/samples" }
                }
            }
        },
        "$defs": {
            "samples": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "number", "minimum": 0 }
            }
        }
    })
}

/// Schema validator for adapter responses
pub struct OutputValidator {
    schema: jsonschema::Validator,
}

impl fmt::Debug for OutputValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputValidator").finish_non_exhaustive()
    }
}

impl OutputValidator {
    /// Compile the output schema
    pub fn new() -> Result<Self, SchemaError> {
        let schema = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&output_schema())
            .map_err(|e| SchemaError(e.to_string()))?;
        Ok(Self { schema })
    }

    /// Validate a decoded response and convert it into an [`AdapterOutput`]
    pub fn validate(&self, raw: &Value) -> Result<AdapterOutput, ValidationErrors> {
        let errors: Vec<String> = self
            .schema
            .iter_errors(raw)
            .map(|err| {
                let pointer = err.instance_path.to_string();
                let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                format!("{}: {}", pointer, err)
            })
            .collect();
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let output: AdapterOutput = serde_json::from_value(raw.clone())
            .map_err(|e| ValidationErrors(vec![format!("/: {}", e)]))?;

        if output.timings.iterations().is_none() {
            return Err(ValidationErrors(vec![format!(
                "/timings: parse_ms has {} entries but render_ms has {}",
                output.timings.parse_ms.len(),
                output.timings.render_ms.len()
            )]));
        }

        Ok(output)
    }
}
