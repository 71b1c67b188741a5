//! Protocol Message Types
//!
//! `AdapterInput` is built once per benchmark invocation and never mutated.
//! `AdapterOutput` only exists after the raw response passed the validator.

use crate::codec::ProtocolError;
use crate::{MAX_ITERATIONS, MAX_WARMUP};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Request sent to an adapter on stdin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterInput {
    template: String,
    data: Map<String, Value>,
    iterations: u32,
    warmup: u32,
}

impl AdapterInput {
    /// Build a request, enforcing the protocol bounds:
    /// non-empty template, `1..=10000` iterations, `0..=1000` warmup rounds.
    pub fn new(
        template: impl Into<String>,
        data: Map<String, Value>,
        iterations: u32,
        warmup: u32,
    ) -> Result<Self, ProtocolError> {
        let template = template.into();
        if template.is_empty() {
            return Err(ProtocolError::InvalidInput(
                "template must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_ITERATIONS).contains(&iterations) {
            return Err(ProtocolError::InvalidInput(format!(
                "iterations must be between 1 and {}, got {}",
                MAX_ITERATIONS, iterations
            )));
        }
        if warmup > MAX_WARMUP {
            return Err(ProtocolError::InvalidInput(format!(
                "warmup must be between 0 and {}, got {}",
                MAX_WARMUP, warmup
            )));
        }

        Ok(Self {
            template,
            data,
            iterations,
            warmup,
        })
    }

    /// Template source
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render context
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Number of measured iterations
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of unmeasured warmup iterations
    pub fn warmup(&self) -> u32 {
        self.warmup
    }
}

/// Implementation language of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// PHP runtime
    Php,
    /// Ruby runtime
    Ruby,
}

impl Lang {
    /// All languages accepted on the wire
    pub const ALL: [Lang; 2] = [Lang::Php, Lang::Ruby];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Php => "php",
            Lang::Ruby => "ruby",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-iteration phase timings reported by an adapter, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimings {
    /// Parse/compile time per iteration
    pub parse_ms: Vec<f64>,
    /// Render time per iteration
    pub render_ms: Vec<f64>,
}

impl RawTimings {
    /// Number of iterations covered, if both phases agree
    pub fn iterations(&self) -> Option<usize> {
        (self.parse_ms.len() == self.render_ms.len()).then_some(self.parse_ms.len())
    }
}

/// Validated adapter response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterOutput {
    /// Template library under test
    pub library: String,
    /// Library version (semver)
    pub version: String,
    /// Adapter language
    pub lang: Lang,
    /// Interpreter version string, as reported by the adapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    /// Raw per-iteration timings
    pub timings: RawTimings,
    /// Output of the last render, used for snapshot verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), json!("World"));
        map
    }

    #[test]
    fn test_input_serializes_all_fields() {
        let input = AdapterInput::new("{{ name }}", data(), 3, 1).unwrap();
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(
            value,
            json!({
                "template": "{{ name }}",
                "data": {"name": "World"},
                "iterations": 3,
                "warmup": 1
            })
        );
    }

    #[test]
    fn test_input_bounds() {
        assert!(AdapterInput::new("", data(), 1, 0).is_err());
        assert!(AdapterInput::new("x", data(), 0, 0).is_err());
        assert!(AdapterInput::new("x", data(), MAX_ITERATIONS + 1, 0).is_err());
        assert!(AdapterInput::new("x", data(), 1, MAX_WARMUP + 1).is_err());
        assert!(AdapterInput::new("x", data(), MAX_ITERATIONS, MAX_WARMUP).is_ok());
        assert!(AdapterInput::new("x", Map::new(), 1, 0).is_ok());
    }

    #[test]
    fn test_lang_wire_names() {
        assert_eq!(serde_json::to_string(&Lang::Php).unwrap(), "\"php\"");
        let lang: Lang = serde_json::from_str("\"ruby\"").unwrap();
        assert_eq!(lang, Lang::Ruby);
        assert_eq!(Lang::Ruby.to_string(), "ruby");
    }

    #[test]
    fn test_raw_timings_iterations() {
        let agree = RawTimings {
            parse_ms: vec![1.0, 2.0],
            render_ms: vec![3.0, 4.0],
        };
        let disagree = RawTimings {
            parse_ms: vec![1.0],
            render_ms: vec![3.0, 4.0],
        };
        assert_eq!(agree.iterations(), Some(2));
        assert_eq!(disagree.iterations(), None);
    }
}
