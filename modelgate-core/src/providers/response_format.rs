//! Response-format negotiation
//!
//! Native-JSON providers get the schema embedded in the payload after it
//! passes validation. Every other provider is told about the schema through
//! two context entries, so the directive travels the normal context path.

use crate::protocol::ResponseFormat;
use crate::providers::adapter::JsonCapability;
use crate::providers::context::ContextStore;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Context label carrying the serialized schema
pub const SCHEMA_LABEL: &str = "response schema";

/// Context label carrying the formatting instruction
pub const INSTRUCTIONS_LABEL: &str = "response instructions";

/// Fixed instruction for directive-only providers
pub const JSON_DIRECTIVE: &str = "Respond only with a single JSON object that conforms to the response schema. \
Do not wrap the JSON in markdown code fences. Do not add any explanation or commentary.";

/// Outcome of negotiating a response format
#[derive(Debug, Clone, PartialEq)]
pub enum Negotiation {
    /// No format requested
    None,
    /// Valid format, embedded natively by the adapter
    Native,
    /// Schema and instruction added to the context store
    Directive,
    /// Native provider given an invalid format; no request may be attempted
    Rejected(Vec<String>),
}

/// Decide how a requested format reaches the provider
///
/// Directive entries replace any left by an earlier call so repeated calls
/// do not pile up copies.
pub fn negotiate(
    format: Option<&ResponseFormat>,
    capability: JsonCapability,
    contexts: &mut ContextStore,
) -> Negotiation {
    let Some(format) = format else {
        return Negotiation::None;
    };

    match capability {
        JsonCapability::Native => {
            let violations = format.violations();
            if violations.is_empty() {
                Negotiation::Native
            } else {
                warn!("Rejected response format '{}': {}", format.name, violations.join("; "));
                Negotiation::Rejected(violations)
            }
        }
        JsonCapability::JsonObjectFlag | JsonCapability::DirectiveOnly => {
            let schema = serde_json::to_string(&format.schema).unwrap_or_else(|_| format.schema.to_string());
            contexts
                .clear(Some(SCHEMA_LABEL))
                .clear(Some(INSTRUCTIONS_LABEL))
                .add(SCHEMA_LABEL, Value::String(schema))
                .add(INSTRUCTIONS_LABEL, Value::String(JSON_DIRECTIVE.to_string()));
            debug!("Response format '{}' downgraded to a prompt directive", format.name);
            Negotiation::Directive
        }
    }
}

/// Schema keywords whose values are themselves schemas
const SUBSCHEMA_KEYS: &[&str] = &["items", "additionalItems", "not", "if", "then", "else"];

/// Schema keywords holding arrays of schemas
const SUBSCHEMA_LIST_KEYS: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Schema keywords holding maps of name to schema
const SUBSCHEMA_MAP_KEYS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// Remove every `additionalProperties` keyword from a schema tree
///
/// Property names are never touched, so a property literally called
/// `additionalProperties` survives.
pub fn strip_additional_properties(schema: &Value) -> Value {
    let Value::Object(object) = schema else {
        return schema.clone();
    };

    let mut stripped = Map::new();
    for (key, value) in object {
        let key_str = key.as_str();
        if key_str == "additionalProperties" {
            continue;
        }

        let value = if SUBSCHEMA_KEYS.contains(&key_str) {
            strip_additional_properties(value)
        } else if SUBSCHEMA_LIST_KEYS.contains(&key_str) {
            match value {
                Value::Array(items) => Value::Array(items.iter().map(strip_additional_properties).collect()),
                other => strip_additional_properties(other),
            }
        } else if SUBSCHEMA_MAP_KEYS.contains(&key_str) {
            match value {
                Value::Object(entries) => Value::Object(
                    entries
                        .iter()
                        .map(|(name, sub)| (name.clone(), strip_additional_properties(sub)))
                        .collect(),
                ),
                other => other.clone(),
            }
        } else {
            value.clone()
        };
        stripped.insert(key.clone(), value);
    }

    Value::Object(stripped)
}
