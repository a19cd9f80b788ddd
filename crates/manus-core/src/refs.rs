//! Reference resolution between steps.
//!
//! Step inputs may name the output of an earlier step with the grammar
//! `step:<id>.output` or `step:<id>.output.<field>`. Resolution happens at
//! execution time against the map of already-recorded outputs; validation has
//! already guaranteed that references only point backwards, so a lookup miss
//! here means the run halted before the referenced step or the named field is
//! absent.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

/// A parsed `step:<id>.output[.<field>]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRef {
    /// ID of the referenced step
    pub step_id: String,

    /// Optional field within the referenced output
    pub field: Option<String>,
}

impl StepRef {
    /// Parse a string against the reference grammar.
    ///
    /// Returns `None` for anything that is not a reference; such values pass
    /// through resolution unchanged as literals.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix("step:")?;
        let (step_id, tail) = rest.split_once(".output")?;
        if step_id.is_empty() {
            return None;
        }

        let field = match tail {
            "" => None,
            _ => {
                let name = tail.strip_prefix('.')?;
                if name.is_empty() {
                    return None;
                }
                Some(name.to_string())
            }
        };

        Some(Self {
            step_id: step_id.to_string(),
            field,
        })
    }
}

/// Collect every reference appearing in a step's inputs, recursively.
pub fn collect_refs(inputs: &Map<String, Value>) -> Vec<StepRef> {
    let mut refs = Vec::new();
    for value in inputs.values() {
        collect_value_refs(value, &mut refs);
    }
    refs
}

fn collect_value_refs(value: &Value, refs: &mut Vec<StepRef>) {
    match value {
        Value::String(s) => {
            if let Some(r) = StepRef::parse(s) {
                refs.push(r);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect_value_refs(v, refs);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_value_refs(v, refs);
            }
        }
        _ => {}
    }
}

/// Resolve all references in `inputs` against recorded prior outputs.
///
/// Literal values pass through unchanged. Maps and arrays are walked
/// recursively. A reference to a step that has not executed, or to an absent
/// field, fails with [`AgentError::UnresolvedReference`].
pub fn resolve_inputs(
    inputs: &Map<String, Value>,
    prior_outputs: &BTreeMap<String, Value>,
) -> Result<Map<String, Value>> {
    let mut resolved = Map::new();
    for (key, value) in inputs {
        resolved.insert(key.clone(), resolve_value(value, prior_outputs)?);
    }
    Ok(resolved)
}

fn resolve_value(value: &Value, prior_outputs: &BTreeMap<String, Value>) -> Result<Value> {
    match value {
        Value::String(s) => match StepRef::parse(s) {
            Some(step_ref) => resolve_ref(s, &step_ref, prior_outputs),
            None => Ok(value.clone()),
        },
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, prior_outputs)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let out: Result<Vec<Value>> = items
                .iter()
                .map(|v| resolve_value(v, prior_outputs))
                .collect();
            Ok(Value::Array(out?))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_ref(
    raw: &str,
    step_ref: &StepRef,
    prior_outputs: &BTreeMap<String, Value>,
) -> Result<Value> {
    let output = prior_outputs.get(&step_ref.step_id).ok_or_else(|| {
        AgentError::UnresolvedReference {
            reference: raw.to_string(),
            reason: format!("step '{}' has not executed", step_ref.step_id),
        }
    })?;

    match &step_ref.field {
        Some(field) => match output.get(field) {
            Some(value) => Ok(value.clone()),
            None => Err(AgentError::UnresolvedReference {
                reference: raw.to_string(),
                reason: format!(
                    "output of step '{}' has no field '{field}'",
                    step_ref.step_id
                ),
            }),
        },
        // When a whole-output reference points at an object with a `content`
        // key, substitute the content value. Tools report their primary
        // payload there.
        None => match output.get("content") {
            Some(content) => Ok(content.clone()),
            None => Ok(output.clone()),
        },
    }
}
