//! Schema Registry — typed shape descriptions for every pipeline's input and
//! output.
//!
//! A `Schema` serves two masters: it validates candidate JSON values (both
//! caller input and untrusted model output), and its field descriptions are
//! rendered into the prompt as the generation hint that steers the model
//! toward the required shape. Schemas are immutable after definition and
//! shared by reference, so validation is a pure function.

use serde_json::Value;
use thiserror::Error;

/// The primitive kind of a schema field. Closed set — every pipeline output
/// must be expressible as a finite JSON value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Boolean,
    Number,
    Array(Box<FieldKind>),
    Object(Vec<FieldSpec>),
}

impl FieldKind {
    /// Human-readable label used in validation errors and generation hints.
    pub fn label(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Array(elem) => format!("array of {}", elem.label()),
            FieldKind::Object(_) => "object".to_string(),
        }
    }
}

/// One field of a schema: kind, human description (surfaced to the model as
/// a generation hint), and whether the field is required.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
        }
    }
}

/// A named structural type description.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    fields: Vec<FieldSpec>,
}

/// Validation failure for a single field. The first failing field is
/// reported; callers resubmit after correcting it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}': expected {expected}, received {received}")]
pub struct ValidationError {
    pub field: String,
    pub expected: String,
    pub received: String,
}

impl Schema {
    pub fn define(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { name, fields }
    }

    /// Validates a candidate value against this schema.
    ///
    /// Rules:
    /// - the candidate must be a JSON object;
    /// - required fields must be present and non-null;
    /// - required string fields must be non-empty after trimming;
    /// - required array fields must be present but may be empty;
    /// - every present field must conform to its declared kind, recursively
    ///   for arrays and nested objects.
    ///
    /// Unknown extra fields are tolerated — model output often carries more
    /// than the contract asks for, and extras are simply ignored downstream.
    pub fn validate(&self, candidate: &Value) -> Result<(), ValidationError> {
        let obj = match candidate {
            Value::Object(map) => map,
            other => {
                return Err(ValidationError {
                    field: self.name.to_string(),
                    expected: "object".to_string(),
                    received: kind_of(other).to_string(),
                })
            }
        };

        for spec in &self.fields {
            let value = obj.get(&spec.name);
            match value {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ValidationError {
                            field: spec.name.clone(),
                            expected: spec.kind.label(),
                            received: "missing".to_string(),
                        });
                    }
                }
                Some(v) => validate_kind(&spec.name, &spec.kind, v, spec.required)?,
            }
        }
        Ok(())
    }

    /// Renders this schema as the generation hint embedded in the prompt:
    /// one line per field with kind, optionality, and description, nested
    /// fields indented beneath their parent.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_fields(&self.fields, 0, &mut out);
        out
    }

}

fn validate_kind(
    path: &str,
    kind: &FieldKind,
    value: &Value,
    required: bool,
) -> Result<(), ValidationError> {
    let mismatch = |received: &Value| ValidationError {
        field: path.to_string(),
        expected: kind.label(),
        received: kind_of(received).to_string(),
    };

    match kind {
        FieldKind::String => match value {
            Value::String(s) => {
                if required && s.trim().is_empty() {
                    return Err(ValidationError {
                        field: path.to_string(),
                        expected: "non-empty string".to_string(),
                        received: "empty string".to_string(),
                    });
                }
                Ok(())
            }
            other => Err(mismatch(other)),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(()),
            other => Err(mismatch(other)),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Ok(()),
            other => Err(mismatch(other)),
        },
        FieldKind::Array(elem) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let elem_path = format!("{path}[{i}]");
                    // Array elements are validated for kind only; the
                    // non-empty rule applies to required fields, not elements.
                    validate_kind(&elem_path, elem, item, false)?;
                }
                Ok(())
            }
            other => Err(mismatch(other)),
        },
        FieldKind::Object(fields) => match value {
            Value::Object(map) => {
                for spec in fields {
                    let nested_path = format!("{path}.{}", spec.name);
                    match map.get(&spec.name) {
                        None | Some(Value::Null) => {
                            if spec.required {
                                return Err(ValidationError {
                                    field: nested_path,
                                    expected: spec.kind.label(),
                                    received: "missing".to_string(),
                                });
                            }
                        }
                        Some(v) => validate_kind(&nested_path, &spec.kind, v, spec.required)?,
                    }
                }
                Ok(())
            }
            other => Err(mismatch(other)),
        },
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe_fields(fields: &[FieldSpec], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for spec in fields {
        let optionality = if spec.required { "required" } else { "optional" };
        out.push_str(&format!(
            "{indent}- \"{}\" ({}, {}): {}\n",
            spec.name,
            spec.kind.label(),
            optionality,
            spec.description
        ));
        match &spec.kind {
            FieldKind::Object(nested) => describe_fields(nested, depth + 1, out),
            FieldKind::Array(elem) => {
                if let FieldKind::Object(nested) = elem.as_ref() {
                    out.push_str(&format!("{indent}  each element:\n"));
                    describe_fields(nested, depth + 2, out);
                }
            }
            _ => {}
        }
    }
}
