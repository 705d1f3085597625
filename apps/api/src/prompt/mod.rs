//! Prompt Renderer — turns a directive-tree template plus a validated input
//! value into the literal instruction text sent to the model.
//!
//! Templates are built in code as a closed set of tagged directives and
//! interpreted by a single pure render function. User-supplied text is only
//! ever emitted as literal output and never re-parsed as template syntax, so
//! a résumé containing `{{#each}}` cannot inject directives.
//!
//! A rendered prompt is an immutable value object consumed exactly once by
//! the generation client. Documents do not appear in the prompt text: the
//! `Attachment` directive routes them to a separate channel because the model
//! consumes documents and text through different input slots.

use serde_json::Value;
use thiserror::Error;

/// One node of a prompt template.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Verbatim template text.
    Literal(String),
    /// Interpolates a scalar field (or a sequence of scalars, joined with ", ").
    Field(String),
    /// Includes `then` only when the named field is non-empty, `otherwise`
    /// when it is missing, null, an empty string, or an empty sequence.
    Conditional {
        field: String,
        then: Vec<Directive>,
        otherwise: Vec<Directive>,
    },
    /// Repeats `body` once per element of the named sequence field. Inside
    /// the body, the current element is addressable as `this` (scalar
    /// elements) or by its own field names (object elements).
    Iteration { field: String, body: Vec<Directive> },
    /// Attaches the named field's `data:<mime>;base64,<payload>` URI to the
    /// rendered prompt's attachment channel. Emits no text.
    Attachment(String),
}

impl Directive {
    pub fn lit(text: &str) -> Self {
        Directive::Literal(text.to_string())
    }

    pub fn field(name: &str) -> Self {
        Directive::Field(name.to_string())
    }

    pub fn when(field: &str, then: Vec<Directive>) -> Self {
        Directive::Conditional {
            field: field.to_string(),
            then,
            otherwise: vec![],
        }
    }

    pub fn when_else(field: &str, then: Vec<Directive>, otherwise: Vec<Directive>) -> Self {
        Directive::Conditional {
            field: field.to_string(),
            then,
            otherwise,
        }
    }

    pub fn each(field: &str, body: Vec<Directive>) -> Self {
        Directive::Iteration {
            field: field.to_string(),
            body,
        }
    }

    pub fn attach(field: &str) -> Self {
        Directive::Attachment(field.to_string())
    }
}

/// A named, immutable prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: &'static str,
    directives: Vec<Directive>,
}

/// A document routed to the model's document input slot, split out of its
/// self-describing data URI. The base64 payload is passed through opaquely,
/// never decoded here.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAttachment {
    pub media_type: String,
    pub data: String,
}

/// The literal instruction text (plus optional attachment) for one model
/// invocation.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub template_id: &'static str,
    pub text: String,
    pub attachment: Option<DocumentAttachment>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("template '{template}' references missing field '{field}'")]
    MissingField {
        template: &'static str,
        field: String,
    },

    #[error("field '{field}' is not interpolatable as text")]
    NotInterpolatable { field: String },

    #[error("iteration over '{field}' requires a sequence field")]
    NotASequence { field: String },

    #[error("field '{field}' is not a valid data URI: {reason}")]
    BadDataUri { field: String, reason: String },
}

impl PromptTemplate {
    pub fn new(id: &'static str, directives: Vec<Directive>) -> Self {
        Self { id, directives }
    }

    /// Renders this template against an input value. Pure: no side effects,
    /// same input always yields the same prompt.
    pub fn render(&self, input: &Value) -> Result<RenderedPrompt, RenderError> {
        let mut text = String::new();
        let mut attachment = None;
        let scope = vec![input];
        render_directives(self.id, &self.directives, &scope, &mut text, &mut attachment)?;
        Ok(RenderedPrompt {
            template_id: self.id,
            text,
            attachment,
        })
    }
}

/// Innermost-scope-first lookup. Iteration pushes the current element onto
/// the scope stack; `this` names the innermost element and only exists inside
/// an iteration body — the root input frame is never addressable as a whole.
fn lookup<'a>(scope: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "this" {
        return if scope.len() > 1 {
            scope.last().copied()
        } else {
            None
        };
    }
    for frame in scope.iter().rev() {
        if let Value::Object(map) = frame {
            if let Some(v) = map.get(name) {
                return Some(v);
            }
        }
    }
    None
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn render_directives(
    template: &'static str,
    directives: &[Directive],
    scope: &[&Value],
    out: &mut String,
    attachment: &mut Option<DocumentAttachment>,
) -> Result<(), RenderError> {
    for directive in directives {
        match directive {
            Directive::Literal(text) => out.push_str(text),

            Directive::Field(name) => {
                let value = lookup(scope, name).ok_or_else(|| RenderError::MissingField {
                    template,
                    field: name.clone(),
                })?;
                out.push_str(&interpolate(name, value)?);
            }

            Directive::Conditional {
                field,
                then,
                otherwise,
            } => {
                let branch = if is_empty(lookup(scope, field)) {
                    otherwise
                } else {
                    then
                };
                render_directives(template, branch, scope, out, attachment)?;
            }

            Directive::Iteration { field, body } => {
                let value = lookup(scope, field).ok_or_else(|| RenderError::MissingField {
                    template,
                    field: field.clone(),
                })?;
                let items = match value {
                    Value::Array(items) => items,
                    _ => {
                        return Err(RenderError::NotASequence {
                            field: field.clone(),
                        })
                    }
                };
                // Zero elements means zero repetitions, never an error.
                for item in items {
                    let mut inner: Vec<&Value> = scope.to_vec();
                    inner.push(item);
                    render_directives(template, body, &inner, out, attachment)?;
                }
            }

            Directive::Attachment(field) => {
                let value = lookup(scope, field).ok_or_else(|| RenderError::MissingField {
                    template,
                    field: field.clone(),
                })?;
                let uri = value.as_str().ok_or_else(|| RenderError::BadDataUri {
                    field: field.clone(),
                    reason: "expected a string data URI".to_string(),
                })?;
                *attachment = Some(split_data_uri(field, uri)?);
            }
        }
    }
    Ok(())
}

fn interpolate(name: &str, value: &Value) -> Result<String, RenderError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    Value::Number(n) => parts.push(n.to_string()),
                    Value::Bool(b) => parts.push(b.to_string()),
                    _ => {
                        return Err(RenderError::NotInterpolatable {
                            field: name.to_string(),
                        })
                    }
                }
            }
            Ok(parts.join(", "))
        }
        _ => Err(RenderError::NotInterpolatable {
            field: name.to_string(),
        }),
    }
}

/// Splits a `data:<mime-type>;base64,<payload>` URI into its media type and
/// base64 payload. The payload stays encoded — decoding is the provider's job.
fn split_data_uri(field: &str, uri: &str) -> Result<DocumentAttachment, RenderError> {
    let bad = |reason: &str| RenderError::BadDataUri {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let rest = uri.strip_prefix("data:").ok_or_else(|| bad("missing 'data:' prefix"))?;
    let (media_type, data) = rest
        .split_once(";base64,")
        .ok_or_else(|| bad("missing ';base64,' separator"))?;
    if media_type.is_empty() {
        return Err(bad("empty media type"));
    }
    if data.is_empty() {
        return Err(bad("empty payload"));
    }
    Ok(DocumentAttachment {
        media_type: media_type.to_string(),
        data: data.to_string(),
    })
}
